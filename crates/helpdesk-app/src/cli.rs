//! CLI argument definitions for the helpdesk service.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Default port when neither flag, env nor config names one.
const DEFAULT_PORT: u16 = 8000;

/// Helpdesk - a retrieval-augmented customer support assistant.
#[derive(Parser, Debug)]
#[command(name = "helpdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Directory of support documents to index.
    #[arg(short = 'd', long = "docs-dir")]
    pub docs_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HELPDESK_CONFIG env var > ./helpdesk.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("HELPDESK_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("helpdesk.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > HELPDESK_PORT env var > config file value > 8000.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.resolve_port_with(config_port, |key| std::env::var(key).ok())
    }

    fn resolve_port_with<F>(&self, config_port: u16, lookup: F) -> u16
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(val) = lookup("HELPDESK_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// Documents directory override, if given.
    pub fn resolve_docs_dir(&self) -> Option<String> {
        self.docs_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Log level override, if given.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::try_parse_from([
            "helpdesk",
            "--config",
            "/etc/helpdesk.toml",
            "-p",
            "9000",
            "--docs-dir",
            "kb",
            "-l",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/helpdesk.toml")));
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.resolve_docs_dir(), Some("kb".to_string()));
        assert_eq!(args.resolve_log_level(), Some("debug".to_string()));
    }

    #[test]
    fn test_port_priority() {
        let flag = CliArgs::try_parse_from(["helpdesk", "--port", "9000"]).unwrap();
        let env = |k: &str| (k == "HELPDESK_PORT").then(|| "9100".to_string());
        assert_eq!(flag.resolve_port_with(8500, env), 9000);

        let bare = CliArgs::try_parse_from(["helpdesk"]).unwrap();
        assert_eq!(bare.resolve_port_with(8500, env), 9100);
        assert_eq!(bare.resolve_port_with(8500, no_env), 8500);
        assert_eq!(bare.resolve_port_with(0, no_env), DEFAULT_PORT);

        let junk = |_: &str| Some("not-a-port".to_string());
        assert_eq!(bare.resolve_port_with(8500, junk), 8500);
    }

    #[test]
    fn test_config_path_priority() {
        let flag = CliArgs::try_parse_from(["helpdesk", "-c", "a.toml"]).unwrap();
        let env = |k: &str| (k == "HELPDESK_CONFIG").then(|| "b.toml".to_string());
        assert_eq!(flag.resolve_config_path_with(env), PathBuf::from("a.toml"));

        let bare = CliArgs::try_parse_from(["helpdesk"]).unwrap();
        assert_eq!(bare.resolve_config_path_with(env), PathBuf::from("b.toml"));
        assert_eq!(
            bare.resolve_config_path_with(no_env),
            PathBuf::from("helpdesk.toml")
        );
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{HelpdeskError, Result};

/// Top-level configuration for the helpdesk service.
///
/// Loaded from `helpdesk.toml` by default, then overlaid with environment
/// variables (and a `.env` file, if present). Each section corresponds to
/// one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl HelpdeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HelpdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    ///
    /// The load error is returned next to the defaults instead of being
    /// logged, since this usually runs before tracing is installed.
    pub fn load_or_default(path: &Path) -> (Self, Option<HelpdeskError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HelpdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first; variables
    /// already set in the environment win over it.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = provider.to_lowercase();
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.openai_api_key = key;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.openai_model = model;
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            self.llm.groq_api_key = key;
        }
        if let Some(model) = lookup("GROQ_MODEL") {
            self.llm.groq_model = model;
        }
        if let Some(dir) = lookup("DOCS_DIR") {
            self.retrieval.docs_dir = dir;
        }
        if let Some(path) = lookup("CHAT_LOG") {
            self.storage.chat_log = path;
        }
        if let Some(path) = lookup("TICKET_LOG") {
            self.storage.ticket_log = path;
        }
        if let Some(raw) = lookup("TOP_K") {
            match raw.parse::<usize>() {
                Ok(k) if k > 0 => self.retrieval.top_k = k,
                _ => warn!(value = %raw, "Ignoring invalid TOP_K"),
            }
        }
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP API port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 8000,
        }
    }
}

/// Document corpus and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory holding the support documents to index.
    pub docs_dir: String,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Maximum characters per indexed chunk.
    pub chunk_max_chars: usize,
    /// Hits scoring at or below this value are discarded.
    pub min_score: f64,
    /// Dimension of the hashing embedding.
    pub embedding_dim: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            docs_dir: "data/documents".to_string(),
            top_k: 4,
            chunk_max_chars: 800,
            min_score: 0.0,
            embedding_dim: 384,
        }
    }
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "stub", "openai" or "groq".
    pub provider: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Request timeout; a timeout counts as a provider failure.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "stub".to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com".to_string(),
            groq_api_key: String::new(),
            groq_model: "llama-3.3-70b-versatile".to_string(),
            groq_base_url: "https://api.groq.com/openai".to_string(),
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 20,
        }
    }
}

/// Session memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum turns retained per session.
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_turns: 6 }
    }
}

/// Append-only log locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Audit (chat) log, one JSON record per line.
    pub chat_log: String,
    /// Ticket ledger, one JSON record per line.
    pub ticket_log: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chat_log: "data/logs/chats.jsonl".to_string(),
            ticket_log: "data/logs/tickets.jsonl".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = HelpdeskConfig::default();
        assert_eq!(config.general.port, 8000);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.chunk_max_chars, 800);
        assert_eq!(config.memory.max_turns, 6);
        assert_eq!(config.llm.provider, "stub");
        assert_eq!(config.llm.openai_model, "gpt-4o-mini");
        assert_eq!(config.storage.ticket_log, "data/logs/tickets.jsonl");
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
port = 9100

[retrieval]
docs_dir = "/srv/docs"
top_k = 2

[llm]
provider = "groq"
groq_api_key = "gsk-test"

[memory]
max_turns = 10
"#;
        let file = create_temp_config(content);
        let config = HelpdeskConfig::load(file.path()).unwrap();
        assert_eq!(config.general.port, 9100);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.retrieval.docs_dir, "/srv/docs");
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.chunk_max_chars, 800);
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.groq_api_key, "gsk-test");
        assert_eq!(config.memory.max_turns, 10);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let file = create_temp_config("[general\nport = ");
        let err = HelpdeskConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, HelpdeskError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let (config, err) =
            HelpdeskConfig::load_or_default(Path::new("/nonexistent/helpdesk.toml"));
        assert_eq!(config.retrieval.top_k, 4);
        assert!(matches!(err, Some(HelpdeskError::Io(_))));
    }

    #[test]
    fn test_load_or_default_reports_parse_error() {
        let file = create_temp_config("[retrieval]\ntop_k = \"many\"");
        let (config, err) = HelpdeskConfig::load_or_default(file.path());
        assert_eq!(config.retrieval.top_k, 4);
        assert!(matches!(err, Some(HelpdeskError::Config(_))));
    }

    #[test]
    fn test_load_or_default_valid_file_has_no_error() {
        let file = create_temp_config("[retrieval]\ntop_k = 7");
        let (config, err) = HelpdeskConfig::load_or_default(file.path());
        assert_eq!(config.retrieval.top_k, 7);
        assert!(err.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = HelpdeskConfig::default();
        config.memory.max_turns = 12;
        config.save(&path).unwrap();

        let loaded = HelpdeskConfig::load(&path).unwrap();
        assert_eq!(loaded.memory.max_turns, 12);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("LLM_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "sk-test"),
            ("TOP_K", "7"),
            ("TICKET_LOG", "/tmp/tickets.jsonl"),
        ]
        .into_iter()
        .collect();

        let mut config = HelpdeskConfig::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai_api_key, "sk-test");
        assert_eq!(config.retrieval.top_k, 7);
        assert_eq!(config.storage.ticket_log, "/tmp/tickets.jsonl");
        assert_eq!(config.storage.chat_log, "data/logs/chats.jsonl");
    }

    #[test]
    fn test_invalid_top_k_is_ignored() {
        let mut config = HelpdeskConfig::default();
        config.apply_overrides_from(|k| (k == "TOP_K").then(|| "zero".to_string()));
        assert_eq!(config.retrieval.top_k, 4);

        config.apply_overrides_from(|k| (k == "TOP_K").then(|| "0".to_string()));
        assert_eq!(config.retrieval.top_k, 4);
    }
}

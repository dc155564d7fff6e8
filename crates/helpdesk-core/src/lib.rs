//! Shared domain types, configuration and errors for the helpdesk service.

pub mod config;
pub mod error;
pub mod types;

pub use config::HelpdeskConfig;
pub use error::{HelpdeskError, Result};
pub use types::*;

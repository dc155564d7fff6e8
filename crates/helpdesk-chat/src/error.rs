//! Error types for the chat engine.

use helpdesk_core::error::HelpdeskError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("ticket creation failed: {0}")]
    Ticket(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<HelpdeskError> for ChatError {
    fn from(err: HelpdeskError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}

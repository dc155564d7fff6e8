//! Prompt assembly for grounded answers.

use helpdesk_core::types::{ContextChunk, Turn};

/// Instructions sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful customer support assistant. \
Answer only using the provided context. If the context is insufficient, say you don't \
know and ask if the user wants to create a support ticket.";

/// Build the full prompt from instructions, context, prior turns and the new message.
///
/// Context chunks render as `[doc #chunk] content` separated by blank lines;
/// history renders as `role: text` one per line. Empty sections print `None`.
pub fn format_prompt(history: &[Turn], chunks: &[ContextChunk], message: &str) -> String {
    let context = if chunks.is_empty() {
        "None".to_string()
    } else {
        chunks
            .iter()
            .map(|c| format!("[{} #{}] {}", c.source_document, c.chunk_index, c.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let conversation = if history.is_empty() {
        "None".to_string()
    } else {
        history
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{}\n\nContext:\n{}\n\nConversation:\n{}\n\nUser: {}\nAssistant:",
        SYSTEM_PROMPT, context, conversation, message
    )
}

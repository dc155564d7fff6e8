//! Helpdesk chat crate - intent classification, session memory, prompt
//! assembly, response generation and the support orchestrator.

pub mod error;
pub mod generator;
pub mod intent;
pub mod memory;
pub mod orchestrator;
pub mod prompt;

pub use error::ChatError;
pub use generator::{
    fallback_answer, GenerationError, GenerationSource, Generated, OpenAiCompatibleProvider,
    ResponseGenerator, TextGenerator,
};
pub use intent::{extract_ticket_reference, has_escalation_intent, is_affirmative};
pub use memory::{SessionGuard, SessionMemory};
pub use orchestrator::{
    validate_message, OrchestratorConfig, SupportOrchestrator, INSUFFICIENT_CONTEXT_MESSAGE,
    MAX_MESSAGE_LENGTH,
};
pub use prompt::{format_prompt, SYSTEM_PROMPT};

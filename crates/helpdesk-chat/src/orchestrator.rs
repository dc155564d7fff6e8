//! Support orchestrator: routes each message through lookup, retrieval,
//! generation and ticketing, then records the turn.
//!
//! Every message takes exactly one route:
//! - `ticket_lookup` when it names an 8-hex ticket id (retrieval skipped)
//! - `ticket` when it shows escalation intent plus an explicit "yes"
//! - `escalate` when retrieval finds nothing
//! - `rag` otherwise

use std::sync::Arc;

use tracing::{debug, error, info};

use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::types::{new_session_id, now, AuditRecord, ChatReply, ContextChunk, Role, Route};
use helpdesk_storage::{AuditSink, TicketLedger};
use helpdesk_vector::Retriever;

use crate::error::ChatError;
use crate::generator::ResponseGenerator;
use crate::intent::{extract_ticket_reference, has_escalation_intent, is_affirmative};
use crate::memory::{SessionGuard, SessionMemory};
use crate::prompt::format_prompt;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Reply when retrieval finds nothing relevant.
pub const INSUFFICIENT_CONTEXT_MESSAGE: &str =
    "I don't have enough context to answer that. Would you like me to create a support ticket?";

/// Tunables for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Chunks requested from the retriever per message.
    pub top_k: usize,
    /// Turns kept per session after each message.
    pub max_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_turns: 6,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &HelpdeskConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_turns: config.memory.max_turns,
        }
    }
}

/// Decision core of the assistant.
pub struct SupportOrchestrator {
    retriever: Arc<dyn Retriever>,
    generator: ResponseGenerator,
    memory: SessionMemory,
    ledger: Arc<TicketLedger>,
    audit: Arc<dyn AuditSink>,
    config: OrchestratorConfig,
}

impl SupportOrchestrator {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: ResponseGenerator,
        ledger: Arc<TicketLedger>,
        audit: Arc<dyn AuditSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            memory: SessionMemory::new(),
            ledger,
            audit,
            config,
        }
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn ledger(&self) -> &TicketLedger {
        &self.ledger
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Handle a message, starting a new session when `session_id` is `None`.
    pub async fn handle(
        &self,
        session_id: Option<String>,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(new_session_id);
        self.handle_message(&session_id, message).await
    }

    /// Handle one inbound message for `session_id`.
    ///
    /// The session stays locked for the whole turn, so concurrent messages
    /// on one session are processed one at a time in arrival order. The only
    /// hard failure after validation is a ticket that could not be recorded.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, ChatError> {
        validate_message(message)?;

        let mut session = self.memory.lock(session_id).await?;

        if let Some(ticket_ref) = extract_ticket_reference(message) {
            let (response, ticket_id) = self.lookup_ticket(&ticket_ref);
            return Ok(self
                .finalize(
                    session_id,
                    &mut session,
                    message,
                    Route::TicketLookup,
                    response,
                    &[],
                    ticket_id,
                )
                .await);
        }

        let chunks = self.retriever.retrieve(message, self.config.top_k).await;
        debug!(session_id = %session_id, chunks = chunks.len(), "Retrieved context");

        let (route, response, ticket_id) =
            if has_escalation_intent(message) && is_affirmative(message) {
                let ticket_id = self.create_ticket(session_id, message).await?;
                (
                    Route::Ticket,
                    format!("Ticket created. Your ticket id is {}.", ticket_id),
                    Some(ticket_id),
                )
            } else if chunks.is_empty() {
                (Route::Escalate, INSUFFICIENT_CONTEXT_MESSAGE.to_string(), None)
            } else {
                let prompt = format_prompt(&session.history(), &chunks, message);
                let generated = self.generator.generate(&prompt, &chunks).await;
                (Route::Rag, generated.text, None)
            };

        Ok(self
            .finalize(
                session_id,
                &mut session,
                message,
                route,
                response,
                &chunks,
                ticket_id,
            )
            .await)
    }

    /// Append a ticket to the ledger off the async worker threads.
    async fn create_ticket(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let ledger = Arc::clone(&self.ledger);
        let session_id = session_id.to_string();
        let message = message.to_string();
        tokio::task::spawn_blocking(move || ledger.create(&session_id, &message))
            .await
            .map_err(|e| ChatError::Ticket(format!("Ticket task failed: {}", e)))?
            .map_err(|e| ChatError::Ticket(e.to_string()))
    }

    fn lookup_ticket(&self, ticket_id: &str) -> (String, Option<String>) {
        match self.ledger.find(ticket_id) {
            Some(record) => (
                format!(
                    "Ticket {} was created on {} with the message: \"{}\"",
                    record.ticket_id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    record.message
                ),
                Some(record.ticket_id),
            ),
            None => (
                format!(
                    "I couldn't find a ticket with id {}. Would you like me to create a support ticket?",
                    ticket_id
                ),
                None,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn finalize(
        &self,
        session_id: &str,
        session: &mut SessionGuard,
        message: &str,
        route: Route,
        response: String,
        chunks: &[ContextChunk],
        ticket_id: Option<String>,
    ) -> ChatReply {
        session.append(Role::User, message);
        session.append(Role::Assistant, &response);
        session.trim(self.config.max_turns);

        let record = AuditRecord {
            timestamp: now(),
            session_id: session_id.to_string(),
            route,
            user_message: message.to_string(),
            response: response.clone(),
            sources: chunks.iter().map(ContextChunk::scored_source).collect(),
        };
        let audit = Arc::clone(&self.audit);
        match tokio::task::spawn_blocking(move || audit.record(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(session_id = %session_id, error = %e, "Failed to write audit record")
            }
            Err(e) => error!(session_id = %session_id, error = %e, "Audit task failed"),
        }

        info!(session_id = %session_id, route = %route, chunks = chunks.len(), "Message handled");

        ChatReply {
            session_id: session_id.to_string(),
            response,
            route,
            sources: chunks.iter().map(ContextChunk::source_ref).collect(),
            ticket_id,
        }
    }
}

/// Reject blank and over-long messages.
pub fn validate_message(message: &str) -> Result<(), ChatError> {
    if message.trim().is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
    }
    Ok(())
}

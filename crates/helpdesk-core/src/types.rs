use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UTC timestamp used throughout persisted records.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Enums
// =============================================================================

/// Speaker of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Classification outcome of one handled message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Answered from retrieved context.
    Rag,
    /// Not enough context; the user was offered a ticket.
    Escalate,
    /// A ticket was created this turn.
    Ticket,
    /// The message referenced an existing ticket id.
    TicketLookup,
}

impl Route {
    /// Wire name of the route, as it appears in audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Rag => "rag",
            Route::Escalate => "escalate",
            Route::Ticket => "ticket",
            Route::TicketLookup => "ticket_lookup",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Conversation
// =============================================================================

/// One immutable entry of a session's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

// =============================================================================
// Retrieval
// =============================================================================

/// A scored fragment of source-document text returned by retrieval.
///
/// Scoped to a single request; never persisted as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub source_document: String,
    pub chunk_index: usize,
    pub content: String,
    pub relevance_score: f64,
}

impl ContextChunk {
    /// Provenance without the score, for caller-facing replies.
    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            source_document: self.source_document.clone(),
            chunk_index: self.chunk_index,
        }
    }

    /// Provenance with the score, for audit records.
    pub fn scored_source(&self) -> ScoredSource {
        ScoredSource {
            source_document: self.source_document.clone(),
            chunk_index: self.chunk_index,
            relevance_score: self.relevance_score,
        }
    }
}

/// Document + chunk index of a context chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(rename = "doc")]
    pub source_document: String,
    #[serde(rename = "chunk_id")]
    pub chunk_index: usize,
}

/// Document, chunk index and relevance score of a context chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredSource {
    #[serde(rename = "doc")]
    pub source_document: String,
    #[serde(rename = "chunk_id")]
    pub chunk_index: usize,
    #[serde(rename = "score")]
    pub relevance_score: f64,
}

// =============================================================================
// Persisted records
// =============================================================================

/// A support ticket. Appended once to the ledger and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// 8-character lowercase hex identifier.
    pub ticket_id: String,
    pub session_id: String,
    pub message: String,
    #[serde(alias = "timestamp")]
    pub created_at: Timestamp,
}

/// One chat-log entry per handled message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: Timestamp,
    pub session_id: String,
    pub route: Route,
    pub user_message: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<ScoredSource>,
}

// =============================================================================
// Replies
// =============================================================================

/// Structured result of handling one inbound message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
    pub route: Route,
    pub sources: Vec<SourceRef>,
    /// Set only when a ticket was created, or an existing one was found.
    pub ticket_id: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a fresh opaque session identifier (12 lowercase hex characters).
pub fn new_session_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

/// Current UTC time.
pub fn now() -> Timestamp {
    Utc::now()
}

//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use helpdesk_core::types::{ChatReply, TicketRecord};
use helpdesk_storage::AuditSummary;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; a new one is started when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub indexed_chunks: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub summary: AuditSummary,
    pub active_sessions: usize,
    pub llm_provider: String,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - service liveness and index size.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        indexed_chunks: state.orchestrator.retriever().indexed_chunks() as u64,
    })
}

/// POST /chat - handle one user message.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(req) = payload?;
    let reply = state.orchestrator.handle(req.session_id, &req.message).await?;
    Ok(Json(reply))
}

/// GET /tickets - every ticket in the ledger, oldest first.
pub async fn list_tickets(State(state): State<AppState>) -> Json<TicketListResponse> {
    let tickets = state.ledger.list();
    let total = tickets.len();
    Json(TicketListResponse { tickets, total })
}

/// GET /tickets/{id} - one ticket by id (case-insensitive).
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketRecord>, ApiError> {
    let id = id.to_ascii_lowercase();
    state
        .ledger
        .find(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ticket {} not found", id)))
}

/// DELETE /sessions/{id} - forget a session's conversation history.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.orchestrator.memory().clear(&id)? {
        debug!(session_id = %id, "Session cleared");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {} not found", id)))
    }
}

/// GET /stats - audit log summary.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        summary: state.audit.summarize(),
        active_sessions: state.orchestrator.memory().session_count(),
        llm_provider: state
            .orchestrator
            .generator()
            .provider_name()
            .unwrap_or("offline")
            .to_string(),
    })
}

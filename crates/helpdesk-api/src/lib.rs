//! Helpdesk API crate - axum HTTP server and route handlers.
//!
//! Exposes the chat endpoint plus ticket, session and audit views.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;

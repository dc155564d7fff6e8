//! Application state shared across all route handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use helpdesk_chat::{OrchestratorConfig, ResponseGenerator, SupportOrchestrator};
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_storage::{AuditLog, TicketLedger};
use helpdesk_vector::Retriever;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HelpdeskConfig>,
    pub orchestrator: Arc<SupportOrchestrator>,
    pub ledger: Arc<TicketLedger>,
    pub audit: Arc<AuditLog>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the ledger, audit log and response generator named by `config`
    /// around an already-built retriever.
    pub fn new(config: HelpdeskConfig, retriever: Arc<dyn Retriever>) -> Self {
        let generator = ResponseGenerator::from_config(&config.llm);
        Self::with_generator(config, retriever, generator)
    }

    pub fn with_generator(
        config: HelpdeskConfig,
        retriever: Arc<dyn Retriever>,
        generator: ResponseGenerator,
    ) -> Self {
        let ledger = Arc::new(TicketLedger::new(PathBuf::from(&config.storage.ticket_log)));
        let audit = Arc::new(AuditLog::new(PathBuf::from(&config.storage.chat_log)));
        let orchestrator = SupportOrchestrator::new(
            retriever,
            generator,
            Arc::clone(&ledger),
            audit.clone(),
            OrchestratorConfig::from_config(&config),
        );

        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            ledger,
            audit,
            start_time: Instant::now(),
        }
    }
}

//! Helpdesk storage crate - append-only JSONL persistence.
//!
//! Provides the ticket ledger and the audit (chat) log, both stored as
//! newline-delimited JSON files that tolerate malformed lines on read.

pub mod audit;
pub mod jsonl;
pub mod ledger;

pub use audit::{AuditLog, AuditSink, AuditSummary};
pub use jsonl::JsonlFile;
pub use ledger::{generate_ticket_id, TicketLedger, TICKET_ID_LEN};

//! Ticket ledger: append-only store of support tickets.
//!
//! Lookups are a linear scan of the ledger file. Ticket ids are 32 random
//! bits rendered as 8 lowercase hex characters; they are not checked for
//! uniqueness against existing records.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{info, warn};

use helpdesk_core::error::Result;
use helpdesk_core::types::{now, TicketRecord};

use crate::jsonl::JsonlFile;

/// Length of a ticket id in characters.
pub const TICKET_ID_LEN: usize = 8;

/// Generate a random 8-character lowercase hex ticket id.
pub fn generate_ticket_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; TICKET_ID_LEN / 2] = rng.random();
    hex::encode(bytes)
}

/// Durable, append-only ticket store.
#[derive(Debug)]
pub struct TicketLedger {
    file: JsonlFile,
}

impl TicketLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonlFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Record a new ticket and return its id.
    ///
    /// The record is synced to disk before this returns; any write failure
    /// is returned to the caller and no id is handed out.
    pub fn create(&self, session_id: &str, message: &str) -> Result<String> {
        let record = TicketRecord {
            ticket_id: generate_ticket_id(),
            session_id: session_id.to_string(),
            message: message.to_string(),
            created_at: now(),
        };
        self.file.append(&record)?;
        info!(ticket_id = %record.ticket_id, session_id = %session_id, "Ticket created");
        Ok(record.ticket_id)
    }

    /// The first record with `ticket_id`, if any.
    ///
    /// A missing or unreadable ledger yields `None`; malformed lines are skipped.
    pub fn find(&self, ticket_id: &str) -> Option<TicketRecord> {
        match self
            .file
            .find(|record: &TicketRecord| record.ticket_id == ticket_id)
        {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Ticket ledger unreadable");
                None
            }
        }
    }

    /// All readable tickets in creation order.
    pub fn list(&self) -> Vec<TicketRecord> {
        match self.file.read_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Ticket ledger unreadable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> (tempfile::TempDir, TicketLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TicketLedger::new(dir.path().join("logs").join("tickets.jsonl"));
        (dir, ledger)
    }

    #[test]
    fn test_generate_ticket_id_shape() {
        for _ in 0..100 {
            let id = generate_ticket_id();
            assert_eq!(id.len(), TICKET_ID_LEN);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_create_then_find_round_trip() {
        let (_dir, ledger) = ledger();
        let id = ledger.create("sess-1", "I want a refund").unwrap();

        let record = ledger.find(&id).unwrap();
        assert_eq!(record.ticket_id, id);
        assert_eq!(record.session_id, "sess-1");
        assert_eq!(record.message, "I want a refund");
    }

    #[test]
    fn test_find_on_empty_ledger() {
        let (_dir, ledger) = ledger();
        assert!(ledger.find("deadbeef").is_none());
        assert!(ledger.list().is_empty());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let (dir, ledger) = ledger();
        std::fs::create_dir_all(dir.path().join("logs")).unwrap();
        std::fs::write(
            ledger.path(),
            "{broken json\n{\"ticket_id\":\"a1b2c3d4\",\"session_id\":\"s\",\"message\":\"m\",\"created_at\":\"2024-01-01T00:00:00Z\"}\n",
        )
        .unwrap();

        assert!(ledger.find("deadbeef").is_none());
        let record = ledger.find("a1b2c3d4").unwrap();
        assert_eq!(record.message, "m");
    }

    #[test]
    fn test_list_in_creation_order() {
        let (_dir, ledger) = ledger();
        let a = ledger.create("s1", "first").unwrap();
        let b = ledger.create("s2", "second").unwrap();
        let ids: Vec<String> = ledger.list().into_iter().map(|t| t.ticket_id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_create_fails_when_path_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the ledger file should be makes the open fail.
        let path = dir.path().join("tickets.jsonl");
        std::fs::create_dir(&path).unwrap();
        let ledger = TicketLedger::new(&path);
        assert!(ledger.create("s", "refund").is_err());
    }
}

//! Audit log: one chat-log record per handled message, plus a summary view.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use helpdesk_core::error::Result;
use helpdesk_core::types::{AuditRecord, Route, Timestamp};

use crate::jsonl::JsonlFile;

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditRecord) -> Result<()>;
}

/// Aggregate view over the audit log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_messages: usize,
    pub sessions: usize,
    pub tickets_created: usize,
    pub by_route: BTreeMap<String, usize>,
    pub last_message_at: Option<Timestamp>,
}

impl AuditSummary {
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut by_route = BTreeMap::new();
        let mut sessions = HashSet::new();
        let mut last_message_at: Option<Timestamp> = None;

        for r in records {
            *by_route.entry(r.route.as_str().to_string()).or_insert(0) += 1;
            sessions.insert(r.session_id.as_str());
            last_message_at = Some(match last_message_at {
                Some(prev) if prev > r.timestamp => prev,
                _ => r.timestamp,
            });
        }

        Self {
            total_messages: records.len(),
            sessions: sessions.len(),
            tickets_created: by_route.get(Route::Ticket.as_str()).copied().unwrap_or(0),
            by_route,
            last_message_at,
        }
    }
}

/// JSONL-backed audit log.
#[derive(Debug)]
pub struct AuditLog {
    file: JsonlFile,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonlFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Every readable record; malformed lines are skipped.
    pub fn read_all(&self) -> Vec<AuditRecord> {
        match self.file.read_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Audit log unreadable");
                Vec::new()
            }
        }
    }

    pub fn summarize(&self) -> AuditSummary {
        AuditSummary::from_records(&self.read_all())
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: &AuditRecord) -> Result<()> {
        self.file.append(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use helpdesk_core::types::ScoredSource;

    fn record(session: &str, route: Route, offset_secs: i64) -> AuditRecord {
        AuditRecord {
            timestamp: Utc::now() + Duration::seconds(offset_secs),
            session_id: session.to_string(),
            route,
            user_message: "hello".to_string(),
            response: "hi".to_string(),
            sources: vec![ScoredSource {
                source_document: "faq.md".to_string(),
                chunk_index: 0,
                relevance_score: 0.5,
            }],
        }
    }

    #[test]
    fn test_record_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("chats.jsonl"));
        let entry = record("s1", Route::Rag, 0);
        log.record(&entry).unwrap();

        let all = log.read_all();
        assert_eq!(all, vec![entry]);
    }

    #[test]
    fn test_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("chats.jsonl"));
        log.record(&record("s1", Route::TicketLookup, 0)).unwrap();

        let line = std::fs::read_to_string(log.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(json["route"], "ticket_lookup");
        assert_eq!(json["user_message"], "hello");
        assert_eq!(json["sources"][0]["doc"], "faq.md");
        assert_eq!(json["sources"][0]["chunk_id"], 0);
        assert!(json["sources"][0]["score"].is_number());
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("chats.jsonl"));
        log.record(&record("s1", Route::Rag, 0)).unwrap();
        log.record(&record("s1", Route::Ticket, 10)).unwrap();
        log.record(&record("s2", Route::Escalate, 5)).unwrap();
        log.record(&record("s3", Route::Rag, 1)).unwrap();

        let summary = log.summarize();
        assert_eq!(summary.total_messages, 4);
        assert_eq!(summary.sessions, 3);
        assert_eq!(summary.tickets_created, 1);
        assert_eq!(summary.by_route.get("rag"), Some(&2));
        assert_eq!(summary.by_route.get("escalate"), Some(&1));
        assert!(summary.by_route.get("ticket_lookup").is_none());

        let all = log.read_all();
        assert_eq!(summary.last_message_at, Some(all[1].timestamp));
    }

    #[test]
    fn test_summary_of_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("none.jsonl"));
        assert_eq!(log.summarize(), AuditSummary::default());
    }
}

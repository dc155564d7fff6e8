//! Session memory: per-session turn history with bounded retention.
//!
//! The session map is only locked long enough to find or create a
//! session's slot. Each slot has its own async mutex, so work on different
//! sessions never contends, while work on one session is serialized in the
//! order it asked for the lock (tokio's mutex is FIFO-fair).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use helpdesk_core::types::{Role, Turn};

use crate::error::ChatError;

type Slot = Arc<AsyncMutex<VecDeque<Turn>>>;

/// Process-wide keyed store of session histories.
#[derive(Debug, Default)]
pub struct SessionMemory {
    sessions: Mutex<HashMap<String, Slot>>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to one session's history, creating it if absent.
    ///
    /// Hold the guard for the whole of a turn so concurrent requests on the
    /// same session cannot interleave.
    pub async fn lock(&self, session_id: &str) -> Result<SessionGuard, ChatError> {
        let slot = self.slot(session_id)?;
        Ok(SessionGuard {
            turns: slot.lock_owned().await,
        })
    }

    /// Copy of the session's history, oldest first. Unknown sessions are empty.
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        match self.existing(session_id)? {
            Some(slot) => Ok(slot.lock().await.iter().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Append one turn, creating the session if needed.
    pub async fn append_turn(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
    ) -> Result<(), ChatError> {
        self.lock(session_id).await?.append(role, text);
        Ok(())
    }

    /// Keep only the most recent `max_turns` turns.
    pub async fn trim(&self, session_id: &str, max_turns: usize) -> Result<(), ChatError> {
        if let Some(slot) = self.existing(session_id)? {
            trim_turns(&mut *slot.lock().await, max_turns);
        }
        Ok(())
    }

    /// Drop a session's history. Returns whether the session existed.
    pub fn clear(&self, session_id: &str) -> Result<bool, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        Ok(sessions.remove(session_id).is_some())
    }

    /// Number of sessions with a history.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn slot(&self, session_id: &str) -> Result<Slot, ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        Ok(Arc::clone(sessions.entry(session_id.to_string()).or_default()))
    }

    fn existing(&self, session_id: &str) -> Result<Option<Slot>, ChatError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        Ok(sessions.get(session_id).cloned())
    }
}

/// Held lock on one session's history.
pub struct SessionGuard {
    turns: OwnedMutexGuard<VecDeque<Turn>>,
}

impl SessionGuard {
    /// Copy of the history, oldest first.
    pub fn history(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn append(&mut self, role: Role, text: &str) {
        self.turns.push_back(Turn::new(role, text));
    }

    pub fn trim(&mut self, max_turns: usize) {
        trim_turns(&mut self.turns, max_turns);
    }
}

fn trim_turns(turns: &mut VecDeque<Turn>, max_turns: usize) {
    while turns.len() > max_turns {
        turns.pop_front();
    }
}

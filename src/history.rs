//! In-memory conversation log for the web variant.
//!
//! Append-only except for an explicit `clear`. One instance lives in the
//! gateway state behind a mutex and is handed to each request handler; the
//! desktop loops keep only a history-non-empty flag and never build `Turn`s.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One recorded exchange unit. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

/// Handler-shared handle. Locks are held only for the append/clear itself,
/// never across the remote call, so turn pairs stay call-aligned.
pub type SharedHistory = Arc<Mutex<History>>;

pub fn shared() -> SharedHistory {
    Arc::new(Mutex::new(History::new()))
}

/// Lock the shared store, recovering from a poisoned mutex — a panicked
/// handler must not take the history down with it.
pub fn lock(history: &SharedHistory) -> MutexGuard<'_, History> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

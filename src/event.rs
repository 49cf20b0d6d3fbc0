//! Change notification
//!
//! - `EventKind`: the event names listeners can subscribe to
//! - `ChangeEvent`: payload of one store write
//! - `Listeners`: ordered callback registry keyed by kind
//!
//! Callbacks receive the event by shared reference and get no handle to the
//! store, so a listener cannot write back into it while a write is being
//! dispatched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReactiveError;

/// Event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A store variable was written
    Change,
}

impl FromStr for EventKind {
    type Err = ReactiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "change" => Ok(EventKind::Change),
            other => Err(ReactiveError::UnknownEvent {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Change => f.write_str("change"),
        }
    }
}

/// One store write: `old` is `None` when the variable did not exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub name: Arc<str>,
    pub old: Option<Value>,
    pub new: Value,
}

/// Handle returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&ChangeEvent)>;

/// Callbacks in registration order
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(EventKind, ListenerId, Callback)>,
    next_id: u64,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((kind, id, Box::new(callback)));
        id
    }

    /// Unsubscribe; returns whether the listener was registered
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, i, _)| !(*k == kind && *i == id));
        self.entries.len() != before
    }

    /// Call every listener of `kind`, oldest first
    pub fn emit(&mut self, kind: EventKind, event: &ChangeEvent) {
        for (k, _, callback) in self.entries.iter_mut() {
            if *k == kind {
                callback(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

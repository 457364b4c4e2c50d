//! Per-visit session context, keyed by the `report_session` cookie.
//!
//! Sessions live in memory only and are dropped after the idle TTL.
//! Handlers read a snapshot and write through `update`; resolution touches the
//! location fields, submission touches the form status, nothing else.

use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::location::{format_coords, Coordinate, LocationDetails, Resolution, ResolveFailure};

pub const SESSION_COOKIE: &str = "report_session";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionStatus {
    #[default]
    Empty,
    Resolving,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitted,
}

/// What one visitor's page remembers between interactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub coordinate: Option<Coordinate>,
    pub details: Option<LocationDetails>,
    pub resolution: ResolutionStatus,
    pub form: FormStatus,
}

impl SessionState {
    pub fn begin_resolving(&mut self) {
        self.resolution = ResolutionStatus::Resolving;
    }

    /// Record a finished lookup. A failure keeps the last good coordinate.
    pub fn apply_resolution(&mut self, outcome: &Result<Resolution, ResolveFailure>) {
        match outcome {
            Ok(r) => {
                self.coordinate = Some(r.coordinate);
                self.details = r.details.clone();
                self.resolution = ResolutionStatus::Resolved;
            }
            Err(_) => self.resolution = ResolutionStatus::Failed,
        }
    }

    pub fn mark_submitted(&mut self) {
        self.form = FormStatus::Submitted;
    }

    /// Pre-fill for the report's location field.
    pub fn default_location(&self) -> String {
        self.coordinate
            .map(|c| format_coords(c.lat, c.lon))
            .unwrap_or_default()
    }
}

struct SessionEntry {
    state: SessionState,
    last_seen: i64,
}

/// All live sessions.
pub struct SessionStore {
    ttl_ms: i64,
    entries: HashMap<Uuid, SessionEntry>,
}

impl SessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            entries: HashMap::new(),
        }
    }

    /// Resume the session for `id`, or start a fresh one if it is unknown or
    /// expired. Returns the id the caller should keep using.
    pub fn open(&mut self, id: Option<Uuid>) -> Uuid {
        self.open_at(id, Utc::now().timestamp_millis())
    }

    fn open_at(&mut self, id: Option<Uuid>, now: i64) -> Uuid {
        self.sweep(now);

        if let Some(id) = id {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.last_seen = now;
                return id;
            }
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            SessionEntry {
                state: SessionState::default(),
                last_seen: now,
            },
        );
        tracing::debug!(session = %id, live = self.len(), "session started");
        id
    }

    /// Copy of the session's current state (empty if it has gone away).
    pub fn snapshot(&self, id: Uuid) -> SessionState {
        self.entries
            .get(&id)
            .map(|e| e.state.clone())
            .unwrap_or_default()
    }

    /// Mutate the session in place. Recreates it if it expired mid-request.
    pub fn update<R>(&mut self, id: Uuid, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let now = Utc::now().timestamp_millis();
        let entry = self.entries.entry(id).or_insert_with(|| SessionEntry {
            state: SessionState::default(),
            last_seen: now,
        });
        entry.last_seen = now;
        f(&mut entry.state)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn sweep(&mut self, now: i64) {
        let ttl = self.ttl_ms;
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.last_seen <= ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "expired sessions removed");
        }
    }
}

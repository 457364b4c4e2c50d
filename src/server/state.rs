use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::location::LocationResolver;

use super::session::SessionStore;

pub struct AppState {
    pub resolver: Arc<LocationResolver>,
    pub sessions: Mutex<SessionStore>,
    pub lookup_timeout: Duration,
}

impl AppState {
    pub fn new(resolver: LocationResolver, lookup_timeout: Duration, session_ttl: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            sessions: Mutex::new(SessionStore::new(session_ttl)),
            lookup_timeout,
        }
    }

    /// The store holds plain data, so a poisoned lock is still usable.
    pub fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

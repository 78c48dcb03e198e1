// Session registry: issues, validates and expires sessions

use super::storage::SessionStorage;
use super::types::{Session, SessionConfig};
use crate::clock::Clock;
use crate::models::UserRecord;
use std::sync::Arc;
use tracing::{debug, info};

/// Issues and validates short-lived sessions
pub struct SessionRegistry {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    /// Create a new session for a user
    pub fn create_session(&self, user: &UserRecord) -> Session {
        let now = self.clock.now();

        // A v4 id collision is practically impossible, but ids must stay unique
        let session = loop {
            let candidate = Session::new(user, now, self.config.ttl());
            if self.storage.insert_if_absent(candidate.clone()) {
                break candidate;
            }
            debug!("Session id collision, regenerating");
        };

        info!(
            "Created session {} for user {} ({}), expires at {}",
            session.session_id, session.user_id, session.user_name, session.expires_at
        );

        session
    }

    /// Get a session by ID. Expired sessions are treated as absent and reclaimed.
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        let now = self.clock.now();
        let session = self.storage.get_session(session_id)?;

        if session.is_expired_at(now) {
            if self.storage.remove_if_expired(session_id, now) {
                debug!("Session {} expired at {}", session_id, session.expires_at);
            }
            return None;
        }

        Some(session)
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn invalidate_session(&self, session_id: &str) {
        if let Some(session) = self.storage.remove_session(session_id) {
            info!(
                "Session {} invalidated for user {}",
                session_id, session.user_id
            );
        }
    }

    /// Remove every session of a user (logout from all devices)
    pub fn invalidate_user_sessions(&self, user_id: i64) -> usize {
        let count = self.storage.remove_user_sessions(user_id);
        info!("Invalidated {} sessions for user {}", count, user_id);
        count
    }

    /// Reclaim memory held by expired sessions (should be run periodically)
    pub fn cleanup_expired_sessions(&self) -> usize {
        let count = self.storage.remove_expired(self.clock.now());
        if count > 0 {
            debug!("Cleaned up {} expired sessions", count);
        }
        count
    }

    /// Stored sessions, including expired ones not yet reclaimed
    pub fn stored_session_count(&self) -> usize {
        self.storage.len()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

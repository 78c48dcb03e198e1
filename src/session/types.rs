// Session types and data structures

use crate::models::UserRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest session lifetime a configuration may ask for
pub const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed session lifetime, counted from creation
    pub ttl_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3 * 60 * 60, // 3 hours
        }
    }
}

impl SessionConfig {
    /// Lifetime, capped at `MAX_SESSION_TTL_SECS` for configs built without validation
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs.min(MAX_SESSION_TTL_SECS))
    }
}

/// Issued session. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Unique, unguessable session identifier
    pub session_id: String,
    pub user_id: i64,
    pub user_name: String,
    /// Rights held by the user when the session was created
    pub rights: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for `user` with a fresh random id
    pub fn new(user: &UserRecord, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: generate_session_id(),
            user_id: user.id,
            user_name: user.username.clone(),
            rights: user.rights.clone(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// A session is usable only while `expires_at` is strictly in the future
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn has_right(&self, right: &str) -> bool {
        self.rights.contains(right)
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

pub(crate) fn generate_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord::new(42, "alice").with_right("READ")
    }

    #[test]
    fn test_session_creation() {
        let now = Utc::now();
        let config = SessionConfig::default();
        let session = Session::new(&user(), now, config.ttl());

        assert_eq!(session.user_id, 42);
        assert_eq!(session.user_name, "alice");
        assert!(session.has_right("READ"));
        assert_eq!(session.created_at, now);
        assert_eq!(session.expires_at, now + Duration::hours(3));
        assert_eq!(session.session_id.len(), 32);
    }

    #[test]
    fn test_oversized_ttl_is_capped() {
        let config = SessionConfig { ttl_secs: i64::MAX };
        let now = Utc::now();
        let session = Session::new(&user(), now, config.ttl());

        assert_eq!(session.expires_at, now + Duration::seconds(MAX_SESSION_TTL_SECS));
    }

    #[test]
    fn test_session_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new(&user(), now, Duration::seconds(10));

        assert!(!session.is_expired_at(now + Duration::seconds(9)));
        assert!(session.is_expired_at(now + Duration::seconds(10)));
        assert_eq!(session.remaining(now + Duration::seconds(20)), Duration::zero());
    }

    #[test]
    fn test_rights_are_a_snapshot() {
        let mut record = user();
        let session = Session::new(&record, Utc::now(), Duration::hours(1));

        record.rights.insert("ADMIN".to_string());

        assert!(!session.has_right("ADMIN"));
    }

    #[test]
    fn test_session_ids_differ() {
        let now = Utc::now();
        let a = Session::new(&user(), now, Duration::hours(1));
        let b = Session::new(&user(), now, Duration::hours(1));
        assert_ne!(a.session_id, b.session_id);
    }
}

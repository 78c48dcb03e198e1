// Session storage backends

use super::types::Session;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Trait for session storage backends
pub trait SessionStorage: Send + Sync {
    /// Store a session unless its id is already taken. Returns false on collision.
    fn insert_if_absent(&self, session: Session) -> bool;

    /// Get a session by ID, regardless of expiry
    fn get_session(&self, session_id: &str) -> Option<Session>;

    /// Remove a session, returning it if it was present
    fn remove_session(&self, session_id: &str) -> Option<Session>;

    /// Remove a session only if it is expired at `now`
    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) -> bool;

    /// Remove every session expired at `now`
    fn remove_expired(&self, now: DateTime<Utc>) -> usize;

    /// Remove every session belonging to a user
    fn remove_user_sessions(&self, user_id: i64) -> usize;

    /// Number of stored sessions, including expired ones not yet reclaimed
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session storage implementation
#[derive(Default)]
pub struct MemorySessionStorage {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn insert_if_absent(&self, session: Session) -> bool {
        match self.sessions.entry(session.session_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(session);
                true
            }
        }
    }

    fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    fn remove_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id).map(|(_, s)| s)
    }

    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        self.sessions
            .remove_if(session_id, |_, s| s.is_expired_at(now))
            .is_some()
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            if s.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            debug!("Removed {} expired sessions", removed);
        }
        removed
    }

    fn remove_user_sessions(&self, user_id: i64) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, s| {
            if s.user_id == user_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use chrono::Duration;

    fn session_for(user_id: i64, now: DateTime<Utc>, ttl: Duration) -> Session {
        Session::new(&UserRecord::new(user_id, "user"), now, ttl)
    }

    #[test]
    fn test_insert_and_get() {
        let storage = MemorySessionStorage::new();
        let session = session_for(1, Utc::now(), Duration::hours(1));
        let id = session.session_id.clone();

        assert!(storage.insert_if_absent(session.clone()));
        assert_eq!(storage.get_session(&id), Some(session));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let storage = MemorySessionStorage::new();
        let session = session_for(1, Utc::now(), Duration::hours(1));

        assert!(storage.insert_if_absent(session.clone()));

        let mut clash = session_for(2, Utc::now(), Duration::hours(1));
        clash.session_id = session.session_id.clone();
        assert!(!storage.insert_if_absent(clash));

        let stored = storage.get_session(&session.session_id).unwrap();
        assert_eq!(stored.user_id, 1);
    }

    #[test]
    fn test_remove_if_expired_keeps_live_session() {
        let storage = MemorySessionStorage::new();
        let now = Utc::now();
        let session = session_for(1, now, Duration::minutes(10));
        let id = session.session_id.clone();
        storage.insert_if_absent(session);

        assert!(!storage.remove_if_expired(&id, now));
        assert!(storage.remove_if_expired(&id, now + Duration::minutes(10)));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_remove_expired() {
        let storage = MemorySessionStorage::new();
        let now = Utc::now();
        storage.insert_if_absent(session_for(1, now, Duration::minutes(1)));
        storage.insert_if_absent(session_for(2, now, Duration::minutes(1)));
        storage.insert_if_absent(session_for(3, now, Duration::hours(1)));

        assert_eq!(storage.remove_expired(now + Duration::minutes(2)), 2);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_remove_user_sessions() {
        let storage = MemorySessionStorage::new();
        let now = Utc::now();
        for _ in 0..3 {
            storage.insert_if_absent(session_for(5, now, Duration::hours(1)));
        }
        storage.insert_if_absent(session_for(6, now, Duration::hours(1)));

        assert_eq!(storage.remove_user_sessions(5), 3);
        assert_eq!(storage.len(), 1);
    }
}

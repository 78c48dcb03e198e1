// Lockdown state snapshots and the decisions derived from them

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Process-wide lockdown state.
///
/// Values are never edited in place while shared: the authority swaps in a
/// whole new snapshot, so readers always see a consistent window, allowed user
/// and blacklist. Being `Inactive` carries no data, which keeps the allowed
/// user unset and the blacklist empty outside of a lockdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockdownState {
    #[default]
    Inactive,
    Active(ActiveLockdown),
}

impl LockdownState {
    /// The active window, if it has not run out at `now`
    pub fn active_at(&self, now: DateTime<Utc>) -> Option<&ActiveLockdown> {
        match self {
            LockdownState::Active(lockdown) if !lockdown.has_ended(now) => Some(lockdown),
            _ => None,
        }
    }

    /// Still flagged active although the window is over
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        matches!(self, LockdownState::Active(lockdown) if lockdown.has_ended(now))
    }
}

/// A declared lockdown window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLockdown {
    pub allowed_user_id: i64,
    pub activated_at: DateTime<Utc>,
    pub lock_until: DateTime<Utc>,
    /// Revoked token -> instant the revocation itself expires
    pub(crate) blacklist: HashMap<String, DateTime<Utc>>,
}

impl ActiveLockdown {
    /// Fresh window with an empty blacklist
    pub fn new(allowed_user_id: i64, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            allowed_user_id,
            activated_at: now,
            lock_until: now + duration,
            blacklist: HashMap::new(),
        }
    }

    /// The lockdown stays in force up to and including `lock_until`
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.lock_until
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.lock_until - now).max(Duration::zero())
    }

    /// Blacklist entry for `token`, only while it has not expired
    pub fn revocation_of(&self, token: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.blacklist
            .get(token)
            .copied()
            .filter(|expires_at| now < *expires_at)
    }

    pub(crate) fn has_stale_revocation(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.blacklist
            .get(token)
            .is_some_and(|expires_at| *expires_at <= now)
    }

    pub fn blacklisted_tokens(&self) -> usize {
        self.blacklist.len()
    }
}

/// Why a request was refused during a lockdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The user is not the one allowed through the lockdown
    Lockdown,
    /// The token was explicitly revoked for the duration of the lockdown
    RevokedToken,
}

/// Outcome of checking a (user, token) pair against the lockdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCheck {
    Allowed,
    Blocked(BlockReason),
}

impl AccessCheck {
    pub fn is_blocked(&self) -> bool {
        matches!(self, AccessCheck::Blocked(_))
    }
}

/// Read-only view of the lockdown for administrative display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockdownStatus {
    pub active: bool,
    pub allowed_user_id: Option<i64>,
    pub lock_until: Option<DateTime<Utc>>,
    pub remaining_millis: Option<i64>,
    pub blacklisted_tokens: usize,
}

impl LockdownStatus {
    pub fn inactive() -> Self {
        Self {
            active: false,
            allowed_user_id: None,
            lock_until: None,
            remaining_millis: None,
            blacklisted_tokens: 0,
        }
    }

    pub fn of(state: &LockdownState, now: DateTime<Utc>) -> Self {
        match state.active_at(now) {
            Some(lockdown) => Self {
                active: true,
                allowed_user_id: Some(lockdown.allowed_user_id),
                lock_until: Some(lockdown.lock_until),
                remaining_millis: Some(lockdown.remaining(now).num_milliseconds()),
                blacklisted_tokens: lockdown.blacklisted_tokens(),
            },
            None => Self::inactive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let lockdown = ActiveLockdown::new(7, now, Duration::minutes(5));
        let state = LockdownState::Active(lockdown);

        assert!(state.active_at(now + Duration::minutes(5)).is_some());
        assert!(!state.is_stale(now + Duration::minutes(5)));

        let later = now + Duration::minutes(5) + Duration::milliseconds(1);
        assert!(state.active_at(later).is_none());
        assert!(state.is_stale(later));
    }

    #[test]
    fn test_inactive_is_never_stale() {
        let state = LockdownState::default();
        assert!(!state.is_stale(Utc::now()));
        assert!(state.active_at(Utc::now()).is_none());
    }

    #[test]
    fn test_revocation_expiry() {
        let now = Utc::now();
        let mut lockdown = ActiveLockdown::new(7, now, Duration::minutes(5));
        lockdown
            .blacklist
            .insert("tok".to_string(), now + Duration::minutes(1));

        assert!(lockdown.revocation_of("tok", now).is_some());
        assert!(!lockdown.has_stale_revocation("tok", now));

        let later = now + Duration::minutes(1);
        assert!(lockdown.revocation_of("tok", later).is_none());
        assert!(lockdown.has_stale_revocation("tok", later));
        assert!(!lockdown.has_stale_revocation("other", later));
    }

    #[test]
    fn test_status_view() {
        let now = Utc::now();
        let state = LockdownState::Active(ActiveLockdown::new(7, now, Duration::minutes(5)));

        let status = LockdownStatus::of(&state, now);
        assert!(status.active);
        assert_eq!(status.allowed_user_id, Some(7));
        assert_eq!(status.remaining_millis, Some(300_000));

        let expired = LockdownStatus::of(&state, now + Duration::minutes(6));
        assert_eq!(expired, LockdownStatus::inactive());
    }
}

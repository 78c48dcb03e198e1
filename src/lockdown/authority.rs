// Emergency lockdown authority
// Gates logins and requests while an administrator has restricted access to one user

use super::state::{AccessCheck, ActiveLockdown, BlockReason, LockdownState, LockdownStatus};
use crate::clock::Clock;
use crate::error::LockdownError;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MIN_LOCKDOWN_MINUTES: i64 = 1;
pub const MAX_LOCKDOWN_MINUTES: i64 = 30;

/// Owner of the single lockdown window.
///
/// Every query first applies lazy expiry: once the clock passes `lock_until`
/// the lockdown is dropped by whichever caller notices first, so no timer is
/// needed. Writers replace the whole snapshot under one lock; readers clone
/// the current `Arc` and evaluate it without holding the lock.
pub struct LockdownAuthority {
    state: RwLock<Arc<LockdownState>>,
    clock: Arc<dyn Clock>,
}

impl LockdownAuthority {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(Arc::new(LockdownState::Inactive)),
            clock,
        }
    }

    /// Restrict access to `allowed_user_id` for `duration_minutes` (1..=30).
    /// Replaces any running lockdown and starts with an empty blacklist.
    pub fn activate(
        &self,
        allowed_user_id: i64,
        duration_minutes: i64,
    ) -> Result<LockdownStatus, LockdownError> {
        if !(MIN_LOCKDOWN_MINUTES..=MAX_LOCKDOWN_MINUTES).contains(&duration_minutes) {
            warn!(
                "Rejected lockdown for user {}: invalid duration {} minute(s)",
                allowed_user_id, duration_minutes
            );
            return Err(LockdownError::InvalidLockdownDuration {
                minutes: duration_minutes,
                min: MIN_LOCKDOWN_MINUTES,
                max: MAX_LOCKDOWN_MINUTES,
            });
        }

        let now = self.clock.now();
        let next = LockdownState::Active(ActiveLockdown::new(
            allowed_user_id,
            now,
            Duration::minutes(duration_minutes),
        ));
        let status = LockdownStatus::of(&next, now);

        *self.state.write() = Arc::new(next);

        info!(
            "Emergency lockdown activated for {} minute(s); only user {} is allowed",
            duration_minutes, allowed_user_id
        );
        Ok(status)
    }

    /// Lift the lockdown immediately
    pub fn reset(&self) {
        let previous = std::mem::take(&mut *self.state.write());
        if let LockdownState::Active(lockdown) = previous.as_ref() {
            info!(
                "Emergency lockdown reset (allowed user {}, {} blacklisted token(s) dropped)",
                lockdown.allowed_user_id,
                lockdown.blacklisted_tokens()
            );
        }
    }

    /// Whether `user_id` presenting `token` must be refused right now
    pub fn is_session_blocked(&self, user_id: i64, token: &str) -> bool {
        self.check_session(user_id, token).is_blocked()
    }

    /// Decide a (user, token) pair, reporting why it is blocked.
    ///
    /// Any user other than the allowed one is refused while the lockdown runs.
    /// A live blacklist entry is reported as an explicit revocation; an expired
    /// one is pruned and the default refusal applies.
    pub fn check_session(&self, user_id: i64, token: &str) -> AccessCheck {
        let now = self.clock.now();
        let state = self.current(now);

        let Some(lockdown) = state.active_at(now) else {
            return AccessCheck::Allowed;
        };

        if user_id == lockdown.allowed_user_id {
            return AccessCheck::Allowed;
        }

        if lockdown.revocation_of(token, now).is_some() {
            return AccessCheck::Blocked(BlockReason::RevokedToken);
        }

        if lockdown.has_stale_revocation(token, now) {
            self.prune_token(token, now);
        }

        AccessCheck::Blocked(BlockReason::Lockdown)
    }

    pub fn is_user_allowed_to_login(&self, user_id: i64) -> bool {
        let now = self.clock.now();
        match self.current(now).active_at(now) {
            Some(lockdown) => lockdown.allowed_user_id == user_id,
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        let now = self.clock.now();
        self.current(now).active_at(now).is_some()
    }

    /// Time left in the lockdown, `None` when inactive
    pub fn remaining_time(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.current(now)
            .active_at(now)
            .map(|lockdown| lockdown.remaining(now))
    }

    pub fn remaining_time_millis(&self) -> Option<i64> {
        self.remaining_time().map(|d| d.num_milliseconds())
    }

    pub fn allowed_user_id(&self) -> Option<i64> {
        let now = self.clock.now();
        self.current(now)
            .active_at(now)
            .map(|lockdown| lockdown.allowed_user_id)
    }

    /// Revoke `token` until `expires_at`, overwriting any earlier entry.
    /// Returns false when no lockdown is running, as the blacklist only
    /// exists for the lifetime of one.
    pub fn add_token_to_blacklist(&self, token: &str, expires_at: DateTime<Utc>) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();
        Self::expire_if_stale(&mut state, now);

        match Arc::make_mut(&mut *state) {
            LockdownState::Active(lockdown) => {
                lockdown.blacklist.insert(token.to_string(), expires_at);
                debug!("Token blacklisted until {}", expires_at);
                true
            }
            LockdownState::Inactive => {
                debug!("Ignoring blacklist request: no lockdown active");
                false
            }
        }
    }

    /// Whether `token` has a live entry on the revocation list
    pub fn is_token_blacklisted(&self, token: &str) -> bool {
        let now = self.clock.now();
        self.current(now)
            .active_at(now)
            .is_some_and(|lockdown| lockdown.revocation_of(token, now).is_some())
    }

    pub fn status(&self) -> LockdownStatus {
        let now = self.clock.now();
        LockdownStatus::of(&self.current(now), now)
    }

    /// Housekeeping: apply lazy expiry and drop expired blacklist entries.
    /// Returns the number of blacklist entries removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.write();

        if let Some(dropped) = Self::expire_if_stale(&mut state, now) {
            return dropped;
        }

        let has_expired = match &**state {
            LockdownState::Active(lockdown) => {
                lockdown.blacklist.values().any(|expires_at| *expires_at <= now)
            }
            LockdownState::Inactive => false,
        };
        if !has_expired {
            return 0;
        }

        let LockdownState::Active(lockdown) = Arc::make_mut(&mut *state) else {
            return 0;
        };
        let before = lockdown.blacklist.len();
        lockdown.blacklist.retain(|_, expires_at| now < *expires_at);
        let pruned = before - lockdown.blacklist.len();
        debug!("Pruned {} expired blacklist entries", pruned);
        pruned
    }

    /// Snapshot with lazy expiry applied
    fn current(&self, now: DateTime<Utc>) -> Arc<LockdownState> {
        let snapshot = self.state.read().clone();
        if !snapshot.is_stale(now) {
            return snapshot;
        }

        let mut state = self.state.write();
        Self::expire_if_stale(&mut state, now);
        state.clone()
    }

    /// Drop a lockdown whose window has passed. Returns the number of
    /// blacklist entries discarded with it, or `None` if nothing changed.
    fn expire_if_stale(state: &mut Arc<LockdownState>, now: DateTime<Utc>) -> Option<usize> {
        let LockdownState::Active(lockdown) = &**state else {
            return None;
        };
        if !lockdown.has_ended(now) {
            return None;
        }

        info!(
            "Emergency lockdown for user {} expired at {}",
            lockdown.allowed_user_id, lockdown.lock_until
        );
        let dropped = lockdown.blacklisted_tokens();
        *state = Arc::new(LockdownState::Inactive);
        Some(dropped)
    }

    fn prune_token(&self, token: &str, now: DateTime<Utc>) {
        let mut state = self.state.write();
        let stale = matches!(
            &**state,
            LockdownState::Active(lockdown) if lockdown.has_stale_revocation(token, now)
        );
        if !stale {
            return;
        }

        if let LockdownState::Active(lockdown) = Arc::make_mut(&mut *state) {
            lockdown.blacklist.remove(token);
            debug!("Pruned expired blacklist entry");
        }
    }
}

// Auth gate: the decisions an HTTP auth layer makes on login and on every request,
// expressed without any transport

use crate::clock::Clock;
use crate::config::AuthorityConfig;
use crate::error::GateError;
use crate::lockdown::{AccessCheck, BlockReason, LockdownAuthority, LockdownStatus};
use crate::models::UserRecord;
use crate::session::{MemorySessionStorage, Session, SessionRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of authorizing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Unknown or expired session
    NotFound,
    /// Valid session refused by the lockdown
    Blocked(BlockReason),
    Allowed(Session),
}

/// Composes the session registry and the lockdown authority
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<SessionRegistry>,
    lockdown: Arc<LockdownAuthority>,
    admin_right: String,
}

impl AuthGate {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        lockdown: Arc<LockdownAuthority>,
        admin_right: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            lockdown,
            admin_right: admin_right.into(),
        }
    }

    /// Wire both components with in-memory storage
    pub fn from_config(config: &AuthorityConfig, clock: Arc<dyn Clock>) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            Arc::new(MemorySessionStorage::new()),
            clock.clone(),
            config.session.clone(),
        ));
        let lockdown = Arc::new(LockdownAuthority::new(clock));
        Self::new(sessions, lockdown, config.lockdown.admin_right.clone())
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn lockdown(&self) -> &Arc<LockdownAuthority> {
        &self.lockdown
    }

    /// Open a session unless a lockdown keeps this user out
    pub fn login(&self, user: &UserRecord) -> Result<Session, GateError> {
        if !self.lockdown.is_user_allowed_to_login(user.id) {
            warn!("Login refused for user {} during lockdown", user.id);
            return Err(GateError::LockdownActive);
        }

        Ok(self.sessions.create_session(user))
    }

    /// Decide a request carrying `session_id` and bearer `token`.
    /// A request refused by the lockdown gets its token revoked until the
    /// session would have expired.
    pub fn authorize(&self, session_id: &str, token: &str) -> AccessDecision {
        let Some(session) = self.sessions.get_session(session_id) else {
            return AccessDecision::NotFound;
        };

        match self.lockdown.check_session(session.user_id, token) {
            AccessCheck::Allowed => AccessDecision::Allowed(session),
            AccessCheck::Blocked(reason) => {
                warn!(
                    "Request from user {} blocked by lockdown ({:?})",
                    session.user_id, reason
                );
                if reason == BlockReason::Lockdown {
                    self.lockdown
                        .add_token_to_blacklist(token, session.expires_at);
                }
                AccessDecision::Blocked(reason)
            }
        }
    }

    /// End a session. During a lockdown the token is revoked as well.
    pub fn logout(&self, session_id: &str, token: &str) {
        let expires_at = self
            .sessions
            .get_session(session_id)
            .map(|session| session.expires_at);

        self.sessions.invalidate_session(session_id);

        if let Some(expires_at) = expires_at
            && self.lockdown.is_active()
        {
            self.lockdown.add_token_to_blacklist(token, expires_at);
        }
    }

    /// Declare a lockdown on behalf of `admin`, who becomes the only allowed user
    pub fn declare_lockdown(
        &self,
        admin: &Session,
        duration_minutes: i64,
    ) -> Result<LockdownStatus, GateError> {
        self.require_admin(admin)?;

        let status = self.lockdown.activate(admin.user_id, duration_minutes)?;
        info!(
            "User {} ({}) declared an emergency lockdown",
            admin.user_id, admin.user_name
        );
        Ok(status)
    }

    pub fn lift_lockdown(&self, admin: &Session) -> Result<(), GateError> {
        self.require_admin(admin)?;

        self.lockdown.reset();
        info!(
            "User {} ({}) lifted the emergency lockdown",
            admin.user_id, admin.user_name
        );
        Ok(())
    }

    pub fn lockdown_status(&self) -> LockdownStatus {
        self.lockdown.status()
    }

    fn require_admin(&self, session: &Session) -> Result<(), GateError> {
        if session.has_right(&self.admin_right) {
            return Ok(());
        }

        warn!(
            "User {} attempted a lockdown action without {}",
            session.user_id, self.admin_right
        );
        Err(GateError::MissingRight(self.admin_right.clone()))
    }
}

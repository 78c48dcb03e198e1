// Periodic memory reclamation for expired sessions and blacklist entries.
// Lookups expire state on their own; this only keeps the tables small.

use crate::config::SweeperConfig;
use crate::lockdown::LockdownAuthority;
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Run one sweep over both components
pub fn sweep_once(sessions: &SessionRegistry, lockdown: &LockdownAuthority) -> (usize, usize) {
    let expired_sessions = sessions.cleanup_expired_sessions();
    let pruned_tokens = lockdown.sweep();

    if expired_sessions > 0 || pruned_tokens > 0 {
        debug!(
            "Sweep removed {} session(s) and {} blacklist entries",
            expired_sessions, pruned_tokens
        );
    }

    (expired_sessions, pruned_tokens)
}

/// Start the background sweeper. Abort the returned handle to stop it.
pub fn spawn_sweeper(
    sessions: Arc<SessionRegistry>,
    lockdown: Arc<LockdownAuthority>,
    every: Duration,
) -> JoinHandle<()> {
    info!("Starting session sweeper (every {:?})", every);

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_once(&sessions, &lockdown);
        }
    })
}

/// Start the sweeper as configured. Returns `None` when it is disabled.
pub fn spawn_sweeper_from_config(
    config: &SweeperConfig,
    sessions: Arc<SessionRegistry>,
    lockdown: Arc<LockdownAuthority>,
) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("Session sweeper disabled; expired entries are reclaimed on lookup only");
        return None;
    }
    if config.interval_secs == 0 {
        warn!("Session sweeper not started: interval_secs is zero");
        return None;
    }

    Some(spawn_sweeper(sessions, lockdown, config.interval()))
}

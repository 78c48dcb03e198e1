// Emergency lockdown module
// Time-bounded restriction of all access to a single user, with a token revocation list

pub mod authority;
pub mod state;

pub use authority::{LockdownAuthority, MAX_LOCKDOWN_MINUTES, MIN_LOCKDOWN_MINUTES};
pub use state::{AccessCheck, ActiveLockdown, BlockReason, LockdownState, LockdownStatus};

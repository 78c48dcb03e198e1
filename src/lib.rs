// Session registry and emergency lockdown authority
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod lockdown;
pub mod models;
pub mod session;
pub mod sweeper;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthorityConfig;
pub use error::{ConfigError, GateError, LockdownError};
pub use gate::{AccessDecision, AuthGate};
pub use lockdown::{AccessCheck, BlockReason, LockdownAuthority, LockdownStatus};
pub use models::UserRecord;
pub use session::{MemorySessionStorage, Session, SessionRegistry, SessionStorage};

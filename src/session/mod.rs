// Session management module
// Issues, validates and expires per-user sessions with a fixed lifetime

pub mod registry;
pub mod storage;
pub mod types;

pub use registry::SessionRegistry;
pub use storage::{MemorySessionStorage, SessionStorage};
pub use types::{Session, SessionConfig};

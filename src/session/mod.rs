//! Session management: live call machines, durable snapshots, and the
//! background sweep that keeps both tidy.

pub mod manager;
pub mod metadata;
pub mod store;

pub use manager::SessionManager;
pub use metadata::SessionMetadata;
pub use store::{FailingStore, FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

//! Storage collaborator boundary.
//!
//! The engines never assume a persistence format; anything that can hand
//! back committed [`TestSession`] values satisfies the contract. This
//! crate ships the trait, an in-memory reference implementation, and a
//! named-profile registry that is immutable once built.

pub mod error;
pub mod memory;
pub mod profiles;

use std::sync::Arc;

use suitelens_types::TestSession;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use profiles::{ProfileRegistry, ProfileRegistryBuilder};

/// Source of committed test sessions.
///
/// Implementations only ever see fully-captured sessions; partially
/// written runs are the capture collaborator's problem.
pub trait SessionStore {
    /// Load every committed session.
    fn load_sessions(&self) -> Result<Vec<TestSession>>;

    /// Persist a session, replacing any existing session with the same id.
    fn save_session(&self, session: &TestSession) -> Result<()>;

    /// Look up one session by id.
    fn session_by_id(&self, id: &str) -> Result<Option<TestSession>>;
}

/// Shared handle to a session store.
pub type StoreHandle = Arc<dyn SessionStore + Send + Sync>;

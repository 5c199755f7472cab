use std::sync::Mutex;

use suitelens_types::TestSession;

use crate::error::{Error, Result};
use crate::SessionStore;

/// In-memory session store.
///
/// Reference implementation of [`SessionStore`]; used by tests and by any
/// caller that wants to run the engines over an ad-hoc session set
/// without touching disk.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<TestSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with sessions.
    pub fn with_sessions(sessions: Vec<TestSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load_sessions(&self) -> Result<Vec<TestSession>> {
        let sessions = self.sessions.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.clone())
    }

    fn save_session(&self, session: &TestSession) -> Result<()> {
        let mut sessions = self.sessions.lock().map_err(|_| Error::LockPoisoned)?;
        match sessions.iter_mut().find(|s| s.session_id == session.session_id) {
            Some(existing) => *existing = session.clone(),
            None => sessions.push(session.clone()),
        }
        Ok(())
    }

    fn session_by_id(&self, id: &str) -> Result<Option<TestSession>> {
        let sessions = self.sessions.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(sessions.iter().find(|s| s.session_id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn session(id: &str) -> TestSession {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        TestSession::new(
            id,
            "api-service",
            start,
            start + chrono::Duration::seconds(5),
            BTreeMap::new(),
            Vec::new(),
        )
    }

    #[test]
    fn save_appends_then_replaces() {
        let store = MemoryStore::new();
        store.save_session(&session("run-1")).unwrap();
        store.save_session(&session("run-2")).unwrap();
        assert_eq!(store.load_sessions().unwrap().len(), 2);

        let mut updated = session("run-1");
        updated.sut_name = "db-service".to_string();
        store.save_session(&updated).unwrap();

        let sessions = store.load_sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        let found = store.session_by_id("run-1").unwrap().unwrap();
        assert_eq!(found.sut_name, "db-service");
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let store = MemoryStore::with_sessions(vec![session("run-1")]);
        assert!(store.session_by_id("run-9").unwrap().is_none());
    }
}

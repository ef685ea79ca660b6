use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use contracts::usecases::u501_import_residents::{ProgressSnapshot, SessionSnapshot};

use super::session::ImportSession;

/// In-memory registry of live import sessions, keyed by session id.
/// Sessions never touch the database themselves, so losing them on
/// restart only loses an unfinished dialog.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, ImportSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn insert(&self, session: ImportSession) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.session_id().to_string(), session);
    }

    /// Run a closure against one session under the write lock. Returns
    /// None when the id is unknown. All state transitions go through
    /// here, so concurrent requests serialize per store.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut ImportSession) -> T,
    ) -> Option<T> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.get_mut(session_id).map(f)
    }

    pub fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).map(|s| s.snapshot())
    }

    pub fn progress(&self, session_id: &str) -> Option<ProgressSnapshot> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).map(|s| {
            let snapshot = s.snapshot();
            ProgressSnapshot {
                stage: snapshot.stage,
                progress: snapshot.progress,
                results: snapshot.results,
            }
        })
    }

}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_import_residents::directory::{
        ExistingResidentIndex, UnitDirectory,
    };
    use contracts::usecases::u501_import_residents::{ImportSchema, ImportStage};

    fn empty_session(id: &str) -> ImportSession {
        ImportSession::new(
            id.to_string(),
            "c1".to_string(),
            ImportSchema::Full,
            UnitDirectory::default(),
            ExistingResidentIndex::default(),
        )
    }

    #[test]
    fn closure_mutations_persist_across_lookups() {
        let store = SessionStore::new();
        store.insert(empty_session("s1"));

        let stage = store.with_session("s1", |s| {
            s.request_cancel();
            s.stage()
        });
        assert_eq!(stage, Some(ImportStage::Upload));
        assert_eq!(
            store.snapshot("s1").map(|s| s.session_id),
            Some("s1".to_string())
        );
    }

    #[test]
    fn unknown_id_yields_none() {
        let store = SessionStore::new();
        assert!(store.with_session("missing", |_| ()).is_none());
        assert!(store.snapshot("missing").is_none());
        assert!(store.progress("missing").is_none());
    }

}

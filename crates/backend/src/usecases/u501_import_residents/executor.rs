use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use contracts::usecases::u501_import_residents::response::{
    ImportStartStatus, StartImportResponse,
};
use contracts::usecases::u501_import_residents::ResidentCandidate;

use crate::domain::a004_resident::{self, service::InsertFailure};

use super::session_store::SessionStore;

/// Sink for the rows the batch actually persists. The production
/// implementation writes through the resident service; tests swap in
/// a scripted one.
#[async_trait]
pub trait ResidentWriter: Send + Sync {
    async fn insert(&self, candidate: &ResidentCandidate) -> Result<Uuid, InsertFailure>;
}

pub struct DbResidentWriter;

#[async_trait]
impl ResidentWriter for DbResidentWriter {
    async fn insert(&self, candidate: &ResidentCandidate) -> Result<Uuid, InsertFailure> {
        a004_resident::service::insert_imported(candidate).await
    }
}

/// Executor for the resident import usecase. Starting an import
/// transitions the session and spawns the sequential insert loop in
/// the background; callers poll the store for progress.
pub struct ImportExecutor {
    store: SessionStore,
    writer: Arc<dyn ResidentWriter>,
}

impl ImportExecutor {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            writer: Arc::new(DbResidentWriter),
        }
    }

    #[cfg(test)]
    pub fn with_writer(store: SessionStore, writer: Arc<dyn ResidentWriter>) -> Self {
        Self { store, writer }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Move the session to Importing and spawn the insert loop.
    /// Returns None for an unknown session id; a session that cannot
    /// start (wrong stage, nothing valid) yields a Refused response.
    pub async fn start_import(&self, session_id: &str) -> Option<StartImportResponse> {
        let begun = self.store.with_session(session_id, |s| s.begin_import())?;

        match begun {
            Ok((batch, import_set)) => {
                let total = import_set.len();
                let executor = self.clone();
                let session_id = session_id.to_string();
                tokio::spawn(async move {
                    executor.run_import(&session_id, batch, import_set).await;
                });
                Some(StartImportResponse {
                    status: ImportStartStatus::Started,
                    message: format!("importing {} rows", total),
                })
            }
            Err(e) => Some(StartImportResponse {
                status: ImportStartStatus::Refused,
                message: e.to_string(),
            }),
        }
    }

    /// Strictly sequential: one insert at a time, in file order, with
    /// a liveness check before each. A cancel or a reset makes the
    /// batch stale and the loop stops writing; otherwise it runs to
    /// the end of the set and the session lands in Done.
    async fn run_import(&self, session_id: &str, batch: u64, import_set: Vec<ResidentCandidate>) {
        for candidate in import_set {
            let active = self
                .store
                .with_session(session_id, |s| s.run_active(batch))
                .unwrap_or(false);
            if !active {
                tracing::warn!("Session {}: import batch {} stopped early", session_id, batch);
                break;
            }

            match self.writer.insert(&candidate).await {
                Ok(_) => {
                    self.store
                        .with_session(session_id, |s| s.record_success(batch));
                }
                Err(failure) => {
                    let reason = normalize_reason(&failure);
                    tracing::warn!(
                        "Session {}: row {} rejected: {}",
                        session_id,
                        candidate.line,
                        reason
                    );
                    self.store
                        .with_session(session_id, |s| s.record_failure(batch, candidate, reason));
                }
            }
        }

        if let Some(snapshot) = self.store.with_session(session_id, |s| {
            s.finish_import(batch);
            s.snapshot()
        }) {
            tracing::info!(
                "Session {}: import finished, {} inserted, {} failed",
                session_id,
                snapshot.results.success_count,
                snapshot.results.failed_count
            );
        }
    }
}

impl Clone for ImportExecutor {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            writer: Arc::clone(&self.writer),
        }
    }
}

/// Collapse raw database errors into the fixed reasons the dialog shows.
fn normalize_reason(failure: &InsertFailure) -> String {
    match failure {
        InsertFailure::DuplicateKey => "email already registered".to_string(),
        InsertFailure::ConstraintViolation => "database rule violation".to_string(),
        InsertFailure::Other(raw) => raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_import_residents::directory::{
        DirectoryApartment, DirectoryBlock, ExistingResidentIndex, UnitDirectory,
    };
    use crate::usecases::u501_import_residents::session::ImportSession;
    use contracts::usecases::u501_import_residents::{ImportSchema, ImportStage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted writer: fails the rows whose zero-based call index is
    /// listed, succeeds otherwise.
    struct ScriptedWriter {
        calls: AtomicUsize,
        failures: Vec<(usize, InsertFailure)>,
    }

    impl ScriptedWriter {
        fn new(failures: Vec<(usize, InsertFailure)>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures,
            }
        }
    }

    #[async_trait]
    impl ResidentWriter for ScriptedWriter {
        async fn insert(&self, _candidate: &ResidentCandidate) -> Result<Uuid, InsertFailure> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            for (failing, failure) in &self.failures {
                if *failing == index {
                    return Err(match failure {
                        InsertFailure::DuplicateKey => InsertFailure::DuplicateKey,
                        InsertFailure::ConstraintViolation => InsertFailure::ConstraintViolation,
                        InsertFailure::Other(raw) => InsertFailure::Other(raw.clone()),
                    });
                }
            }
            Ok(Uuid::new_v4())
        }
    }

    fn directory() -> UnitDirectory {
        UnitDirectory::new(
            vec![DirectoryBlock {
                id: "b1".into(),
                name: "BLOCO 1".into(),
            }],
            vec![
                DirectoryApartment {
                    id: "a101".into(),
                    block_id: "b1".into(),
                    number: "101".into(),
                },
                DirectoryApartment {
                    id: "a102".into(),
                    block_id: "b1".into(),
                    number: "102".into(),
                },
                DirectoryApartment {
                    id: "a103".into(),
                    block_id: "b1".into(),
                    number: "103".into(),
                },
            ],
        )
    }

    fn store_with_loaded_session() -> SessionStore {
        let store = SessionStore::new();
        let mut session = ImportSession::new(
            "s1".into(),
            "c1".into(),
            ImportSchema::Full,
            directory(),
            ExistingResidentIndex::default(),
        );
        session
            .load_file(
                "residents.csv",
                "block,apartment,name,email,phone,taxId,owner,responsible\n\
                 BLOCO 1,101,João da Silva,joao@email.com,11999990000,,sim,sim\n\
                 BLOCO 1,102,Maria Santos,maria@email.com,11988887777,,nao,sim\n\
                 BLOCO 1,103,Carlos Souza,carlos@email.com,11977776666,,sim,nao\n",
            )
            .unwrap();
        store.insert(session);
        store
    }

    async fn wait_for_done(store: &SessionStore, session_id: &str) {
        for _ in 0..100 {
            if store
                .snapshot(session_id)
                .map(|s| s.stage == ImportStage::Done)
                .unwrap_or(false)
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("import never reached Done");
    }

    #[tokio::test]
    async fn mid_batch_failure_is_recorded_and_the_rest_still_runs() {
        let store = store_with_loaded_session();
        let executor = ImportExecutor::with_writer(
            store.clone(),
            Arc::new(ScriptedWriter::new(vec![(1, InsertFailure::DuplicateKey)])),
        );

        let response = executor.start_import("s1").await.unwrap();
        assert_eq!(response.status, ImportStartStatus::Started);
        wait_for_done(&store, "s1").await;

        let snapshot = store.snapshot("s1").unwrap();
        assert_eq!(snapshot.results.success_count, 2);
        assert_eq!(snapshot.results.failed_count, 1);
        assert_eq!(snapshot.results.failures.len(), 1);
        assert_eq!(
            snapshot.results.failures[0].reason,
            "email already registered"
        );
        assert_eq!(
            snapshot.results.failures[0].candidate.full_name,
            "Maria Santos"
        );
        assert_eq!(snapshot.progress.current, 3);
    }

    #[tokio::test]
    async fn constraint_and_raw_failures_keep_their_own_reasons() {
        let store = store_with_loaded_session();
        let executor = ImportExecutor::with_writer(
            store.clone(),
            Arc::new(ScriptedWriter::new(vec![
                (0, InsertFailure::ConstraintViolation),
                (2, InsertFailure::Other("database is locked".into())),
            ])),
        );

        executor.start_import("s1").await.unwrap();
        wait_for_done(&store, "s1").await;

        let snapshot = store.snapshot("s1").unwrap();
        assert_eq!(snapshot.results.success_count, 1);
        assert_eq!(snapshot.results.failed_count, 2);
        assert_eq!(
            snapshot.results.failures[0].reason,
            "database rule violation"
        );
        assert_eq!(snapshot.results.failures[1].reason, "database is locked");
    }

    #[tokio::test]
    async fn second_start_is_refused_and_unknown_session_is_none() {
        let store = store_with_loaded_session();
        let executor = ImportExecutor::with_writer(
            store.clone(),
            Arc::new(ScriptedWriter::new(vec![])),
        );

        let first = executor.start_import("s1").await.unwrap();
        assert_eq!(first.status, ImportStartStatus::Started);
        let second = executor.start_import("s1").await.unwrap();
        assert_eq!(second.status, ImportStartStatus::Refused);

        assert!(executor.start_import("missing").await.is_none());
        wait_for_done(&store, "s1").await;
    }

    #[tokio::test]
    async fn cancel_before_start_stops_the_loop_early() {
        let store = store_with_loaded_session();
        // Begin manually so the flag is set before any insert runs.
        let (batch, import_set) = store
            .with_session("s1", |s| s.begin_import())
            .unwrap()
            .unwrap();
        store.with_session("s1", |s| s.request_cancel());

        let executor = ImportExecutor::with_writer(
            store.clone(),
            Arc::new(ScriptedWriter::new(vec![])),
        );
        executor.run_import("s1", batch, import_set).await;

        let snapshot = store.snapshot("s1").unwrap();
        assert_eq!(snapshot.stage, ImportStage::Done);
        assert_eq!(snapshot.results.success_count, 0);
        assert_eq!(snapshot.results.failed_count, 0);
        assert_eq!(snapshot.progress.current, 0);
    }

    #[tokio::test]
    async fn reset_during_import_leaves_the_fresh_session_untouched() {
        let store = store_with_loaded_session();
        let (batch, import_set) = store
            .with_session("s1", |s| s.begin_import())
            .unwrap()
            .unwrap();

        // Reset lands before the loop runs; the batch is now stale and
        // must neither insert rows nor move the session off Upload.
        store.with_session("s1", |s| {
            s.reset(directory(), ExistingResidentIndex::default())
        });

        let writer = Arc::new(ScriptedWriter::new(vec![]));
        let executor = ImportExecutor::with_writer(store.clone(), writer.clone());
        executor.run_import("s1", batch, import_set).await;

        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
        let snapshot = store.snapshot("s1").unwrap();
        assert_eq!(snapshot.stage, ImportStage::Upload);
        assert_eq!(snapshot.results.success_count, 0);
        assert_eq!(snapshot.results.failed_count, 0);
        assert_eq!(snapshot.progress.current, 0);
        assert_eq!(snapshot.progress.total, 0);
    }
}

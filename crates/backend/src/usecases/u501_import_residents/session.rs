use chrono::{DateTime, Utc};
use thiserror::Error;

use contracts::usecases::u501_import_residents::{
    CandidateField, ImportProgress, ImportResults, ImportSchema, ImportStage, ResidentCandidate,
    RowFailure, SessionSnapshot,
};

use super::directory::{ExistingResidentIndex, UnitDirectory};
use super::{parser, validator};

/// Flow-level failures of the import dialog. Row-level problems never
/// show up here; they live on the candidates themselves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportFlowError {
    #[error("wrong file type; choose a .csv file")]
    WrongFileType,
    #[error("file has a header but no usable data lines")]
    EmptyFile,
    #[error("no valid rows to import")]
    NoValidRows,
    #[error("operation not allowed while the session is in the {0:?} stage")]
    WrongStage(ImportStage),
    #[error("row index {0} is out of range")]
    RowOutOfRange(usize),
}

/// One import dialog session: Upload → Preview → Importing → Done.
///
/// Owns the candidate list and the read-only reference data (unit
/// directory, existing-resident index) loaded when the session was
/// opened. All mutation goes through the store, one caller at a time,
/// so each edit is atomic with its own re-validation.
#[derive(Debug, Clone)]
pub struct ImportSession {
    session_id: String,
    condominium_id: String,
    schema: ImportSchema,
    stage: ImportStage,
    candidates: Vec<ResidentCandidate>,
    directory: UnitDirectory,
    existing: ExistingResidentIndex,
    progress: ImportProgress,
    results: ImportResults,
    /// Incremented on every begin_import; recorder calls must present it
    batch: u64,
    cancel_requested: bool,
    updated_at: DateTime<Utc>,
}

impl ImportSession {
    pub fn new(
        session_id: String,
        condominium_id: String,
        schema: ImportSchema,
        directory: UnitDirectory,
        existing: ExistingResidentIndex,
    ) -> Self {
        Self {
            session_id,
            condominium_id,
            schema,
            stage: ImportStage::Upload,
            candidates: Vec::new(),
            directory,
            existing,
            progress: ImportProgress::default(),
            results: ImportResults::default(),
            batch: 0,
            cancel_requested: false,
            updated_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn candidates(&self) -> &[ResidentCandidate] {
        &self.candidates
    }

    pub fn valid_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.candidates.len() - self.valid_count()
    }

    /// Upload → Preview. Tokenizes and validates every line; an empty
    /// result keeps the session in Upload.
    pub fn load_file(&mut self, file_name: &str, text: &str) -> Result<(), ImportFlowError> {
        if self.stage != ImportStage::Upload {
            return Err(ImportFlowError::WrongStage(self.stage));
        }

        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if extension != "csv" && extension != "txt" {
            return Err(ImportFlowError::WrongFileType);
        }

        let rows = parser::parse_rows(text, self.schema);
        if rows.is_empty() {
            return Err(ImportFlowError::EmptyFile);
        }

        self.candidates = rows
            .iter()
            .map(|raw| validator::validate_row(raw, self.schema, &self.directory, &self.existing))
            .collect();
        self.stage = ImportStage::Preview;
        self.touch();

        tracing::info!(
            "Session {}: parsed {} candidates ({} valid, {} invalid)",
            self.session_id,
            self.candidates.len(),
            self.valid_count(),
            self.invalid_count()
        );
        Ok(())
    }

    /// Replace one field, then re-run the full pipeline on that row.
    pub fn edit_field(
        &mut self,
        index: usize,
        field: CandidateField,
        value: &str,
    ) -> Result<(), ImportFlowError> {
        if self.stage != ImportStage::Preview {
            return Err(ImportFlowError::WrongStage(self.stage));
        }
        let candidate = self
            .candidates
            .get(index)
            .ok_or(ImportFlowError::RowOutOfRange(index))?;

        self.candidates[index] = validator::apply_edit(
            candidate,
            field,
            value,
            self.schema,
            &self.directory,
            &self.existing,
        );
        self.touch();
        Ok(())
    }

    /// Delete one row; later rows shift position but keep their state.
    pub fn remove_row(&mut self, index: usize) -> Result<(), ImportFlowError> {
        if self.stage != ImportStage::Preview {
            return Err(ImportFlowError::WrongStage(self.stage));
        }
        if index >= self.candidates.len() {
            return Err(ImportFlowError::RowOutOfRange(index));
        }
        self.candidates.remove(index);
        self.touch();
        Ok(())
    }

    /// Preview → Importing. Returns the batch token plus the
    /// point-in-time import set: the candidates that are valid and
    /// resolved right now. Candidates are never mutated again after
    /// this. Every recorder call must present the token, so a loop
    /// left over from before a reset or restart writes nothing.
    pub fn begin_import(&mut self) -> Result<(u64, Vec<ResidentCandidate>), ImportFlowError> {
        if self.stage != ImportStage::Preview {
            return Err(ImportFlowError::WrongStage(self.stage));
        }

        let import_set: Vec<ResidentCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.is_valid() && c.resolved_apartment_id.is_some())
            .cloned()
            .collect();

        if import_set.is_empty() {
            return Err(ImportFlowError::NoValidRows);
        }

        self.batch += 1;
        self.stage = ImportStage::Importing;
        self.progress = ImportProgress {
            current: 0,
            total: import_set.len(),
        };
        self.results = ImportResults::default();
        self.cancel_requested = false;
        self.touch();
        Ok((self.batch, import_set))
    }

    /// Whether the batch holding this token may attempt its next insert.
    pub fn run_active(&self, batch: u64) -> bool {
        self.stage == ImportStage::Importing && self.batch == batch && !self.cancel_requested
    }

    fn batch_live(&self, batch: u64) -> bool {
        self.stage == ImportStage::Importing && self.batch == batch
    }

    pub fn record_success(&mut self, batch: u64) {
        if !self.batch_live(batch) {
            return;
        }
        self.results.success_count += 1;
        self.progress.current += 1;
        self.touch();
    }

    pub fn record_failure(&mut self, batch: u64, candidate: ResidentCandidate, reason: String) {
        if !self.batch_live(batch) {
            return;
        }
        self.results.failed_count += 1;
        self.results.failures.push(RowFailure { candidate, reason });
        self.progress.current += 1;
        self.touch();
    }

    /// Cooperative cancellation: the import loop checks `run_active`
    /// before each insert. Rows already attempted keep their results.
    pub fn request_cancel(&mut self) {
        if self.stage == ImportStage::Importing {
            self.cancel_requested = true;
            self.touch();
        }
    }

    /// Importing → Done for the presenting batch: full success, partial
    /// failure and all-failed runs all land here. A stale batch cannot
    /// flip the stage of a session that moved on without it.
    pub fn finish_import(&mut self, batch: u64) {
        if self.batch_live(batch) {
            self.stage = ImportStage::Done;
            self.touch();
        }
    }

    /// Back to a fresh Upload with newly loaded reference data. Clears
    /// candidates, progress, results and the held file's rows.
    pub fn reset(&mut self, directory: UnitDirectory, existing: ExistingResidentIndex) {
        self.stage = ImportStage::Upload;
        self.candidates.clear();
        self.directory = directory;
        self.existing = existing;
        self.progress = ImportProgress::default();
        self.results = ImportResults::default();
        self.cancel_requested = false;
        self.touch();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            stage: self.stage,
            schema: self.schema,
            condominium_id: self.condominium_id.clone(),
            candidates: self.candidates.clone(),
            valid_count: self.valid_count(),
            invalid_count: self.invalid_count(),
            progress: self.progress,
            results: self.results.clone(),
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u501_import_residents::directory::{
        DirectoryApartment, DirectoryBlock,
    };
    use contracts::usecases::u501_import_residents::RowError;

    fn directory() -> UnitDirectory {
        UnitDirectory::new(
            vec![
                DirectoryBlock {
                    id: "b1".into(),
                    name: "BLOCO 1".into(),
                },
                DirectoryBlock {
                    id: "b2".into(),
                    name: "BLOCO 2".into(),
                },
            ],
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
                    id: "a201".into(),
                    block_id: "b2".into(),
                    number: "201".into(),
                },
            ],
        )
    }

    fn session_with(existing: ExistingResidentIndex) -> ImportSession {
        ImportSession::new(
            "s1".into(),
            "c1".into(),
            ImportSchema::Full,
            directory(),
            existing,
        )
    }

    const SCENARIO_FILE: &str = "\
block,apartment,name,email,phone,taxId,owner,responsible\n\
BLOCO 1,101,João da Silva,joao@email.com,11999990000,,sim,sim\n\
BLOCO 1,102,Maria Santos,maria@email.com,11988887777,,nao,sim\n\
BLOCO 9,201,Carlos Souza,carlos@email.com,11977776666,,sim,nao\n";

    #[test]
    fn scenario_a_wrong_block_invalidates_only_that_row() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        assert_eq!(session.stage(), ImportStage::Preview);
        let candidates = session.candidates();
        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].is_valid());
        assert!(candidates[1].is_valid());
        assert!(!candidates[2].is_valid());
        assert_eq!(candidates[2].errors, vec![RowError::UnitNotFound]);
        assert_eq!(session.valid_count(), 2);
        assert_eq!(session.invalid_count(), 1);
    }

    #[test]
    fn scenario_b_pre_existing_resident_flags_the_duplicate_row() {
        let existing =
            ExistingResidentIndex::new(vec![("a101".into(), "joao@email.com".into())]);
        let mut session = session_with(existing);
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        let candidates = session.candidates();
        assert_eq!(candidates[0].errors, vec![RowError::DuplicateResident]);
        assert!(!candidates[0].is_valid());
        assert!(candidates[1].is_valid());
        assert_eq!(candidates[2].errors, vec![RowError::UnitNotFound]);
    }

    #[test]
    fn header_only_file_reports_empty_and_stays_in_upload() {
        let mut session = session_with(ExistingResidentIndex::default());
        let result = session.load_file(
            "residents.csv",
            "block,apartment,name,email,phone,taxId,owner,responsible\n",
        );
        assert_eq!(result, Err(ImportFlowError::EmptyFile));
        assert_eq!(session.stage(), ImportStage::Upload);
        assert!(session.candidates().is_empty());
    }

    #[test]
    fn wrong_file_type_blocks_parsing() {
        let mut session = session_with(ExistingResidentIndex::default());
        let result = session.load_file("residents.pdf", SCENARIO_FILE);
        assert_eq!(result, Err(ImportFlowError::WrongFileType));
        assert_eq!(session.stage(), ImportStage::Upload);
    }

    #[test]
    fn editing_the_same_value_is_idempotent() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        let before = session.candidates()[0].clone();
        session
            .edit_field(0, CandidateField::Email, &before.email.clone())
            .unwrap();
        let after = &session.candidates()[0];
        assert_eq!(before.errors, after.errors);
        assert_eq!(before.resolved_apartment_id, after.resolved_apartment_id);
    }

    #[test]
    fn editing_a_row_revalidates_it_from_scratch() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        session.edit_field(2, CandidateField::Block, "BLOCO 2").unwrap();
        let fixed = &session.candidates()[2];
        assert!(fixed.is_valid());
        assert_eq!(fixed.resolved_apartment_id.as_deref(), Some("a201"));
        assert_eq!(session.valid_count(), 3);
    }

    #[test]
    fn removing_a_row_shifts_later_rows_without_changing_them() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        let third = session.candidates()[2].clone();
        session.remove_row(1).unwrap();
        assert_eq!(session.candidates().len(), 2);
        assert_eq!(session.candidates()[1].full_name, third.full_name);
        assert_eq!(session.candidates()[1].errors, third.errors);

        assert_eq!(
            session.remove_row(5),
            Err(ImportFlowError::RowOutOfRange(5))
        );
    }

    #[test]
    fn begin_import_takes_only_valid_resolved_rows() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();

        let (batch, set) = session.begin_import().unwrap();
        assert!(session.run_active(batch));
        assert_eq!(set.len(), 2);
        assert_eq!(session.stage(), ImportStage::Importing);
        assert_eq!(session.snapshot().progress.total, 2);
        assert_eq!(session.snapshot().progress.current, 0);
    }

    #[test]
    fn begin_import_refuses_when_nothing_is_valid() {
        let mut session = session_with(ExistingResidentIndex::default());
        session
            .load_file(
                "residents.csv",
                "block,apartment,name,email,phone,taxId,owner,responsible\n\
                 BLOCO 9,999,João da Silva,joao@email.com,,,,\n",
            )
            .unwrap();

        assert!(matches!(
            session.begin_import(),
            Err(ImportFlowError::NoValidRows)
        ));
        assert_eq!(session.stage(), ImportStage::Preview);
    }

    #[test]
    fn edits_are_rejected_outside_preview() {
        let mut session = session_with(ExistingResidentIndex::default());
        assert!(matches!(
            session.edit_field(0, CandidateField::Name, "x"),
            Err(ImportFlowError::WrongStage(ImportStage::Upload))
        ));

        session.load_file("residents.csv", SCENARIO_FILE).unwrap();
        session.begin_import().unwrap();
        assert!(matches!(
            session.edit_field(0, CandidateField::Name, "x"),
            Err(ImportFlowError::WrongStage(ImportStage::Importing))
        ));
    }

    #[test]
    fn full_run_lands_in_done_and_reset_returns_to_upload() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();
        let (batch, set) = session.begin_import().unwrap();

        session.record_success(batch);
        session.record_failure(batch, set[1].clone(), "email already registered".into());
        session.finish_import(batch);

        assert_eq!(session.stage(), ImportStage::Done);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.results.success_count, 1);
        assert_eq!(snapshot.results.failed_count, 1);
        assert_eq!(snapshot.progress.current, 2);

        session.reset(directory(), ExistingResidentIndex::default());
        assert_eq!(session.stage(), ImportStage::Upload);
        assert!(session.candidates().is_empty());
        assert_eq!(session.snapshot().results.success_count, 0);
        assert_eq!(session.snapshot().progress.total, 0);
    }

    #[test]
    fn stale_batch_recorders_are_ignored_after_reset() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();
        let (batch, set) = session.begin_import().unwrap();
        session.record_success(batch);

        session.reset(directory(), ExistingResidentIndex::default());
        assert!(!session.run_active(batch));

        session.record_success(batch);
        session.record_failure(batch, set[0].clone(), "email already registered".into());
        session.finish_import(batch);

        assert_eq!(session.stage(), ImportStage::Upload);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.results.success_count, 0);
        assert_eq!(snapshot.results.failed_count, 0);
        assert_eq!(snapshot.progress.current, 0);
    }

    #[test]
    fn stale_batch_recorders_cannot_touch_a_newer_run() {
        let mut session = session_with(ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();
        let (old_batch, _) = session.begin_import().unwrap();

        session.reset(directory(), ExistingResidentIndex::default());
        session.load_file("residents.csv", SCENARIO_FILE).unwrap();
        let (new_batch, _) = session.begin_import().unwrap();
        assert_ne!(old_batch, new_batch);

        session.record_success(old_batch);
        session.finish_import(old_batch);
        assert_eq!(session.stage(), ImportStage::Importing);
        assert_eq!(session.snapshot().results.success_count, 0);

        session.record_success(new_batch);
        assert_eq!(session.snapshot().results.success_count, 1);
    }
}

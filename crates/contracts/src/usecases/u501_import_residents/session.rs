use super::candidate::ResidentCandidate;
use super::schema::ImportSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of one import dialog session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    /// No candidates yet; waiting for a file
    Upload,
    /// Candidate list shown; user may edit or remove rows
    Preview,
    /// Sequential inserts running
    Importing,
    /// All rows attempted; results final
    Done,
}

/// Rows attempted so far vs. the size of the import set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
}

/// One row that the backend refused during the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub candidate: ResidentCandidate,
    /// Normalized, human-readable classification of the raw failure
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResults {
    #[serde(rename = "successCount")]
    pub success_count: usize,
    #[serde(rename = "failedCount")]
    pub failed_count: usize,
    pub failures: Vec<RowFailure>,
}

/// Lightweight view for progress polling during the Importing stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub stage: ImportStage,
    pub progress: ImportProgress,
    pub results: ImportResults,
}

/// Full view of a session, served to the import dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub stage: ImportStage,
    pub schema: ImportSchema,
    #[serde(rename = "condominiumId")]
    pub condominium_id: String,
    pub candidates: Vec<ResidentCandidate>,
    #[serde(rename = "validCount")]
    pub valid_count: usize,
    #[serde(rename = "invalidCount")]
    pub invalid_count: usize,
    pub progress: ImportProgress,
    pub results: ImportResults,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

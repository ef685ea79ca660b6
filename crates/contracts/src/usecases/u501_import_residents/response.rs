use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStartStatus {
    Started,
    Refused,
}

/// Returned by the start endpoint; `Refused` carries the reason why the
/// transition did not happen (e.g. no valid rows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartImportResponse {
    pub status: ImportStartStatus,
    pub message: String,
}

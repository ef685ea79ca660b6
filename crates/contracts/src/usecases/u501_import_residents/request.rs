use super::candidate::CandidateField;
use super::schema::ImportSchema;
use serde::{Deserialize, Serialize};

/// POST /api/u501/import/session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(rename = "condominiumId")]
    pub condominium_id: String,
    pub schema: ImportSchema,
}

/// POST /api/u501/import/:session_id/upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// Full file contents, UTF-8 text
    pub content: String,
}

/// POST /api/u501/import/:session_id/edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFieldRequest {
    pub index: usize,
    pub field: CandidateField,
    pub value: String,
}

/// POST /api/u501/import/:session_id/remove
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveRowRequest {
    pub index: usize,
}

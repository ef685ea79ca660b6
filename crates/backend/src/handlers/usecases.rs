use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use uuid::Uuid;

use contracts::usecases::u501_import_residents::request::{
    CreateSessionRequest, EditFieldRequest, RemoveRowRequest, UploadFileRequest,
};
use contracts::usecases::u501_import_residents::response::{
    CreateSessionResponse, StartImportResponse,
};
use contracts::usecases::u501_import_residents::{
    ImportSchema, ProgressSnapshot, SessionSnapshot,
};

use crate::domain::a001_condominium;
use crate::usecases::u501_import_residents::directory::{ExistingResidentIndex, UnitDirectory};
use crate::usecases::u501_import_residents::session::{ImportFlowError, ImportSession};
use crate::usecases::u501_import_residents::{template, ImportExecutor, SessionStore};

// ============================================================================
// UseCase u501: Bulk resident import
// ============================================================================

static SESSION_STORE: Lazy<SessionStore> = Lazy::new(SessionStore::new);

static IMPORT_EXECUTOR: Lazy<ImportExecutor> =
    Lazy::new(|| ImportExecutor::new(SESSION_STORE.clone()));

fn flow_error_response(e: ImportFlowError) -> (StatusCode, String) {
    let status = match e {
        ImportFlowError::WrongFileType | ImportFlowError::RowOutOfRange(_) => {
            StatusCode::BAD_REQUEST
        }
        ImportFlowError::EmptyFile | ImportFlowError::NoValidRows => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ImportFlowError::WrongStage(_) => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

/// POST /api/u501/import/session
///
/// Opens a session and loads the reference data (unit directory,
/// existing residents) it will validate against.
pub async fn u501_create_session(
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, (StatusCode, String)> {
    let directory = UnitDirectory::load(&request.condominium_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load unit directory: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    if directory.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "condominium has no registered units".to_string(),
        ));
    }
    let existing = ExistingResidentIndex::load(&directory).await.map_err(|e| {
        tracing::error!("Failed to load resident index: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let session_id = Uuid::new_v4().to_string();
    SESSION_STORE.insert(ImportSession::new(
        session_id.clone(),
        request.condominium_id,
        request.schema,
        directory,
        existing,
    ));

    tracing::info!("Import session {} created", session_id);
    Ok(Json(CreateSessionResponse { session_id }))
}

/// GET /api/u501/import/:session_id
pub async fn u501_get_snapshot(
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, StatusCode> {
    match SESSION_STORE.snapshot(&session_id) {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /api/u501/import/:session_id/upload
pub async fn u501_upload_file(
    Path(session_id): Path<String>,
    Json(request): Json<UploadFileRequest>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let result = SESSION_STORE
        .with_session(&session_id, |s| {
            s.load_file(&request.file_name, &request.content)
        })
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))?;

    result.map_err(flow_error_response)?;
    let snapshot = snapshot_or_gone(&session_id)?;
    for candidate in snapshot.0.candidates.iter().filter(|c| !c.is_valid()) {
        tracing::warn!(
            "Session {}: line {} invalid: {}",
            session_id,
            candidate.line,
            candidate.error_messages().join(", ")
        );
    }
    Ok(snapshot)
}

/// POST /api/u501/import/:session_id/edit
pub async fn u501_edit_field(
    Path(session_id): Path<String>,
    Json(request): Json<EditFieldRequest>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let result = SESSION_STORE
        .with_session(&session_id, |s| {
            s.edit_field(request.index, request.field, &request.value)
        })
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))?;

    result.map_err(flow_error_response)?;
    snapshot_or_gone(&session_id)
}

/// POST /api/u501/import/:session_id/remove
pub async fn u501_remove_row(
    Path(session_id): Path<String>,
    Json(request): Json<RemoveRowRequest>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let result = SESSION_STORE
        .with_session(&session_id, |s| s.remove_row(request.index))
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))?;

    result.map_err(flow_error_response)?;
    snapshot_or_gone(&session_id)
}

/// POST /api/u501/import/:session_id/start
///
/// A refused start (wrong stage, nothing valid) is a 200 with a
/// `refused` payload so the dialog can show the reason in place.
pub async fn u501_start_import(
    Path(session_id): Path<String>,
) -> Result<Json<StartImportResponse>, StatusCode> {
    match IMPORT_EXECUTOR.start_import(&session_id).await {
        Some(response) => Ok(Json(response)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /api/u501/import/:session_id/cancel
pub async fn u501_cancel_import(Path(session_id): Path<String>) -> StatusCode {
    match SESSION_STORE.with_session(&session_id, |s| s.request_cancel()) {
        Some(()) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

/// POST /api/u501/import/:session_id/reset
///
/// Reference data is reloaded so a rerun validates against the rows the
/// finished batch just inserted.
pub async fn u501_reset_session(
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let condominium_id = SESSION_STORE
        .snapshot(&session_id)
        .map(|s| s.condominium_id)
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))?;

    let directory = UnitDirectory::load(&condominium_id).await.map_err(|e| {
        tracing::error!("Failed to reload unit directory: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let existing = ExistingResidentIndex::load(&directory).await.map_err(|e| {
        tracing::error!("Failed to reload resident index: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    SESSION_STORE
        .with_session(&session_id, |s| s.reset(directory, existing))
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))?;
    snapshot_or_gone(&session_id)
}

/// GET /api/u501/import/:session_id/progress
pub async fn u501_get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<ProgressSnapshot>, StatusCode> {
    match SESSION_STORE.progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub schema: Option<ImportSchema>,
}

/// GET /api/u501/template/:condominium_id?schema=full|reduced
pub async fn u501_download_template(
    Path(condominium_id): Path<String>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let uuid = Uuid::parse_str(&condominium_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let condominium = match a001_condominium::service::get_by_id(uuid).await {
        Ok(Some(v)) => v,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let schema = query.schema.unwrap_or(ImportSchema::Full);
    let file_name = template::template_file_name(&condominium.base.description);
    let body = template::template_content(schema);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}

fn snapshot_or_gone(session_id: &str) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    SESSION_STORE
        .snapshot(session_id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "session not found".to_string()))
}

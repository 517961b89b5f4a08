use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, StructuralError};
use crate::models::ModelEdit;
use crate::registry::{CreateSessionInput, SessionRegistry, SessionResponse, ToggleInput};

// ============================================================
// Error Handling
// ============================================================

/// Map an engine error to a response.
///
/// Every engine error is caused by the request (unknown session or feature,
/// refused toggle or edit, unreadable model), so the message is safe to expose.
fn error_response(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::SessionNotFound(_) | Error::Structural(StructuralError::UnknownFeature(_)) => {
            StatusCode::NOT_FOUND
        }
        Error::Structural(_) | Error::Format(_) => StatusCode::BAD_REQUEST,
        Error::Rejected(_) => StatusCode::CONFLICT,
        Error::Count(_) | Error::AppliedUncounted(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::warn!("Request refused ({}): {}", status, e);
    (status, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Sessions
// ============================================================

pub async fn list_sessions(
    State(registry): State<SessionRegistry>,
) -> Result<Json<Vec<SessionResponse>>, (StatusCode, String)> {
    registry.list_sessions().map(Json).map_err(error_response)
}

pub async fn create_session(
    State(registry): State<SessionRegistry>,
    Json(input): Json<CreateSessionInput>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, String)> {
    registry
        .create_session(input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(error_response)
}

pub async fn get_session(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    registry.get_session(id).map(Json).map_err(error_response)
}

pub async fn close_session(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if registry.close_session(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Session not found".to_string()))
    }
}

pub async fn toggle_feature(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
    Json(input): Json<ToggleInput>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    registry.toggle(id, input).map(Json).map_err(error_response)
}

// ============================================================
// Model
// ============================================================

pub async fn edit_model(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
    Json(edit): Json<ModelEdit>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    registry.edit_model(id, edit).map(Json).map_err(error_response)
}

pub async fn export_model(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let document = registry.export_model(id).map_err(error_response)?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], document))
}

// ============================================================
// Exports
// ============================================================

pub async fn export_configuration(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let document = registry.export_configuration(id).map_err(error_response)?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], document))
}

pub async fn export_feature_list(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<String, (StatusCode, String)> {
    registry.export_feature_list(id).map_err(error_response)
}

pub async fn render_tree(
    State(registry): State<SessionRegistry>,
    Path(id): Path<Uuid>,
) -> Result<String, (StatusCode, String)> {
    registry.render(id).map_err(error_response)
}

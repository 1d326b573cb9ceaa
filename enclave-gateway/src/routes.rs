//! Axum route handlers for the workspace API.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use enclave_core::{DaemonId, WorkspaceItem, WorkspaceStoreStatus};
use enclave_store::WorkspaceStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{error::GatewayError, upload::collect_files};

// ── Shared state ─────────────────────────────────────────────────────────────

type Store = Arc<dyn WorkspaceStore>;

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router over the given workspace store.
///
/// `max_upload_bytes` caps the size of any request body.
pub fn create_router(store: Store, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/workspaces",
            get(list_workspaces).delete(clear_workspaces).post(create_workspace),
        )
        .route(
            "/workspaces/{id}",
            get(get_workspace).delete(delete_workspace).put(update_workspace),
        )
        .route("/health", get(health))
        .with_state(store)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn parse_id(raw: &str) -> Result<DaemonId, GatewayError> {
    raw.parse::<DaemonId>()
        .map_err(|e| GatewayError::Validation(e.to_string()))
}

fn require_multipart(multipart: Result<Multipart, MultipartRejection>) -> Result<Multipart, GatewayError> {
    multipart.map_err(|e| GatewayError::Validation(e.body_text()))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// `GET /workspaces` — status of every workspace.
pub async fn list_workspaces(State(store): State<Store>) -> Json<WorkspaceStoreStatus> {
    Json(store.status().await)
}

/// `DELETE /workspaces` — delete every workspace.
///
/// # Errors
/// Returns [`GatewayError::Store`] if any deletion fails.
pub async fn clear_workspaces(State(store): State<Store>) -> Result<StatusCode, GatewayError> {
    store.clear().await?;
    Ok(StatusCode::OK)
}

/// `DELETE /workspaces/{id}` — delete one workspace and its files.
///
/// # Errors
/// Returns [`GatewayError::Validation`] for a malformed ID and
/// [`GatewayError::WorkspaceNotFound`] if the ID is not registered.
pub async fn delete_workspace(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    let id = parse_id(&id)?;
    store.delete(&id, true).await.map_err(GatewayError::from_lookup)?;
    Ok(StatusCode::OK)
}

/// `POST /workspaces` — create a workspace from uploaded files.
///
/// Returns the new workspace ID, which is later used to create Pea/Pod/Flow.
///
/// # Errors
/// Returns [`GatewayError::Validation`] if no `files` part is present and
/// [`GatewayError::Runtime`] for anything the store rejects.
pub async fn create_workspace(
    State(store): State<Store>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let files = collect_files(require_multipart(multipart)?).await?;
    let id = store.add(files).await.map_err(|e| GatewayError::from_upload(&e))?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// `PUT /workspaces/{id}` — add or replace files in a workspace.
///
/// # Errors
/// Returns [`GatewayError::Validation`] for a malformed ID or missing
/// `files` part and [`GatewayError::Runtime`] for anything the store
/// rejects, an unknown ID included.
pub async fn update_workspace(
    State(store): State<Store>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_id(&id)?;
    let files = collect_files(require_multipart(multipart)?).await?;
    let id = store
        .update(&id, files)
        .await
        .map_err(|e| GatewayError::from_upload(&e))?;
    Ok((StatusCode::OK, Json(id)))
}

/// `GET /workspaces/{id}` — status of one workspace.
///
/// # Errors
/// Returns [`GatewayError::Validation`] for a malformed ID and
/// [`GatewayError::WorkspaceNotFound`] if the ID is not registered.
pub async fn get_workspace(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<Json<WorkspaceItem>, GatewayError> {
    let id = parse_id(&id)?;
    let item = store.get(&id).await.map_err(GatewayError::from_lookup)?;
    Ok(Json(item))
}

//! Error types for the gateway crate.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use enclave_core::DaemonId;
use enclave_store::StoreError;
use serde_json::json;

/// Errors that can occur during gateway request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The requested workspace ID does not exist in the store.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(DaemonId),

    /// The store rejected a create or update request.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A path parameter or form part failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The multipart body could not be read.
    #[error("invalid upload: {0}")]
    Upload(#[from] MultipartError),

    /// An unexpected error propagated from the store layer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The gateway configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Map a store error from a lookup-style call: unknown IDs become 404,
    /// anything else stays a store error.
    #[must_use]
    pub fn from_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::WorkspaceNotFound(id),
            other => Self::Store(other),
        }
    }

    /// Map a store error from a create/update call: every failure is a 400.
    #[must_use]
    pub fn from_upload(err: &StoreError) -> Self {
        Self::Runtime(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::WorkspaceNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Runtime(_) => StatusCode::BAD_REQUEST,
            GatewayError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Upload(e) => e.status(),
            GatewayError::Store(_) | GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn gateway_error_status_codes_map_correctly() {
        let not_found = GatewayError::WorkspaceNotFound(DaemonId::workspace());
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let runtime = GatewayError::Runtime("upload contains no files".to_owned());
        assert_eq!(runtime.into_response().status(), StatusCode::BAD_REQUEST);

        let invalid = GatewayError::Validation("bad id".to_owned());
        assert_eq!(invalid.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn gateway_error_store_variant_returns_500() {
        let io = std::io::Error::other("disk gone");
        let gw_err = GatewayError::Store(StoreError::Io(io));
        assert_eq!(
            gw_err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "Store errors must map to 500"
        );
    }

    #[test]
    fn from_lookup_maps_not_found_to_404_variant() {
        let id = DaemonId::workspace();
        assert!(matches!(
            GatewayError::from_lookup(StoreError::NotFound(id)),
            GatewayError::WorkspaceNotFound(found) if found == id
        ));
        assert!(matches!(
            GatewayError::from_lookup(StoreError::EmptyUpload),
            GatewayError::Store(_)
        ));
    }

    #[test]
    fn from_upload_maps_not_found_to_400_variant() {
        let err = GatewayError::from_upload(&StoreError::NotFound(DaemonId::workspace()));
        assert!(matches!(err, GatewayError::Runtime(_)), "update on an unknown id is a 400");
    }

    #[test]
    fn gateway_error_display_includes_id() {
        let id = DaemonId::workspace();
        let msg = GatewayError::WorkspaceNotFound(id).to_string();
        assert!(msg.contains(&id.to_string()), "Display must include the workspace id");
    }
}

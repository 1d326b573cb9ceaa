//! Multipart upload extraction.

use axum::extract::Multipart;
use enclave_core::UploadedFile;

use crate::error::GatewayError;

/// Name of the form part carrying workspace files.
pub const FILES_FIELD: &str = "files";

/// Collect every `files` part of a multipart body.
///
/// Parts with other names are skipped. A part without a file name falls
/// back to its part name.
///
/// # Errors
/// Returns [`GatewayError::Upload`] if the body is malformed or too large,
/// or [`GatewayError::Validation`] if no `files` part is present.
pub async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, GatewayError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .or_else(|| field.name())
            .unwrap_or_default()
            .to_owned();
        let content = field.bytes().await?;
        files.push(UploadedFile::new(file_name, content.to_vec()));
    }
    if files.is_empty() {
        return Err(GatewayError::Validation(format!("form part '{FILES_FIELD}' is required")));
    }
    Ok(files)
}

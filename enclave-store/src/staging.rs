//! Writing uploaded files into a workspace directory.

use std::path::{Path, PathBuf};

use enclave_core::UploadedFile;

use crate::StoreError;

/// Stage `files` under `workdir`, overwriting files with the same name.
///
/// Every name is validated before anything is written, so a rejected
/// upload leaves the workdir untouched. Returns the normalized names.
///
/// # Errors
/// Returns [`StoreError::EmptyUpload`] if `files` is empty,
/// [`StoreError::InvalidUpload`] if any name is unsafe, or
/// [`StoreError::Io`] if writing fails.
pub async fn stage_files(workdir: &Path, files: &[UploadedFile]) -> Result<Vec<String>, StoreError> {
    if files.is_empty() {
        return Err(StoreError::EmptyUpload);
    }
    let targets = files
        .iter()
        .map(UploadedFile::relative_path)
        .collect::<Result<Vec<PathBuf>, _>>()?;

    tokio::fs::create_dir_all(workdir).await?;
    let mut names = Vec::with_capacity(files.len());
    for (relative, file) in targets.iter().zip(files) {
        let dest = workdir.join(relative);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &file.content).await?;
        names.push(display_name(relative));
    }
    Ok(names)
}

/// Render a relative path with `/` separators.
pub(crate) fn display_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

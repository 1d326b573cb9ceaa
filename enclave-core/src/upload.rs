//! Uploaded file payloads and file-name validation.

use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;

/// One file received from a client, not yet staged to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct UploadedFile {
    /// Relative path inside the workspace, e.g. `"config.yml"` or `"src/app.py"`.
    pub file_name: String,
    /// Raw file bytes.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload from a name and its bytes.
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { file_name: file_name.into(), content: content.into() }
    }

    /// Validates the file name and returns it as a relative path.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidFileName`] if the name is empty, absolute,
    /// contains `..`, a backslash or a NUL byte.
    pub fn relative_path(&self) -> Result<PathBuf, CoreError> {
        validate_file_name(&self.file_name)
    }
}

/// Checks that `name` stays inside the directory it is joined onto.
///
/// # Errors
/// Returns [`CoreError::InvalidFileName`] describing the first violation found.
pub fn validate_file_name(name: &str) -> Result<PathBuf, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidFileName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('\0') {
        return Err(invalid("name contains a NUL byte"));
    }
    if name.contains('\\') {
        return Err(invalid("name contains a backslash"));
    }

    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("name escapes the workspace via '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("name must be a relative path"));
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(invalid("name has no file component"));
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_nested_names_are_accepted() {
        for (name, expected) in [
            ("requirements.txt", "requirements.txt"),
            ("src/app.py", "src/app.py"),
            ("./flow.yml", "flow.yml"),
        ] {
            match validate_file_name(name) {
                Ok(path) => assert_eq!(path, PathBuf::from(expected)),
                Err(e) => panic!("'{name}' should be valid: {e}"),
            }
        }
    }

    #[test]
    fn escaping_names_are_rejected() {
        for name in ["", "/etc/passwd", "../secret", "a/../../b", "a\\b", "a\0b", ".", "./"] {
            assert!(
                matches!(validate_file_name(name), Err(CoreError::InvalidFileName { .. })),
                "'{name}' must be rejected"
            );
        }
    }

    #[test]
    fn uploaded_file_relative_path_uses_file_name() {
        let file = UploadedFile::new("pkg/mod.py", b"print(1)".to_vec());
        match file.relative_path() {
            Ok(path) => assert_eq!(path, PathBuf::from("pkg/mod.py")),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    proptest::proptest! {
        #[test]
        fn proptest_accepted_names_never_escape(name in "[a-z./]{0,24}") {
            if let Ok(path) = validate_file_name(&name) {
                proptest::prop_assert!(path.is_relative());
                proptest::prop_assert!(
                    path.components().all(|c| matches!(c, Component::Normal(_))),
                    "validated path must only contain normal components"
                );
            }
        }
    }
}

//! Fuzz target: upload file-name validation.
//!
//! Any name accepted by the validator must stay inside the workspace.

#![no_main]

use std::path::Component;

use enclave_core::validate_file_name;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let name = String::from_utf8_lossy(data);
    if let Ok(path) = validate_file_name(&name) {
        assert!(path.is_relative(), "accepted path must be relative: {name:?}");
        assert!(
            path.components().all(|c| matches!(c, Component::Normal(_))),
            "accepted path must not contain '..' or root components: {name:?}"
        );
    }
});

//! Fuzz target: `ContentHash` hex parsing and serialization.
//!
//! Arbitrary strings fed to the hex parser must never panic, and any
//! 32-byte input must survive a JSON round-trip.

#![no_main]

use enclave_core::ContentHash;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = s.parse::<ContentHash>();
    }

    if data.len() != 32 {
        return;
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(data);
    let hash = ContentHash::new(bytes);

    let hex = hash.to_string();
    assert_eq!(hex.len(), 64, "ContentHash Display must produce 64 hex chars");

    let json = serde_json::to_string(&hash).expect("ContentHash serialization must not fail");
    let back: ContentHash =
        serde_json::from_str(&json).expect("ContentHash deserialization must not fail");
    assert_eq!(back, hash);
});

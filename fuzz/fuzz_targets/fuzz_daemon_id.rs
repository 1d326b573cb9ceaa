//! Fuzz target: `DaemonId` parsing from path parameters.
//!
//! Arbitrary strings must either be rejected or parse into an ID whose
//! Display form parses back to the same ID.

#![no_main]

use enclave_core::DaemonId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(id) = s.parse::<DaemonId>() {
        let again: DaemonId = id
            .to_string()
            .parse()
            .expect("Display output of a parsed DaemonId must parse");
        assert_eq!(again, id);

        let json = serde_json::to_string(&id).expect("DaemonId serialization must not fail");
        let _: DaemonId = serde_json::from_str(&json).expect("DaemonId deserialization must not fail");
    }
});

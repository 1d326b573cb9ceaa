use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;

/// The kind of object a [`DaemonId`] refers to.
///
/// Rendered as the `j<kind>` prefix of the ID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum IdKind {
    Pea,
    Pod,
    Flow,
    Workspace,
    Network,
    Container,
}

impl IdKind {
    /// Every kind, in prefix-matching order.
    pub const ALL: [IdKind; 6] = [
        IdKind::Pea,
        IdKind::Pod,
        IdKind::Flow,
        IdKind::Workspace,
        IdKind::Network,
        IdKind::Container,
    ];

    /// The `j`-prefixed tag used in the string form, e.g. `"jworkspace"`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            IdKind::Pea => "jpea",
            IdKind::Pod => "jpod",
            IdKind::Flow => "jflow",
            IdKind::Workspace => "jworkspace",
            IdKind::Network => "jnetwork",
            IdKind::Container => "jcontainer",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Opaque identifier for an object managed by the daemon.
///
/// String form: `j<kind>-<uuid>`, e.g.
/// `jworkspace-2b0e9a54-6c38-4a5e-9f52-0d8c3e6b1f7a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub struct DaemonId {
    kind: IdKind,
    uuid: Uuid,
}

impl DaemonId {
    /// Creates a new random `DaemonId` of the given kind.
    #[must_use]
    pub fn new(kind: IdKind) -> Self {
        Self { kind, uuid: Uuid::new_v4() }
    }

    /// Creates a new random workspace ID.
    #[must_use]
    pub fn workspace() -> Self {
        Self::new(IdKind::Workspace)
    }

    /// Builds an ID from its parts.
    #[must_use]
    pub fn from_parts(kind: IdKind, uuid: Uuid) -> Self {
        Self { kind, uuid }
    }

    #[must_use]
    pub fn kind(&self) -> IdKind {
        self.kind
    }

    /// Returns the inner `Uuid`.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.tag(), self.uuid)
    }
}

impl FromStr for DaemonId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidDaemonId {
            value: s.to_owned(),
            reason: reason.to_owned(),
        };

        let (tag, rest) = s.split_once('-').ok_or_else(|| invalid("missing '-' separator"))?;
        let kind = IdKind::from_tag(tag).ok_or_else(|| invalid("unknown kind prefix"))?;
        // Only the hyphenated form is accepted so Display round-trips.
        if rest.len() != 36 {
            return Err(invalid("expected a hyphenated UUID after the prefix"));
        }
        let uuid = Uuid::parse_str(rest).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self { kind, uuid })
    }
}

impl Serialize for DaemonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DaemonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A SHA-256 content hash over a staged workspace tree.
///
/// Serialized as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Creates a `ContentHash` from a raw 32-byte array.
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("expected 64 hex characters, got '{s}'"));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|e| format!("invalid hex '{pair}': {e}"))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_id_display_uses_kind_prefix() {
        let id = DaemonId::workspace();
        let s = id.to_string();
        assert!(s.starts_with("jworkspace-"), "unexpected id format: {s}");
        assert_eq!(s.len(), "jworkspace-".len() + 36);
    }

    #[test]
    fn daemon_id_parses_its_own_display() {
        let id = DaemonId::new(IdKind::Flow);
        let parsed: DaemonId = match id.to_string().parse() {
            Ok(p) => p,
            Err(e) => panic!("failed to parse: {e}"),
        };
        assert_eq!(parsed, id);
        assert_eq!(parsed.kind(), IdKind::Flow);
    }

    #[test]
    fn daemon_id_rejects_malformed_values() {
        for bad in [
            "",
            "jworkspace",
            "workspace-2b0e9a54-6c38-4a5e-9f52-0d8c3e6b1f7a",
            "jthing-2b0e9a54-6c38-4a5e-9f52-0d8c3e6b1f7a",
            "jworkspace-not-a-uuid",
            "jworkspace-2b0e9a546c384a5e9f520d8c3e6b1f7a",
            "jworkspace-2b0e9a54-6c38-4a5e-9f52-0d8c3e6b1f7z",
        ] {
            assert!(
                matches!(bad.parse::<DaemonId>(), Err(CoreError::InvalidDaemonId { .. })),
                "'{bad}' must be rejected"
            );
        }
    }

    #[test]
    fn daemon_id_serializes_as_plain_string() {
        let id = DaemonId::from_parts(IdKind::Workspace, Uuid::nil());
        let json = match serde_json::to_string(&id) {
            Ok(s) => s,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(json, "\"jworkspace-00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn content_hash_display_shows_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xde;
        bytes[1] = 0xad;
        bytes[31] = 0xff;
        let hash = ContentHash::new(bytes);
        let s = hash.to_string();
        assert!(s.starts_with("dead"), "expected hex starting with 'dead', got {s}");
        assert!(s.ends_with("ff"), "expected hex ending with 'ff', got {s}");
        assert_eq!(s.len(), 64, "SHA-256 hex must be 64 chars");
    }

    #[test]
    fn content_hash_parses_hex_back() {
        let hash = ContentHash::new([0xab_u8; 32]);
        let parsed: ContentHash = match hash.to_string().parse() {
            Ok(h) => h,
            Err(e) => panic!("failed to parse: {e}"),
        };
        assert_eq!(parsed.as_bytes(), hash.as_bytes());
        assert!("abc".parse::<ContentHash>().is_err(), "short input must be rejected");
    }

    proptest::proptest! {
        #[test]
        fn proptest_daemon_id_parse_never_panics(s in "\\PC{0,64}") {
            let _ = s.parse::<DaemonId>();
        }

        #[test]
        fn proptest_daemon_id_accepts_any_uuid(bytes in proptest::prelude::any::<[u8; 16]>()) {
            let id = DaemonId::from_parts(IdKind::Workspace, Uuid::from_bytes(bytes));
            let parsed = id.to_string().parse::<DaemonId>();
            proptest::prop_assert!(parsed.is_ok(), "display output must parse");
        }
    }
}

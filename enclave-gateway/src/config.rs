//! Gateway configuration read from the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::GatewayError;

pub const LISTEN_ADDR_VAR: &str = "ENCLAVE_LISTEN_ADDR";
pub const WORKSPACE_ROOT_VAR: &str = "ENCLAVE_WORKSPACE_ROOT";
pub const MAX_UPLOAD_BYTES_VAR: &str = "ENCLAVE_MAX_UPLOAD_BYTES";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Runtime settings for the gateway binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Socket address the HTTP server binds to.
    pub listen_addr: SocketAddr,
    /// Directory where workspaces are staged.
    pub workspace_root: PathBuf,
    /// Upper bound on a single request body, in bytes.
    pub max_upload_bytes: usize,
}

impl GatewayConfig {
    /// Read the configuration from environment variables, applying defaults.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GatewayError> {
        let listen_addr = lookup(LISTEN_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned())
            .parse::<SocketAddr>()
            .map_err(|e| GatewayError::Config(format!("{LISTEN_ADDR_VAR}: {e}")))?;

        let workspace_root = lookup(WORKSPACE_ROOT_VAR)
            .map_or_else(|| std::env::temp_dir().join("enclave-workspaces"), PathBuf::from);

        let max_upload_bytes = match lookup(MAX_UPLOAD_BYTES_VAR) {
            None => DEFAULT_MAX_UPLOAD_BYTES,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(GatewayError::Config(format!("{MAX_UPLOAD_BYTES_VAR} must be positive")));
                }
                Ok(n) => n,
                Err(e) => return Err(GatewayError::Config(format!("{MAX_UPLOAD_BYTES_VAR}: {e}"))),
            },
        };

        Ok(Self { listen_addr, workspace_root, max_upload_bytes })
    }
}

/// Errors produced by the `enclave-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A string could not be parsed as a `DaemonId`.
    #[error("invalid daemon id '{value}': {reason}")]
    InvalidDaemonId { value: String, reason: String },

    /// An uploaded file name is unsafe to stage inside a workspace.
    #[error("invalid file name '{name}': {reason}")]
    InvalidFileName { name: String, reason: String },
}

//! Errors raised while saving, loading or resuming an iterator checkpoint.

use thiserror::Error;

/// Why a checkpoint could not be written or accepted.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint could not be encoded as JSON or bincode
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The input is not a well-formed checkpoint
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// The checkpoint was written by an incompatible format version
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Snapshot keys, counter mirrors or collector settings are inconsistent
    #[error("Checkpoint validation failed: {0}")]
    ValidationFailed(String),
}

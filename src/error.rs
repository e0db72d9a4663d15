//! Error taxonomy for the vector-set processing engine.
//!
//! Every fallible operation in this crate returns `Result<_, AmvpError>`.
//! Variants mirror the error codes an AMVP client surfaces externally
//! (spec §6, §7): each is a distinct kind so callers can match on it rather
//! than parse a message string.

use thiserror::Error;

/// The crate-wide error type.
#[derive(Debug, Error)]
pub enum AmvpError {
    /// Structurally invalid JSON, or missing a required wrapper field
    /// (`algorithm`, `testGroups`, `tgId`, `tcId`, ...).
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// A per-family required field was absent.
    #[error("missing required field `{field}`")]
    MissingArg {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field was present but outside the allowed enum/range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidArg {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// The server requested a value the capability was not registered for
    /// (e.g. `l = 4096` when the capability only registered `l = 2048`).
    #[error("server requested unregistered value for `{field}`: {reason}")]
    TcInvalidData {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// No capability is registered for the requested algorithm/mode.
    #[error("no capability registered for {0}")]
    NoCap(String),

    /// The requested operation is not supported by this engine.
    #[error("unsupported operation: {0}")]
    UnsupportedOp(String),

    /// The operator's crypto callback returned a non-zero/failure result.
    #[error("crypto module callback failed: {0}")]
    CryptoModuleFail(String),

    /// An allocation failure, or an input so large it would cause one.
    #[error("allocation failure: {0}")]
    MallocFail(String),

    /// Re-registration of an algorithm that is already enabled.
    #[error("algorithm already registered: {0}")]
    Duplicate(String),
}

impl AmvpError {
    /// Shorthand for [`AmvpError::InvalidArg`].
    pub fn invalid_arg(field: &'static str, reason: impl Into<String>) -> Self {
        AmvpError::InvalidArg { field, reason: reason.into() }
    }

    /// Shorthand for [`AmvpError::MissingArg`].
    pub fn missing_arg(field: &'static str) -> Self {
        AmvpError::MissingArg { field }
    }

    /// Shorthand for [`AmvpError::TcInvalidData`].
    pub fn tc_invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AmvpError::TcInvalidData { field, reason: reason.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AmvpError>;

//! Error types for configuration loading and the relay wire format.
//!
//! The simulation itself never fails: bad per-entity data is clamped or skipped.
//! Errors only surface at the edges, where settings files and network payloads
//! enter the crate.

use thiserror::Error;

/// Settings could not be loaded or failed validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings JSON was malformed
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is outside its usable range
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// A relay message could not be accepted at the transport boundary
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Payload was not a known event or had the wrong shape
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A coordinate or delta was NaN or infinite
    #[error("non-finite value in `{field}`")]
    NonFinite { field: &'static str },
}

//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

use clusterjoin_core::DecodeError;

/// Command line usage error (sysexits `EX_USAGE`).
pub const USAGE: u8 = 64;
/// Input data was malformed (sysexits `EX_DATAERR`).
pub const DATA_ERROR: u8 = 65;
/// Input file could not be read (sysexits `EX_NOINPUT`).
pub const NO_INPUT: u8 = 66;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("no CERTIFICATE block found")]
    NoCertificate,

    #[error("invalid certificate: {0}")]
    Certificate(String),

    #[error("fingerprint must be 64 lowercase hex characters")]
    InvalidFingerprint,

    #[error("API key must not be empty")]
    EmptyApiKey,

    #[error("invalid cluster address; expected host:port")]
    InvalidAddress,

    #[error("invalid enrollment token: {0}")]
    InvalidToken(#[from] DecodeError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Read { .. } => NO_INPUT,
            Self::InvalidFingerprint | Self::EmptyApiKey | Self::InvalidAddress => USAGE,
            Self::Pem(_) | Self::NoCertificate | Self::Certificate(_) | Self::InvalidToken(_) => {
                DATA_ERROR
            }
        }
    }
}

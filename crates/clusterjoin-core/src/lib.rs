//! clusterjoin Core Types
//!
//! This crate contains the enrollment token and its codec, with no
//! dependencies on:
//! - Network/TLS
//! - Filesystem
//! - Runtime specifics
//!
//! A token produced by an existing cluster member is everything a fresh
//! node needs to find the cluster, authenticate it, and authenticate itself.

pub mod error;
pub mod ids;
pub mod token;

// Re-export commonly used types
pub use error::{DecodeError, DecodeErrorKind, TokenField};
pub use ids::{ApiKey, Fingerprint};
pub use token::EnrollmentToken;

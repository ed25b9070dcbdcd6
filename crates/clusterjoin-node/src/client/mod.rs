//! Enrollment against an existing cluster.

mod bootstrap;
mod http;
mod tls;

use async_trait::async_trait;
use semver::Version;
use thiserror::Error;

use clusterjoin_core::EnrollmentToken;

pub use bootstrap::{AutoConfigMarker, BootstrapError, BootstrapMaterial, BootstrapWriter, NodeEnrollmentResponse};
pub use http::{enroll_url, HttpEnrollmentClient, ENROLL_NODE_PATH};
pub use tls::{build_pinned_config, FingerprintVerifier};

/// Result of a successful enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentReport {
    /// Address that served the enrollment.
    pub address: String,

    /// Transport addresses of the cluster's nodes, as reported by the cluster.
    pub nodes_addresses: Vec<String>,
}

/// Errors that can occur while enrolling with a cluster.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Token was issued by an incompatible node version.
    #[error("enrollment token from version {token} is not compatible with node version {node}")]
    IncompatibleVersion { token: Version, node: Version },

    /// TLS or HTTP client setup failed.
    #[error("failed to set up cluster connection: {0}")]
    Setup(String),

    /// The cluster refused the enrollment credential.
    #[error("enrollment rejected by {address} (HTTP {status})")]
    Rejected { address: String, status: u16 },

    /// No address completed enrollment.
    #[error("unable to enroll with any of {attempts} cluster address(es)")]
    Unreachable { attempts: usize },

    /// Enrollment succeeded but its result could not be stored.
    #[error("failed to store bootstrap configuration: {0}")]
    Bootstrap(#[from] BootstrapError),
}

/// Contacts a cluster with a decoded token and installs the returned configuration.
#[async_trait]
pub trait EnrollmentAttempt: Send + Sync {
    /// Enroll this node. Either everything is installed or nothing is.
    async fn enroll(&self, token: &EnrollmentToken) -> Result<EnrollmentReport, EnrollmentError>;
}

/// Tokens are accepted from nodes with the same major version.
pub fn check_version_compatible(token: &Version, node: &Version) -> Result<(), EnrollmentError> {
    if token.major == node.major {
        Ok(())
    } else {
        Err(EnrollmentError::IncompatibleVersion {
            token: token.clone(),
            node: node.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_major_is_compatible() {
        let node = Version::parse("8.2.1").unwrap();
        assert!(check_version_compatible(&Version::parse("8.0.0").unwrap(), &node).is_ok());
        assert!(check_version_compatible(&Version::parse("8.9.0-SNAPSHOT").unwrap(), &node).is_ok());
    }

    #[test]
    fn test_different_major_is_incompatible() {
        let node = Version::parse("8.2.1").unwrap();
        let result = check_version_compatible(&Version::parse("7.17.0").unwrap(), &node);
        assert!(matches!(result, Err(EnrollmentError::IncompatibleVersion { .. })));
    }
}

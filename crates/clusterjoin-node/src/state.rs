//! Local security configuration state.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Marker written once a node has been enrolled.
pub const MARKER_FILE: &str = "security-autoconfig.json";

/// Directory holding the node's security material.
pub const CERTS_DIR: &str = "certs";

/// Errors reading local configuration state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to inspect {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reports whether this node already has security configured.
pub trait ConfigurationStateProvider: Send + Sync {
    /// Returns true if security is already auto-configured.
    fn is_auto_configured(&self) -> Result<bool, StateError>;
}

/// Configuration state read from the node's configuration directory.
///
/// A node counts as configured if either the marker file or the
/// certificate directory exists, so half-written state is never
/// overwritten by a later enrollment.
#[derive(Debug, Clone)]
pub struct FsConfigurationState {
    config_dir: PathBuf,
}

impl FsConfigurationState {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn marker_path(&self) -> PathBuf {
        self.config_dir.join(MARKER_FILE)
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.config_dir.join(CERTS_DIR)
    }
}

impl ConfigurationStateProvider for FsConfigurationState {
    fn is_auto_configured(&self) -> Result<bool, StateError> {
        for path in [self.marker_path(), self.certs_dir()] {
            if exists(&path)? {
                debug!(path = %path.display(), "Found existing security configuration");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn exists(path: &Path) -> Result<bool, StateError> {
    path.try_exists().map_err(|source| StateError::Inspect {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_config_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clusterjoin-state-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_fresh_node_is_not_configured() {
        let dir = temp_config_dir();
        let state = FsConfigurationState::new(&dir);
        assert!(!state.is_auto_configured().unwrap());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_config_dir_is_not_configured() {
        let dir = std::env::temp_dir().join(format!("clusterjoin-missing-{}", Uuid::new_v4()));
        let state = FsConfigurationState::new(&dir);
        assert!(!state.is_auto_configured().unwrap());
    }

    #[test]
    fn test_marker_means_configured() {
        let dir = temp_config_dir();
        std::fs::write(dir.join(MARKER_FILE), "{}").unwrap();

        let state = FsConfigurationState::new(&dir);
        assert!(state.is_auto_configured().unwrap());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_certs_dir_means_configured() {
        let dir = temp_config_dir();
        std::fs::create_dir(dir.join(CERTS_DIR)).unwrap();

        let state = FsConfigurationState::new(&dir);
        assert!(state.is_auto_configured().unwrap());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_staging_leftovers_are_ignored() {
        let dir = temp_config_dir();
        std::fs::create_dir(dir.join(".enroll-staging-leftover")).unwrap();

        let state = FsConfigurationState::new(&dir);
        assert!(!state.is_auto_configured().unwrap());
        std::fs::remove_dir_all(dir).unwrap();
    }
}

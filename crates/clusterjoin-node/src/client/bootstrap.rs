//! Installing the configuration returned by a successful enrollment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use pem::Pem;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::{CERTS_DIR, MARKER_FILE};

/// Errors installing bootstrap configuration.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("node already has security configuration")]
    AlreadyConfigured,

    #[error("enrollment response contains an invalid {0}")]
    InvalidMaterial(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Body of a successful node enrollment response. Binary values are base64 DER.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeEnrollmentResponse {
    pub http_ca_key: String,
    pub http_ca_cert: String,
    pub transport_ca_cert: String,
    pub transport_key: String,
    pub transport_cert: String,
    #[serde(default)]
    pub nodes_addresses: Vec<String>,
}

/// Validated key and certificate files ready to be written.
#[derive(Debug, Clone)]
pub struct BootstrapMaterial {
    files: Vec<(&'static str, String)>,
    nodes_addresses: Vec<String>,
}

impl BootstrapMaterial {
    /// Decode every value of the response up front.
    pub fn from_response(response: NodeEnrollmentResponse) -> Result<Self, BootstrapError> {
        let files = vec![
            ("http_ca.crt", to_pem("CERTIFICATE", &response.http_ca_cert, "HTTP CA certificate")?),
            ("http_ca.key", to_pem("PRIVATE KEY", &response.http_ca_key, "HTTP CA key")?),
            (
                "transport_ca.crt",
                to_pem("CERTIFICATE", &response.transport_ca_cert, "transport CA certificate")?,
            ),
            ("transport.crt", to_pem("CERTIFICATE", &response.transport_cert, "transport certificate")?),
            ("transport.key", to_pem("PRIVATE KEY", &response.transport_key, "transport key")?),
        ];

        Ok(Self {
            files,
            nodes_addresses: response.nodes_addresses,
        })
    }

    /// File names written under the certificate directory.
    pub fn file_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.files.iter().map(|(name, _)| *name)
    }

    pub fn nodes_addresses(&self) -> &[String] {
        &self.nodes_addresses
    }
}

fn to_pem(tag: &str, value: &str, what: &'static str) -> Result<String, BootstrapError> {
    let der = STANDARD
        .decode(value)
        .map_err(|_| BootstrapError::InvalidMaterial(what))?;
    if der.is_empty() {
        return Err(BootstrapError::InvalidMaterial(what));
    }
    Ok(pem::encode(&Pem::new(tag, der)))
}

/// Record of a completed enrollment, stored next to the node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoConfigMarker {
    pub enrolled_at: DateTime<Utc>,
    pub enrolled_via: String,
    pub cluster_version: String,
    pub fingerprint: String,
    pub nodes_addresses: Vec<String>,
}

/// Writes bootstrap material into a configuration directory, all or nothing.
///
/// Files are staged in a scratch directory which is renamed into place,
/// followed by the marker file. On any failure everything written so far
/// is removed again.
#[derive(Debug, Clone)]
pub struct BootstrapWriter {
    config_dir: PathBuf,
}

impl BootstrapWriter {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn install(
        &self,
        material: &BootstrapMaterial,
        marker: &AutoConfigMarker,
    ) -> Result<(), BootstrapError> {
        let certs_dir = self.config_dir.join(CERTS_DIR);
        let marker_path = self.config_dir.join(MARKER_FILE);

        if certs_dir.try_exists()? || marker_path.try_exists()? {
            return Err(BootstrapError::AlreadyConfigured);
        }

        fs::create_dir_all(&self.config_dir)?;
        let staging = self
            .config_dir
            .join(format!(".enroll-staging-{}", Uuid::new_v4()));

        if let Err(e) = self.stage(&staging, material, marker) {
            warn!(error = %e, "Failed to stage bootstrap configuration");
            remove_quietly(&staging);
            return Err(e);
        }

        if let Err(e) = fs::rename(&staging, &certs_dir) {
            remove_quietly(&staging);
            return Err(e.into());
        }

        if let Err(e) = fs::rename(certs_dir.join(MARKER_FILE), &marker_path) {
            remove_quietly(&certs_dir);
            return Err(e.into());
        }

        info!(
            certs_dir = %certs_dir.display(),
            nodes = material.nodes_addresses.len(),
            "Bootstrap configuration installed"
        );
        Ok(())
    }

    fn stage(
        &self,
        staging: &Path,
        material: &BootstrapMaterial,
        marker: &AutoConfigMarker,
    ) -> Result<(), BootstrapError> {
        fs::create_dir(staging)?;

        for (name, contents) in &material.files {
            fs::write(staging.join(name), contents)?;
            debug!(file = %name, "Staged bootstrap file");
        }

        fs::write(staging.join(MARKER_FILE), serde_json::to_vec_pretty(marker)?)?;
        Ok(())
    }
}

fn remove_quietly(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %dir.display(), error = %e, "Failed to clean up after enrollment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConfigurationStateProvider, FsConfigurationState};

    fn temp_config_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clusterjoin-bootstrap-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_response() -> NodeEnrollmentResponse {
        NodeEnrollmentResponse {
            http_ca_key: STANDARD.encode(b"http-ca-key"),
            http_ca_cert: STANDARD.encode(b"http-ca-cert"),
            transport_ca_cert: STANDARD.encode(b"transport-ca-cert"),
            transport_key: STANDARD.encode(b"transport-key"),
            transport_cert: STANDARD.encode(b"transport-cert"),
            nodes_addresses: vec!["10.0.0.1:9300".to_string()],
        }
    }

    fn sample_marker() -> AutoConfigMarker {
        AutoConfigMarker {
            enrolled_at: Utc::now(),
            enrolled_via: "localhost:9200".to_string(),
            cluster_version: "8.0.0".to_string(),
            fingerprint: "ab".repeat(32),
            nodes_addresses: vec!["10.0.0.1:9300".to_string()],
        }
    }

    /// Sorted entry names of `dir`.
    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_response_parses() {
        let json = r#"{
            "http_ca_key": "a2V5",
            "http_ca_cert": "Y2VydA==",
            "transport_ca_cert": "Y2VydA==",
            "transport_key": "a2V5",
            "transport_cert": "Y2VydA==",
            "nodes_addresses": ["10.0.0.1:9300", "10.0.0.2:9300"]
        }"#;
        let response: NodeEnrollmentResponse = serde_json::from_str(json).unwrap();
        let material = BootstrapMaterial::from_response(response).unwrap();
        assert_eq!(material.nodes_addresses().len(), 2);
        assert_eq!(material.file_names().count(), 5);
    }

    #[test]
    fn test_invalid_material_is_rejected() {
        let mut response = sample_response();
        response.transport_key = "!!not base64!!".to_string();
        let result = BootstrapMaterial::from_response(response);
        assert!(matches!(result, Err(BootstrapError::InvalidMaterial("transport key"))));

        let mut response = sample_response();
        response.http_ca_cert = String::new();
        let result = BootstrapMaterial::from_response(response);
        assert!(matches!(result, Err(BootstrapError::InvalidMaterial(_))));
    }

    #[test]
    fn test_install_writes_everything() {
        let dir = temp_config_dir();
        let material = BootstrapMaterial::from_response(sample_response()).unwrap();
        let marker = sample_marker();

        BootstrapWriter::new(&dir).install(&material, &marker).unwrap();

        assert_eq!(entries(&dir), vec![CERTS_DIR.to_string(), MARKER_FILE.to_string()]);
        assert_eq!(
            entries(&dir.join(CERTS_DIR)),
            vec!["http_ca.crt", "http_ca.key", "transport.crt", "transport.key", "transport_ca.crt"]
        );

        let cert = fs::read_to_string(dir.join(CERTS_DIR).join("http_ca.crt")).unwrap();
        let parsed = pem::parse(cert).unwrap();
        assert_eq!(parsed.tag(), "CERTIFICATE");
        assert_eq!(parsed.contents(), b"http-ca-cert");

        let stored: AutoConfigMarker =
            serde_json::from_slice(&fs::read(dir.join(MARKER_FILE)).unwrap()).unwrap();
        assert_eq!(stored, marker);

        assert!(FsConfigurationState::new(&dir).is_auto_configured().unwrap());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_install_refuses_configured_node() {
        let dir = temp_config_dir();
        fs::create_dir(dir.join(CERTS_DIR)).unwrap();
        let material = BootstrapMaterial::from_response(sample_response()).unwrap();

        let result = BootstrapWriter::new(&dir).install(&material, &sample_marker());
        assert!(matches!(result, Err(BootstrapError::AlreadyConfigured)));
        assert_eq!(entries(&dir), vec![CERTS_DIR.to_string()]);
        assert!(entries(&dir.join(CERTS_DIR)).is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_failed_install_leaves_nothing_behind() {
        let parent = temp_config_dir();
        // A regular file where the config directory should be
        let config_dir = parent.join("config");
        fs::write(&config_dir, "not a directory").unwrap();
        let material = BootstrapMaterial::from_response(sample_response()).unwrap();

        let result = BootstrapWriter::new(&config_dir).install(&material, &sample_marker());
        assert!(result.is_err());
        assert_eq!(entries(&parent), vec!["config".to_string()]);
        fs::remove_dir_all(parent).unwrap();
    }
}

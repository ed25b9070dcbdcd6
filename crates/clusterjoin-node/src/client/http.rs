//! HTTPS enrollment client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use semver::Version;
use tracing::{debug, info, warn};

use clusterjoin_core::EnrollmentToken;

use super::bootstrap::{AutoConfigMarker, BootstrapMaterial, BootstrapWriter, NodeEnrollmentResponse};
use super::tls::build_pinned_config;
use super::{check_version_compatible, EnrollmentAttempt, EnrollmentError, EnrollmentReport};
use crate::config::Config;

/// Path of the node enrollment endpoint on a cluster node.
pub const ENROLL_NODE_PATH: &str = "/_security/enroll/node";

/// URL of the enrollment endpoint for a `host:port` address.
pub fn enroll_url(address: &str) -> String {
    format!("https://{}{}", address, ENROLL_NODE_PATH)
}

/// Enrolls over HTTPS, trying the token's addresses in order.
pub struct HttpEnrollmentClient {
    node_version: Version,
    connect_timeout: Duration,
    request_timeout: Duration,
    writer: BootstrapWriter,
}

impl HttpEnrollmentClient {
    /// Create a new client from node configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            node_version: config.node_version.clone(),
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            writer: BootstrapWriter::new(&config.config_dir),
        }
    }

    fn http_client(&self, token: &EnrollmentToken) -> Result<reqwest::Client, EnrollmentError> {
        let tls = build_pinned_config(token.fingerprint())
            .map_err(|e| EnrollmentError::Setup(e.to_string()))?;

        reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| EnrollmentError::Setup(e.to_string()))
    }

    /// Fetch bootstrap material from one address.
    ///
    /// `Ok(None)` means this address failed in a way worth trying the next one.
    async fn fetch(
        &self,
        client: &reqwest::Client,
        address: &str,
        token: &EnrollmentToken,
    ) -> Result<Option<BootstrapMaterial>, EnrollmentError> {
        let url = enroll_url(address);
        debug!(url = %url, "Requesting node enrollment");

        let response = match client
            .get(&url)
            .header(AUTHORIZATION, format!("ApiKey {}", token.api_key().expose()))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(address = %address, error = %e, "Cluster address unreachable");
                return Ok(None);
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EnrollmentError::Rejected {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            warn!(address = %address, status = %status, "Enrollment request failed");
            return Ok(None);
        }

        let body: NodeEnrollmentResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(address = %address, error = %e, "Malformed enrollment response");
                return Ok(None);
            }
        };

        match BootstrapMaterial::from_response(body) {
            Ok(material) => Ok(Some(material)),
            Err(e) => {
                warn!(address = %address, error = %e, "Unusable enrollment response");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl EnrollmentAttempt for HttpEnrollmentClient {
    async fn enroll(&self, token: &EnrollmentToken) -> Result<EnrollmentReport, EnrollmentError> {
        check_version_compatible(token.version(), &self.node_version)?;
        let client = self.http_client(token)?;

        for address in token.bound_addresses() {
            let Some(material) = self.fetch(&client, address, token).await? else {
                continue;
            };

            let marker = AutoConfigMarker {
                enrolled_at: Utc::now(),
                enrolled_via: address.clone(),
                cluster_version: token.version().to_string(),
                fingerprint: token.fingerprint().to_string(),
                nodes_addresses: material.nodes_addresses().to_vec(),
            };
            self.writer.install(&material, &marker)?;

            info!(address = %address, "Node enrolled");
            return Ok(EnrollmentReport {
                address: address.clone(),
                nodes_addresses: marker.nodes_addresses,
            });
        }

        Err(EnrollmentError::Unreachable {
            attempts: token.bound_addresses().len(),
        })
    }
}

//! TLS client configuration pinned to the token fingerprint.
//!
//! The enrollment connection trusts no CA roots. A server is accepted if its
//! end-entity certificate hashes to the fingerprint carried in the enrollment
//! token, or if the end-entity certificate is issued by a presented chain
//! certificate that does. The pinned certificate is then the only trust
//! anchor. Server names are not checked.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::warn;

use clusterjoin_core::Fingerprint;

/// Certificate verifier that pins to the trust anchor fingerprint of an enrollment token.
#[derive(Debug)]
pub struct FingerprintVerifier {
    fingerprint: Fingerprint,
    provider: Arc<CryptoProvider>,
}

impl FingerprintVerifier {
    pub fn new(fingerprint: Fingerprint, provider: Arc<CryptoProvider>) -> Arc<Self> {
        Arc::new(Self {
            fingerprint,
            provider,
        })
    }

    /// Verify that `end_entity` chains to `anchor`, with `anchor` as the sole root.
    fn verify_issued_by(
        &self,
        anchor: &CertificateDer<'_>,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<(), rustls::Error> {
        let mut roots = RootCertStore::empty();
        roots.add(anchor.clone().into_owned())?;

        let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), self.provider.clone())
            .build()
            .map_err(|e| rustls::Error::General(e.to_string()))?;

        match webpki.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now) {
            Ok(_) => Ok(()),
            // Names are checked after the chain, so the chain is already valid here
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            )) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl ServerCertVerifier for FingerprintVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if self.fingerprint.matches_der(end_entity.as_ref()) {
            return Ok(ServerCertVerified::assertion());
        }

        let Some(anchor) = intermediates
            .iter()
            .find(|cert| self.fingerprint.matches_der(cert.as_ref()))
        else {
            warn!(
                fingerprint = %self.fingerprint,
                "No certificate presented by the cluster matches the enrollment token fingerprint"
            );
            return Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ));
        };

        match self.verify_issued_by(anchor, end_entity, intermediates, server_name, ocsp_response, now) {
            Ok(()) => Ok(ServerCertVerified::assertion()),
            Err(e) => {
                warn!(
                    fingerprint = %self.fingerprint,
                    error = %e,
                    "Server certificate is not issued by the pinned certificate"
                );
                Err(e)
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Build a client config that trusts only servers matching `fingerprint`.
pub fn build_pinned_config(fingerprint: &Fingerprint) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = FingerprintVerifier::new(fingerprint.clone(), provider.clone());

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    Ok(config)
}

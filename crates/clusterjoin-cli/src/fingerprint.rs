//! Trust anchor fingerprints from PEM certificates.

use tracing::warn;
use x509_parser::parse_x509_certificate;

use clusterjoin_core::Fingerprint;

use crate::error::CliError;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Fingerprint of the first certificate in a PEM document.
///
/// The certificate is expected to be the cluster's CA; anything else still
/// yields a fingerprint, with a warning.
pub fn fingerprint_from_pem(pem_text: &str) -> Result<Fingerprint, CliError> {
    let blocks = pem::parse_many(pem_text).map_err(|e| CliError::Pem(e.to_string()))?;
    let cert = blocks
        .iter()
        .find(|block| block.tag() == CERTIFICATE_TAG)
        .ok_or(CliError::NoCertificate)?;

    let der = cert.contents();
    let (_, parsed) =
        parse_x509_certificate(der).map_err(|e| CliError::Certificate(e.to_string()))?;
    if !parsed.is_ca() {
        warn!(
            subject = %parsed.subject(),
            "Certificate is not a CA; joining nodes will only trust servers presenting it directly"
        );
    }

    Ok(Fingerprint::of_der(der))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};

    fn generate(is_ca: bool) -> (String, Vec<u8>) {
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, "Cluster HTTP CA");
        params.distinguished_name = dn;
        if is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        }

        let key_pair = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem(), cert.der().to_vec())
    }

    #[test]
    fn test_ca_certificate() {
        let (pem_text, der) = generate(true);
        let fingerprint = fingerprint_from_pem(&pem_text).unwrap();
        assert_eq!(fingerprint, Fingerprint::of_der(&der));
        assert_eq!(fingerprint.as_str().len(), 64);
    }

    #[test]
    fn test_non_ca_certificate_still_fingerprints() {
        let (pem_text, der) = generate(false);
        assert_eq!(fingerprint_from_pem(&pem_text).unwrap(), Fingerprint::of_der(&der));
    }

    #[test]
    fn test_first_certificate_is_used() {
        let (first, der) = generate(true);
        let (second, _) = generate(true);
        let bundle = format!("{}{}", first, second);
        assert_eq!(fingerprint_from_pem(&bundle).unwrap(), Fingerprint::of_der(&der));
    }

    #[test]
    fn test_key_only_document_has_no_certificate() {
        let key_pair = KeyPair::generate().unwrap();
        let result = fingerprint_from_pem(&key_pair.serialize_pem());
        assert!(matches!(result, Err(CliError::NoCertificate)));
    }

    #[test]
    fn test_garbage_certificate_is_rejected() {
        let block = pem::Pem::new(CERTIFICATE_TAG, b"not der".to_vec());
        let result = fingerprint_from_pem(&pem::encode(&block));
        assert!(matches!(result, Err(CliError::Certificate(_))));
    }

    #[test]
    fn test_empty_input() {
        // No blocks at all
        assert!(matches!(fingerprint_from_pem(""), Err(CliError::NoCertificate)));
    }
}

//! Newtype wrappers for the credential and fingerprint carried by a token.

use std::fmt;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// SHA-256 fingerprint of the cluster's trust anchor, as 64 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse a fingerprint. Only exactly 64 lowercase hex characters are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == FINGERPRINT_HEX_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(s.to_owned()))
    }

    /// Fingerprint of a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(der)))
    }

    /// Returns true if `der` hashes to this fingerprint.
    pub fn matches_der(&self, der: &[u8]) -> bool {
        let digest = Sha256::digest(der);
        match hex::decode(&self.0) {
            Ok(expected) => expected.as_slice() == digest.as_slice(),
            Err(_) => false,
        }
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// API credential scoped to the enrollment operation.
///
/// `Debug` is redacted; use [`ApiKey::expose`] where the value is actually sent.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create an API key. Returns `None` for an empty value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        (!value.is_empty()).then_some(Self(value))
    }

    /// The raw credential.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FGR: &str = "e8864fa9cb5a8053ea84a48581a6c9bef619f8f6aaa58a632aac3e0a25d43ea9";

    #[test]
    fn test_fingerprint_parse() {
        assert!(Fingerprint::parse(FGR).is_some());
        assert!(Fingerprint::parse(&FGR.to_uppercase()).is_none());
        assert!(Fingerprint::parse(&FGR[..63]).is_none());
        assert!(Fingerprint::parse(&format!("{}0", FGR)).is_none());
        assert!(Fingerprint::parse(&FGR.replace('e', "g")).is_none());
    }

    #[test]
    fn test_fingerprint_of_der() {
        let der = b"not really a certificate";
        let fingerprint = Fingerprint::of_der(der);

        assert_eq!(fingerprint.as_str().len(), FINGERPRINT_HEX_LEN);
        assert!(Fingerprint::parse(fingerprint.as_str()).is_some());
        assert!(fingerprint.matches_der(der));
        assert!(!fingerprint.matches_der(b"something else"));
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("secret-value").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(<redacted>)");
        assert_eq!(key.expose(), "secret-value");
        assert!(ApiKey::new("").is_none());
    }
}

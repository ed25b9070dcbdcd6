//! Enrollment token and its transport encoding.
//!
//! Wire format: standard padded base64 of a compact JSON object
//!
//! ```text
//! {"ver":"8.0.0","adr":["localhost:9200"],"fgr":"<64 hex>","key":"<api key>","chk":"<16 hex>"}
//! ```
//!
//! `chk` is the first 8 bytes of SHA-256 over the same object without `chk`.
//! Decoding only succeeds for strings that [`EnrollmentToken::encode`] itself
//! produces; any other spelling of the same record is rejected.

use std::net::Ipv6Addr;

use base64::{engine::general_purpose::STANDARD, Engine};
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{DecodeError, TokenField};
use crate::ids::{ApiKey, Fingerprint};

/// Number of digest bytes kept in the checksum.
const CHECKSUM_LEN: usize = 8;

/// Everything a fresh node needs to join a secured cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentToken {
    api_key: ApiKey,
    fingerprint: Fingerprint,
    version: Version,
    bound_addresses: Vec<String>,
}

/// Data fields in wire order. The checksum is computed over this.
#[derive(Serialize)]
struct WireData<'a> {
    ver: String,
    adr: &'a [String],
    fgr: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct WireRecord<'a> {
    ver: String,
    adr: &'a [String],
    fgr: &'a str,
    key: &'a str,
    chk: String,
}

/// Loosely typed record so that absent and mistyped fields can be told apart.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    ver: Option<Value>,
    adr: Option<Value>,
    fgr: Option<Value>,
    key: Option<Value>,
    chk: Option<Value>,
}

impl EnrollmentToken {
    /// Create a token.
    ///
    /// Fails with `InvalidField(BoundAddresses)` if `bound_addresses` is
    /// empty or any entry is not `host:port`.
    pub fn new(
        api_key: ApiKey,
        fingerprint: Fingerprint,
        version: Version,
        bound_addresses: Vec<String>,
    ) -> Result<Self, DecodeError> {
        if bound_addresses.is_empty() || !bound_addresses.iter().all(|a| is_valid_address(a)) {
            return Err(DecodeError::InvalidField(TokenField::BoundAddresses));
        }

        Ok(Self {
            api_key,
            fingerprint,
            version,
            bound_addresses,
        })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Candidate cluster endpoints, in the order they should be tried.
    pub fn bound_addresses(&self) -> &[String] {
        &self.bound_addresses
    }

    /// Encode the token for transport.
    pub fn encode(&self) -> String {
        let record = WireRecord {
            ver: self.version.to_string(),
            adr: &self.bound_addresses,
            fgr: self.fingerprint.as_str(),
            key: self.api_key.expose(),
            chk: self.checksum(),
        };

        // Serializing strings and string slices cannot fail.
        let json = serde_json::to_vec(&record).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Decode and validate a token string.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let bytes = STANDARD
            .decode(raw)
            .map_err(|_| DecodeError::NotTransportEncoding)?;

        if bytes.first() != Some(&b'{') {
            return Err(DecodeError::NotStructured);
        }
        let record: RawRecord =
            serde_json::from_slice(&bytes).map_err(|_| DecodeError::NotStructured)?;

        let key = required(record.key, TokenField::ApiKey)?;
        let fgr = required(record.fgr, TokenField::Fingerprint)?;
        let ver = required(record.ver, TokenField::Version)?;
        let adr = required(record.adr, TokenField::BoundAddresses)?;
        let chk = required(record.chk, TokenField::Checksum)?;

        let api_key = as_str(&key)
            .and_then(ApiKey::new)
            .ok_or(DecodeError::InvalidField(TokenField::ApiKey))?;
        let fingerprint = as_str(&fgr)
            .and_then(Fingerprint::parse)
            .ok_or(DecodeError::InvalidField(TokenField::Fingerprint))?;
        let version = as_str(&ver)
            .and_then(|v| Version::parse(v).ok())
            .ok_or(DecodeError::InvalidField(TokenField::Version))?;
        let bound_addresses =
            parse_addresses(&adr).ok_or(DecodeError::InvalidField(TokenField::BoundAddresses))?;
        let checksum = as_str(&chk)
            .filter(|c| is_checksum_shaped(c))
            .ok_or(DecodeError::InvalidField(TokenField::Checksum))?;

        let token = Self::new(api_key, fingerprint, version, bound_addresses)?;

        if token.checksum() != checksum {
            return Err(DecodeError::InvalidField(TokenField::Checksum));
        }
        if token.encode() != raw {
            return Err(DecodeError::NotStructured);
        }

        Ok(token)
    }

    fn checksum(&self) -> String {
        let data = WireData {
            ver: self.version.to_string(),
            adr: &self.bound_addresses,
            fgr: self.fingerprint.as_str(),
            key: self.api_key.expose(),
        };
        let json = serde_json::to_vec(&data).unwrap_or_default();
        hex::encode(&Sha256::digest(&json)[..CHECKSUM_LEN])
    }
}

fn required(value: Option<Value>, field: TokenField) -> Result<Value, DecodeError> {
    value.ok_or(DecodeError::MissingField(field))
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

fn parse_addresses(value: &Value) -> Option<Vec<String>> {
    let entries = value.as_array()?;
    if entries.is_empty() {
        return None;
    }
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .filter(|a| is_valid_address(a))
                .map(str::to_owned)
        })
        .collect()
}

fn is_checksum_shaped(s: &str) -> bool {
    s.len() == CHECKSUM_LEN * 2 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// `host:port`, where the host is a DNS name, an IPv4 literal, or an IPv6
/// literal in brackets.
fn is_valid_address(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) || port.parse::<u16>().is_err()
    {
        return false;
    }

    match host.strip_prefix('[') {
        Some(inner) => inner
            .strip_suffix(']')
            .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok()),
        None => is_valid_hostname(host),
    }
}

/// Dot-separated labels of ASCII letters, digits and inner hyphens.
fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

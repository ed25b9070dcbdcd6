//! Token decoding errors.

use std::fmt;

use thiserror::Error;

/// A field of the enrollment token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenField {
    /// The scoped API credential (`key`).
    ApiKey,
    /// Trust anchor fingerprint (`fgr`).
    Fingerprint,
    /// Version of the issuing node (`ver`).
    Version,
    /// Candidate cluster addresses (`adr`).
    BoundAddresses,
    /// Integrity check over the other fields (`chk`).
    Checksum,
}

impl TokenField {
    /// Key used for this field in the serialized record.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Self::ApiKey => "key",
            Self::Fingerprint => "fgr",
            Self::Version => "ver",
            Self::BoundAddresses => "adr",
            Self::Checksum => "chk",
        }
    }
}

impl fmt::Display for TokenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiKey => "api key",
            Self::Fingerprint => "fingerprint",
            Self::Version => "version",
            Self::BoundAddresses => "bound addresses",
            Self::Checksum => "checksum",
        };
        f.write_str(name)
    }
}

/// Why a raw string could not be decoded into an enrollment token.
///
/// Messages only name the failing kind and field. They never include the
/// raw input or any field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input is not valid base64 text.
    #[error("enrollment token is not valid base64")]
    NotTransportEncoding,

    /// Decoded bytes are not a well-formed token record.
    #[error("enrollment token does not contain a well-formed token record")]
    NotStructured,

    /// A required field is absent.
    #[error("enrollment token is missing the {0} field")]
    MissingField(TokenField),

    /// A field is present but fails its invariant. A checksum that does not
    /// match the other fields is an invalid `Checksum` field.
    #[error("enrollment token has an invalid {0} field")]
    InvalidField(TokenField),
}

/// Field-less discriminant of [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    NotTransportEncoding,
    NotStructured,
    MissingField,
    InvalidField,
}

impl DecodeError {
    /// The kind of failure, without the field.
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::NotTransportEncoding => DecodeErrorKind::NotTransportEncoding,
            Self::NotStructured => DecodeErrorKind::NotStructured,
            Self::MissingField(_) => DecodeErrorKind::MissingField,
            Self::InvalidField(_) => DecodeErrorKind::InvalidField,
        }
    }

    /// The offending field, for `MissingField` and `InvalidField`.
    pub fn field(&self) -> Option<TokenField> {
        match self {
            Self::MissingField(field) | Self::InvalidField(field) => Some(*field),
            Self::NotTransportEncoding | Self::NotStructured => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_field() {
        let err = DecodeError::InvalidField(TokenField::Fingerprint);
        assert_eq!(err.kind(), DecodeErrorKind::InvalidField);
        assert_eq!(err.field(), Some(TokenField::Fingerprint));

        let err = DecodeError::NotStructured;
        assert_eq!(err.kind(), DecodeErrorKind::NotStructured);
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_display_names_field() {
        let err = DecodeError::MissingField(TokenField::BoundAddresses);
        assert_eq!(
            err.to_string(),
            "enrollment token is missing the bound addresses field"
        );
    }
}

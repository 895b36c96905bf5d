//! # Envelope Errors
//!
//! This module defines the [`EnvelopeError`] enum and the closed [`DecryptionFailure`]
//! taxonomy reported for rejected tokens.

use keyrot_keystore::KeyStoreError;
use std::borrow::Cow;
use std::fmt;

/// Why a token was rejected.
///
/// Every externally observable decryption failure maps to exactly one kind. None of
/// them is ever retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecryptionFailure {
    /// The text is not URL-safe base64.
    InvalidFormat,
    /// The first byte is not the format marker.
    UnknownFormat,
    /// No separator follows the key id.
    KeyIdMissing,
    /// The referenced key is unknown, malformed or expired.
    KeyNotFound,
    /// The HMAC over IV and ciphertext does not match.
    SignatureMismatch,
    /// The decrypted compression flag is neither raw nor zlib.
    UnknownCompressor,
    /// The zlib stream inside an authentic envelope is corrupt.
    Decompression,
    /// The packed payload cannot be unpacked into the requested shape.
    InvalidPayload,
}

impl DecryptionFailure {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid format",
            Self::UnknownFormat => "unknown format",
            Self::KeyIdMissing => "key id missing",
            Self::KeyNotFound => "key not found or expired",
            Self::SignatureMismatch => "signature mismatch",
            Self::UnknownCompressor => "unknown compressor",
            Self::Decompression => "decompression failed",
            Self::InvalidPayload => "invalid payload",
        }
    }
}

impl fmt::Display for DecryptionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specialized [`EnvelopeError`] enum for envelope failures.
#[keyrot_derive::keyrot_error]
pub enum EnvelopeError {
    /// The token was rejected. Adversarial input only ever produces this variant.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption {
        kind: DecryptionFailure,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// Failure while producing a token.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The payload cannot be packed.
    #[error("Serialization error{}: {message}", format_context(.context))]
    Serialization { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Key material does not fit the cipher or the key id cannot be framed.
    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Environment failure of the key store (I/O, entropy, configuration).
    #[error("Key store failure{}: {source}", format_context(.context))]
    KeyStore { source: KeyStoreError, context: Option<Cow<'static, str>> },
}

impl EnvelopeError {
    /// The rejection kind, if this is a decryption error.
    #[must_use]
    pub const fn decryption_failure(&self) -> Option<DecryptionFailure> {
        match self {
            Self::Decryption { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption { .. })
    }

    pub(crate) fn rejected(kind: DecryptionFailure, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Decryption { kind, message: message.into(), context: None }
    }
}

impl From<DecryptionFailure> for EnvelopeError {
    fn from(kind: DecryptionFailure) -> Self {
        Self::rejected(kind, kind.as_str())
    }
}

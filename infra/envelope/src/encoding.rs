//! Text form of envelopes: URL-safe base64 without padding.

use crate::error::{DecryptionFailure, EnvelopeError};
use base64::Engine as _;
use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Emits no `=`; accepts input with or without it.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes raw envelope bytes as token text.
#[must_use]
pub fn encode_token(bytes: &[u8]) -> String {
    TOKEN_ENGINE.encode(bytes)
}

/// Decodes token text into raw envelope bytes.
///
/// # Errors
/// Returns [`EnvelopeError::Decryption`] with [`DecryptionFailure::InvalidFormat`] for
/// text that is not URL-safe base64.
pub fn decode_token(text: &str) -> Result<Vec<u8>, EnvelopeError> {
    TOKEN_ENGINE
        .decode(text)
        .map_err(|e| EnvelopeError::rejected(DecryptionFailure::InvalidFormat, e.to_string()))
}

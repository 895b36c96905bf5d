use crate::cipher::{decrypt_in_place, sign};
use crate::compare::uniform_time_eq;
use crate::compression::unframe;
use crate::encoding::decode_token;
use crate::error::{DecryptionFailure, EnvelopeError};
use crate::payload::Payload;
use crate::types::Envelope;
use keyrot_keystore::{KeyReader, KeyResolver};
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

/// Verifies and opens tokens produced by an [`Encryptor`](crate::Encryptor) sharing
/// the same key directory.
///
/// Checks run cheapest first: text encoding, format marker, key id framing and key
/// lookup. The signature is then verified in full before a single byte of ciphertext
/// is decrypted. Every rejection is an [`EnvelopeError::Decryption`]; only environment
/// failures of the key store surface as [`EnvelopeError::KeyStore`].
#[derive(Debug, Clone)]
pub struct Decryptor<R: KeyResolver = KeyReader> {
    resolver: R,
}

impl<R: KeyResolver> Decryptor<R> {
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Opens a token into its payload.
    ///
    /// # Errors
    /// * [`EnvelopeError::Decryption`] for malformed, tampered or expired tokens.
    /// * [`EnvelopeError::KeyStore`] if the key file exists but cannot be read.
    pub fn decrypt(&self, token: &str) -> Result<Payload, EnvelopeError> {
        let packed = self.open_packed(token)?;
        Payload::from_packed(&packed).inspect_err(log_rejection)
    }

    /// Opens a token into any serde value packed by
    /// [`Encryptor::encrypt_value`](crate::Encryptor::encrypt_value).
    ///
    /// # Errors
    /// See [`Decryptor::decrypt`]. A payload of the wrong shape is rejected as
    /// [`DecryptionFailure::InvalidPayload`].
    pub fn decrypt_value<T: DeserializeOwned>(&self, token: &str) -> Result<T, EnvelopeError> {
        let packed = self.open_packed(token)?;
        rmp_serde::from_slice(&packed)
            .map_err(|e| EnvelopeError::rejected(DecryptionFailure::InvalidPayload, e.to_string()))
            .inspect_err(log_rejection)
    }

    /// Opens a token into the packed payload bytes without unpacking them.
    ///
    /// # Errors
    /// See [`Decryptor::decrypt`].
    pub fn open_packed(&self, token: &str) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        self.open(token).inspect_err(log_rejection)
    }

    fn open(&self, token: &str) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        let bytes = decode_token(token)?;
        let envelope = Envelope::parse(&bytes)?;

        let material = self.resolver.resolve(envelope.key_id).map_err(|e| {
            if e.is_not_found() {
                EnvelopeError::rejected(
                    DecryptionFailure::KeyNotFound,
                    format!("key not found or expired: {}", envelope.key_id.escape_ascii()),
                )
            } else {
                EnvelopeError::from(e)
            }
        })?;

        let expected = sign(material.signing_key(), &[envelope.signed])?;
        if !uniform_time_eq(&expected, envelope.signature) {
            return Err(DecryptionFailure::SignatureMismatch.into());
        }

        let (iv, ciphertext) = envelope.iv_and_ciphertext().ok_or_else(|| {
            EnvelopeError::rejected(DecryptionFailure::InvalidFormat, "envelope shorter than its IV")
        })?;

        let mut plaintext = Zeroizing::new(ciphertext.to_vec());
        decrypt_in_place(material.cipher_key(), iv, &mut plaintext)?;

        unframe(&plaintext).map(Zeroizing::new)
    }
}

fn log_rejection(err: &EnvelopeError) {
    if let Some(kind) = err.decryption_failure() {
        debug!(%kind, "Rejected token");
    }
}

use crate::cipher::{encrypt_in_place, sign};
use crate::compression::frame;
use crate::encoding::encode_token;
use crate::error::EnvelopeError;
use crate::payload::Payload;
use crate::types::{EncryptOptions, IV_LEN, SEPARATOR, assemble};
use keyrot_keystore::{KeySource, KeyWriter};
use serde::Serialize;
use tracing::trace;
use zeroize::Zeroizing;

/// Turns payloads into signed, encrypted, URL-safe tokens under the current key.
///
/// Every call draws a fresh IV, so identical payloads never yield identical tokens.
///
/// ### Example
/// ```rust
/// use keyrot_envelope::{Decryptor, Encryptor, Payload};
/// use keyrot_keystore::KeyStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let tmp = tempfile::tempdir()?;
/// let store = KeyStore::builder().root(tmp.path()).build()?;
/// let encryptor = Encryptor::new(store.writer);
/// let decryptor = Decryptor::new(store.reader);
///
/// let token = encryptor.encrypt(&Payload::from("hello"))?;
/// assert!(!token.contains('='));
/// assert_eq!(decryptor.decrypt(&token)?, Payload::from("hello"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Encryptor<S: KeySource = KeyWriter> {
    source: S,
    options: EncryptOptions,
}

impl<S: KeySource> Encryptor<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_options(source, EncryptOptions::default())
    }

    /// An encryptor whose [`Encryptor::encrypt`] uses `options` instead of the defaults.
    #[must_use]
    pub const fn with_options(source: S, options: EncryptOptions) -> Self {
        Self { source, options }
    }

    #[must_use]
    pub const fn options(&self) -> EncryptOptions {
        self.options
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Encrypts a payload with this encryptor's options.
    ///
    /// # Errors
    /// * [`EnvelopeError::Serialization`] if the payload cannot be packed.
    /// * [`EnvelopeError::KeyStore`] if no current key can be produced.
    /// * [`EnvelopeError::InvalidKey`] if the current key does not fit the cipher.
    pub fn encrypt(&self, payload: &Payload) -> Result<String, EnvelopeError> {
        self.encrypt_with(payload, self.options)
    }

    /// Encrypts a payload with explicit options.
    ///
    /// # Errors
    /// See [`Encryptor::encrypt`].
    pub fn encrypt_with(
        &self,
        payload: &Payload,
        options: EncryptOptions,
    ) -> Result<String, EnvelopeError> {
        let packed = Zeroizing::new(payload.to_packed()?);
        self.seal(&packed, options)
    }

    /// Encrypts any serde value, packed as MessagePack with named struct fields.
    ///
    /// # Errors
    /// See [`Encryptor::encrypt`].
    pub fn encrypt_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EnvelopeError> {
        let packed = rmp_serde::to_vec_named(value).map_err(|e| EnvelopeError::Serialization {
            message: e.to_string().into(),
            context: Some("MessagePack encoding failed".into()),
        })?;
        self.seal(&Zeroizing::new(packed), self.options)
    }

    /// Encrypts bytes that are already packed.
    ///
    /// # Errors
    /// See [`Encryptor::encrypt`].
    pub fn seal_packed(&self, packed: &[u8]) -> Result<String, EnvelopeError> {
        self.seal(packed, self.options)
    }

    fn seal(&self, packed: &[u8], options: EncryptOptions) -> Result<String, EnvelopeError> {
        let mut buf = Zeroizing::new(frame(packed, options)?);

        let mut iv = [0u8; IV_LEN];
        getrandom::fill(&mut iv).map_err(|e| EnvelopeError::Encryption {
            message: e.to_string().into(),
            context: Some("IV generation".into()),
        })?;

        let key = self.source.fresh_key()?;
        let key_id = key.id.as_bytes();
        if key_id.is_empty() || key_id.contains(&SEPARATOR) {
            return Err(EnvelopeError::InvalidKey {
                message: format!("Key id {} cannot be framed", key.id).into(),
                context: None,
            });
        }

        encrypt_in_place(key.material.cipher_key(), &iv, &mut buf)?;
        let signature = sign(key.material.signing_key(), &[iv.as_slice(), buf.as_slice()])?;

        trace!(key_id = %key.id, len = buf.len(), "Sealed envelope");
        Ok(encode_token(&assemble(key_id, &signature, &iv, buf.as_slice())))
    }
}

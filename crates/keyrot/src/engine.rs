use crate::settings::Settings;
use keyrot_envelope::{Decryptor, EncryptOptions, Encryptor, EnvelopeError, Payload};
use keyrot_keystore::{KeyReader, KeyStore, KeyStoreConfig, KeyStoreError, KeyWriter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Encrypts and decrypts tokens under keys rotated automatically inside one directory.
///
/// Cloning is cheap: clones share the writer's current key and the reader's cache.
/// Separate instances over the same directory (other threads, other processes)
/// interoperate through the key files alone.
///
/// ### Example
/// ```rust
/// use keyrot::{Payload, RandomEncryption};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let tmp = tempfile::tempdir()?;
/// let engine = RandomEncryption::open(tmp.path())?;
/// let token = engine.encrypt(&Payload::from("session-42"))?;
/// assert_eq!(engine.decrypt(&token)?, Payload::from("session-42"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RandomEncryption {
    encryptor: Encryptor,
    decryptor: Decryptor,
    config: KeyStoreConfig,
}

impl RandomEncryption {
    /// Opens (creating if needed) a key directory with default rotation settings.
    ///
    /// # Errors
    /// Returns a [`KeyStoreError`] if the directory cannot be created or resolved.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeyStoreError> {
        Self::with_config(dir, KeyStoreConfig::default())
    }

    /// Opens a key directory with explicit rotation settings.
    ///
    /// # Errors
    /// Returns [`KeyStoreError::InvalidConfiguration`] for an unusable key length, or
    /// [`KeyStoreError::Io`] if the directory cannot be created or resolved.
    pub fn with_config(
        dir: impl Into<PathBuf>,
        config: KeyStoreConfig,
    ) -> Result<Self, KeyStoreError> {
        let store = KeyStore::builder().root(dir).config(config).build()?;
        Ok(Self::from_store(store))
    }

    /// Opens the key directory described by loaded [`Settings`].
    ///
    /// # Errors
    /// See [`RandomEncryption::with_config`].
    pub fn from_settings(settings: &Settings) -> Result<Self, KeyStoreError> {
        Self::with_config(settings.dir.clone(), settings.key_store_config())
    }

    /// Wraps a store assembled by hand, e.g. one with a custom clock.
    #[must_use]
    pub fn from_store(store: KeyStore) -> Self {
        let config = *store.writer.config();
        info!(
            root = %store.writer.root().display(),
            freshness = ?config.freshness,
            max_age = ?config.max_age,
            "Random encryption ready"
        );

        Self {
            encryptor: Encryptor::new(store.writer),
            decryptor: Decryptor::new(store.reader),
            config,
        }
    }

    /// Encrypts a payload under the current key.
    ///
    /// # Errors
    /// Returns an [`EnvelopeError`] if the payload cannot be packed or no current key
    /// can be produced.
    pub fn encrypt(&self, payload: &Payload) -> Result<String, EnvelopeError> {
        self.encryptor.encrypt(payload)
    }

    /// Encrypts a payload with explicit compression options.
    ///
    /// # Errors
    /// See [`RandomEncryption::encrypt`].
    pub fn encrypt_with(
        &self,
        payload: &Payload,
        options: EncryptOptions,
    ) -> Result<String, EnvelopeError> {
        self.encryptor.encrypt_with(payload, options)
    }

    /// Opens a token produced by any instance sharing the key directory.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Decryption`] for every malformed, tampered or expired
    /// token, and [`EnvelopeError::KeyStore`] only when a key file cannot be read.
    pub fn decrypt(&self, token: &str) -> Result<Payload, EnvelopeError> {
        self.decryptor.decrypt(token)
    }

    /// Encrypts any serde value.
    ///
    /// # Errors
    /// See [`RandomEncryption::encrypt`].
    pub fn encrypt_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EnvelopeError> {
        self.encryptor.encrypt_value(value)
    }

    /// Opens a token into a serde value.
    ///
    /// # Errors
    /// See [`RandomEncryption::decrypt`].
    pub fn decrypt_value<T: DeserializeOwned>(&self, token: &str) -> Result<T, EnvelopeError> {
        self.decryptor.decrypt_value(token)
    }

    #[must_use]
    pub const fn writer(&self) -> &KeyWriter {
        self.encryptor.source()
    }

    #[must_use]
    pub const fn reader(&self) -> &KeyReader {
        self.decryptor.resolver()
    }

    #[must_use]
    pub const fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// The shortest time a freshly issued token is guaranteed to stay decryptable:
    /// `max(max_age - freshness, freshness)`.
    ///
    /// Useful as a cookie or session lifetime.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        let remaining = self.config.max_age.saturating_sub(self.config.freshness);
        if remaining.as_nanos() > self.config.freshness.as_nanos() {
            remaining
        } else {
            self.config.freshness
        }
    }
}

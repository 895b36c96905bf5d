//! Seams between the key store and its consumers.

use crate::error::KeyStoreError;
use crate::reader::KeyReader;
use crate::record::{KeyMaterial, KeyRecord};
use crate::writer::KeyWriter;

/// Something that can hand out the current key for encryption.
pub trait KeySource: Send + Sync {
    /// # Errors
    /// Returns [`KeyStoreError`] if no current key can be produced.
    fn fresh_key(&self) -> Result<KeyRecord, KeyStoreError>;
}

/// Something that can resolve a key id for decryption.
pub trait KeyResolver: Send + Sync {
    /// # Errors
    /// Returns [`KeyStoreError::KeyNotFound`] if no usable key exists under `id`.
    fn resolve(&self, id: &[u8]) -> Result<KeyMaterial, KeyStoreError>;
}

impl KeySource for KeyWriter {
    #[inline]
    fn fresh_key(&self) -> Result<KeyRecord, KeyStoreError> {
        self.get_fresh_key()
    }
}

impl KeyResolver for KeyReader {
    #[inline]
    fn resolve(&self, id: &[u8]) -> Result<KeyMaterial, KeyStoreError> {
        self.get_key(id)
    }
}

impl<T: KeySource + ?Sized> KeySource for &T {
    fn fresh_key(&self) -> Result<KeyRecord, KeyStoreError> {
        (**self).fresh_key()
    }
}

impl<T: KeyResolver + ?Sized> KeyResolver for &T {
    fn resolve(&self, id: &[u8]) -> Result<KeyMaterial, KeyStoreError> {
        (**self).resolve(id)
    }
}

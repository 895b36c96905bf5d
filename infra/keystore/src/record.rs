use std::borrow::Borrow;
use std::fmt;
use std::time::SystemTime;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the HMAC-SHA-256 signing segment at the front of every key.
pub const SIGNING_KEY_LEN: usize = 32;

/// Supported cipher segment lengths (AES-128, AES-192, AES-256).
pub const CIPHER_KEY_LENS: [usize; 3] = [16, 24, 32];

/// Opaque key identifier. Doubles as the key's file name inside the store directory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(Vec<u8>);

impl KeyId {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&[u8]> for KeyId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<String> for KeyId {
    fn from(id: String) -> Self {
        Self(id.into_bytes())
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for KeyId {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId(\"{self}\")")
    }
}

/// Raw key bytes: `[signing key (32)][cipher key (16 | 24 | 32)]`.
///
/// Wiped from memory on drop; never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// The HMAC-SHA-256 key segment.
    #[must_use]
    pub fn signing_key(&self) -> &[u8] {
        &self.0[..SIGNING_KEY_LEN.min(self.0.len())]
    }

    /// The block cipher key segment.
    #[must_use]
    pub fn cipher_key(&self) -> &[u8] {
        &self.0[SIGNING_KEY_LEN.min(self.0.len())..]
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {}])", self.0.len())
    }
}

/// One key as held in memory, with the instant it was created or read from disk.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub id: KeyId,
    pub material: KeyMaterial,
    pub observed_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_segments() {
        let material = KeyMaterial::from((0u8..48).collect::<Vec<_>>());
        assert_eq!(material.signing_key().len(), 32);
        assert_eq!(material.cipher_key(), (32u8..48).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn short_material_does_not_panic() {
        let material = KeyMaterial::from(vec![1u8; 8]);
        assert_eq!(material.signing_key().len(), 8);
        assert!(material.cipher_key().is_empty());
    }

    #[test]
    fn debug_redacts_material() {
        let material = KeyMaterial::from(vec![0xAB; 48]);
        let printed = format!("{material:?}");
        assert!(!printed.contains("171"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn key_id_display_escapes() {
        let id = KeyId::from(b"ab\x00/c".as_slice());
        assert_eq!(id.to_string(), "ab\\x00/c");
    }
}

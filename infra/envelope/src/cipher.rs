//! AES in 8-bit CFB mode and the HMAC-SHA-256 envelope signature.
//!
//! The AES variant follows the length of the key's cipher segment: 16, 24 or 32 bytes.

use crate::error::EnvelopeError;
use crate::types::SIGNATURE_LEN;
use aes::{Aes128, Aes192, Aes256};
use cfb8::cipher::{AsyncStreamCipher, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn encrypt_in_place(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), EnvelopeError> {
    let applied = match key.len() {
        16 => cfb8::Encryptor::<Aes128>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        24 => cfb8::Encryptor::<Aes192>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        32 => cfb8::Encryptor::<Aes256>::new_from_slices(key, iv).map(|c| c.encrypt(buf)),
        len => return Err(unsupported_key(len)),
    };
    applied.map_err(|_| unsupported_key(key.len()))
}

pub(crate) fn decrypt_in_place(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), EnvelopeError> {
    let applied = match key.len() {
        16 => cfb8::Decryptor::<Aes128>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        24 => cfb8::Decryptor::<Aes192>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        32 => cfb8::Decryptor::<Aes256>::new_from_slices(key, iv).map(|c| c.decrypt(buf)),
        len => return Err(unsupported_key(len)),
    };
    applied.map_err(|_| unsupported_key(key.len()))
}

/// HMAC-SHA-256 over the concatenation of `parts`.
pub(crate) fn sign(key: &[u8], parts: &[&[u8]]) -> Result<[u8; SIGNATURE_LEN], EnvelopeError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| EnvelopeError::InvalidKey {
        message: e.to_string().into(),
        context: Some("HMAC key".into()),
    })?;
    for part in parts {
        mac.update(part);
    }

    let mut signature = [0u8; SIGNATURE_LEN];
    signature.copy_from_slice(&mac.finalize().into_bytes());
    Ok(signature)
}

fn unsupported_key(len: usize) -> EnvelopeError {
    EnvelopeError::InvalidKey {
        message: format!("Cipher key of {len} bytes, expected 16, 24 or 32").into(),
        context: Some("AES-CFB8".into()),
    }
}

#![allow(dead_code)]

use keyrot_envelope::{Decryptor, Encryptor};
use keyrot_keystore::{KeyStore, KeyStoreBuilder, WithRoot};
use tempfile::TempDir;

/// Default key id length plus marker and separator.
pub const HEADER_LEN: usize = 1 + 6 + 1;

/// A codec pair over a fresh temporary key directory.
pub struct Codec {
    pub dir: TempDir,
    pub encryptor: Encryptor,
    pub decryptor: Decryptor,
}

/// Initializes a codec with default key store settings.
/// # Panics
/// * If the key store cannot be created.
#[must_use]
pub fn setup_codec() -> Codec {
    setup_codec_with(|builder| builder)
}

/// Initializes a codec after adjusting the key store builder.
/// # Panics
/// * If the key store cannot be created.
#[must_use]
pub fn setup_codec_with(
    configure: impl FnOnce(KeyStoreBuilder<WithRoot>) -> KeyStoreBuilder<WithRoot>,
) -> Codec {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = configure(KeyStore::builder().root(dir.path())).build().expect("Key store setup failed");
    Codec { dir, encryptor: Encryptor::new(store.writer), decryptor: Decryptor::new(store.reader) }
}

/// Flips one bit of the decoded token and re-encodes it.
#[must_use]
pub fn flip_bit(token: &str, byte: usize, bit: u8) -> String {
    let mut bytes = keyrot_envelope::decode_token(token).expect("valid token");
    bytes[byte] ^= 1 << bit;
    keyrot_envelope::encode_token(&bytes)
}

/// The key id embedded in a token.
#[must_use]
pub fn key_id(token: &str) -> Vec<u8> {
    let bytes = keyrot_envelope::decode_token(token).expect("valid token");
    let end = bytes[1..].iter().position(|&b| b == 0).expect("separator") + 1;
    bytes[1..end].to_vec()
}

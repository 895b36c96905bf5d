//! Key id hygiene and fresh key generation.
//!
//! Key ids become file names, so anything that could escape the store directory or
//! address an operator file is refused before it reaches the filesystem.

use crate::error::KeyStoreError;
use crate::record::{KeyId, KeyMaterial};

/// File names starting with this prefix are never keys (lockfiles, temp files, ...).
pub const HIDDEN_PREFIX: u8 = b'.';

/// Length of minted key ids.
pub const KEY_ID_LEN: usize = 6;

/// Longest id that can name a key file (the common `NAME_MAX`).
pub const MAX_KEY_ID_LEN: usize = 255;

/// URL-safe, filename-safe alphabet for minted key ids.
const KEY_ID_ALPHABET: [char; 64] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j',
    'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1',
    '2', '3', '4', '5', '6', '7', '8', '9', '-', '_',
];

/// Returns the id as a file name if it can safely name a key file.
///
/// Rejected: empty ids, ids longer than [`MAX_KEY_ID_LEN`], ids starting with
/// [`HIDDEN_PREFIX`], ids containing `/`, `\` or NUL, and ids that are not UTF-8.
pub(crate) fn key_file_name(id: &[u8]) -> Option<&str> {
    let (&first, _) = id.split_first()?;
    if id.len() > MAX_KEY_ID_LEN
        || first == HIDDEN_PREFIX || id.iter().any(|b| matches!(b, b'/' | b'\\' | 0)) {
        return None;
    }
    std::str::from_utf8(id).ok()
}

/// Whether a directory entry name belongs to the operator rather than the store.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.as_bytes().first() == Some(&HIDDEN_PREFIX)
}

pub(crate) fn mint_key_id() -> KeyId {
    KeyId::from(nanoid::nanoid!(KEY_ID_LEN, &KEY_ID_ALPHABET))
}

pub(crate) fn mint_material(length: usize) -> Result<KeyMaterial, KeyStoreError> {
    let mut bytes = vec![0u8; length];
    getrandom::fill(&mut bytes).map_err(|e| KeyStoreError::Entropy {
        message: e.to_string().into(),
        context: Some("Generating key material".into()),
    })?;
    Ok(KeyMaterial::from(bytes))
}

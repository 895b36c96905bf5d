use crate::error::DecryptionFailure;
use flate2::Compression;

// --- Envelope format constants ---

/// First byte of every envelope.
pub const FORMAT_MARKER: u8 = 0x00;

/// Terminates the key id.
pub const SEPARATOR: u8 = 0x00;

/// HMAC-SHA-256 output length.
pub const SIGNATURE_LEN: usize = 32;

/// Initialization vector length (one AES block).
pub const IV_LEN: usize = 16;

/// Plaintext flag: packed payload follows as is.
pub const FLAG_RAW: u8 = 0;

/// Plaintext flag: packed payload follows as a zlib stream.
pub const FLAG_ZLIB: u8 = 1;

/// zlib level used unless the caller asks otherwise.
pub const DEFAULT_COMPRESS_LEVEL: u32 = 6;

const MAX_COMPRESS_LEVEL: u32 = 9;

// --- Options ---

/// Per-call encryption knobs.
///
/// The compressed form is used when it is not longer than the packed payload, or
/// always when `always_compress` is set. `compress_level` follows zlib (0-9); larger
/// values are clamped to 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptOptions {
    pub always_compress: bool,
    pub compress_level: u32,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self { always_compress: false, compress_level: DEFAULT_COMPRESS_LEVEL }
    }
}

impl EncryptOptions {
    #[must_use]
    pub const fn always_compress(mut self, enabled: bool) -> Self {
        self.always_compress = enabled;
        self
    }

    #[must_use]
    pub const fn compress_level(mut self, level: u32) -> Self {
        self.compress_level = level;
        self
    }

    pub(crate) fn compression(self) -> Compression {
        Compression::new(self.compress_level.min(MAX_COMPRESS_LEVEL))
    }
}

// --- Framing ---

/// A decoded envelope split into its fields, before any verification.
///
/// ```text
/// [MARKER(1)][KEY ID(k)][SEPARATOR(1)][SIGNATURE(32)][IV(16)][CIPHERTEXT(N)]
/// ```
///
/// `signed` covers IV and ciphertext. Envelopes too short to hold a full signature
/// keep whatever is there in `signature` and an empty `signed` region, so they fail
/// verification instead of parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Envelope<'a> {
    pub(crate) key_id: &'a [u8],
    pub(crate) signature: &'a [u8],
    pub(crate) signed: &'a [u8],
}

impl<'a> Envelope<'a> {
    pub(crate) fn parse(bytes: &'a [u8]) -> Result<Self, DecryptionFailure> {
        let Some((&marker, rest)) = bytes.split_first() else {
            return Err(DecryptionFailure::InvalidFormat);
        };
        if marker != FORMAT_MARKER {
            return Err(DecryptionFailure::UnknownFormat);
        }

        let end = rest.iter().position(|&b| b == SEPARATOR).ok_or(DecryptionFailure::KeyIdMissing)?;
        let (key_id, rest) = (&rest[..end], &rest[end + 1..]);
        let (signature, signed) = rest.split_at(rest.len().min(SIGNATURE_LEN));

        Ok(Self { key_id, signature, signed })
    }

    /// Splits the signed region into IV and ciphertext.
    pub(crate) fn iv_and_ciphertext(&self) -> Option<(&'a [u8], &'a [u8])> {
        (self.signed.len() >= IV_LEN).then(|| self.signed.split_at(IV_LEN))
    }
}

pub(crate) fn assemble(key_id: &[u8], signature: &[u8], iv: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + key_id.len() + signature.len() + iv.len() + ciphertext.len());
    buf.push(FORMAT_MARKER);
    buf.extend_from_slice(key_id);
    buf.push(SEPARATOR);
    buf.extend_from_slice(signature);
    buf.extend_from_slice(iv);
    buf.extend_from_slice(ciphertext);
    buf
}

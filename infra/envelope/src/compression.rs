use crate::error::{DecryptionFailure, EnvelopeError};
use crate::types::{EncryptOptions, FLAG_RAW, FLAG_ZLIB};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Builds the flagged plaintext `[FLAG(1)][PACKED | ZLIB(PACKED)]`.
pub(crate) fn frame(packed: &[u8], options: EncryptOptions) -> Result<Vec<u8>, EnvelopeError> {
    let mut out = Vec::with_capacity(packed.len() + 1);
    out.push(FLAG_ZLIB);
    let mut encoder = ZlibEncoder::new(out, options.compression());
    let compressed = encoder.write_all(packed).and_then(|()| encoder.finish()).map_err(|e| {
        EnvelopeError::Encryption {
            message: e.to_string().into(),
            context: Some("zlib compression".into()),
        }
    })?;

    if options.always_compress || compressed.len() - 1 <= packed.len() {
        return Ok(compressed);
    }

    let mut raw = Vec::with_capacity(packed.len() + 1);
    raw.push(FLAG_RAW);
    raw.extend_from_slice(packed);
    Ok(raw)
}

/// Upper bound on an inflated payload.
pub(crate) const MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

/// Strips the flag and inflates if needed.
pub(crate) fn unframe(plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    unframe_within(plaintext, MAX_INFLATED_LEN)
}

fn unframe_within(plaintext: &[u8], limit: usize) -> Result<Vec<u8>, EnvelopeError> {
    match plaintext.split_first() {
        Some((&FLAG_RAW, packed)) => Ok(packed.to_vec()),
        Some((&FLAG_ZLIB, compressed)) => {
            let mut packed = Vec::with_capacity(compressed.len().saturating_mul(4).min(limit));
            ZlibDecoder::new(compressed)
                .take(u64::try_from(limit).map_or(u64::MAX, |limit| limit.saturating_add(1)))
                .read_to_end(&mut packed)
                .map_err(|e| {
                    EnvelopeError::rejected(DecryptionFailure::Decompression, e.to_string())
                })?;
            if packed.len() > limit {
                return Err(EnvelopeError::rejected(
                    DecryptionFailure::Decompression,
                    format!("inflated payload exceeds {limit} bytes"),
                ));
            }
            Ok(packed)
        },
        Some((flag, _)) => Err(EnvelopeError::rejected(
            DecryptionFailure::UnknownCompressor,
            format!("unknown compressor: {flag}"),
        )),
        None => Err(EnvelopeError::rejected(
            DecryptionFailure::UnknownCompressor,
            "unknown compressor: empty plaintext",
        )),
    }
}

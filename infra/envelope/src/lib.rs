//! Signed, encrypted, URL-safe envelopes for short structured payloads.
//!
//! An [`Encryptor`] takes the current key from a [`KeySource`] (normally a
//! [`KeyWriter`](keyrot_keystore::KeyWriter)); a [`Decryptor`] resolves the key named
//! inside a token through a [`KeyResolver`] (normally a
//! [`KeyReader`](keyrot_keystore::KeyReader)). The two sides share nothing but the key
//! directory.
//!
//! ## Envelope Format
//!
//! Tokens are URL-safe base64 without padding over:
//!
//! ```text
//! [0x00][KEY ID][0x00][HMAC-SHA-256(IV || CIPHERTEXT)(32)][IV(16)][CIPHERTEXT(N)]
//! ```
//!
//! The ciphertext is AES in 8-bit CFB mode over the flagged plaintext:
//!
//! ```text
//! [FLAG(1): 0 = raw, 1 = zlib][MESSAGEPACK PAYLOAD]
//! ```
//!
//! ## Compression Threat Model
//!
//! Compression runs **before encryption** and is chosen whenever it does not grow the
//! payload. Token length can therefore reveal how compressible the payload was. Do not
//! mix secrets with attacker-controlled text inside one payload if token sizes are
//! observable.
//!
//! ## Example
//!
//! ```rust
//! use keyrot_envelope::{DecryptionFailure, Decryptor, EncryptOptions, Encryptor, Payload};
//! use keyrot_keystore::KeyStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let tmp = tempfile::tempdir()?;
//! let store = KeyStore::builder().root(tmp.path()).build()?;
//! let encryptor = Encryptor::new(store.writer);
//! let decryptor = Decryptor::new(store.reader);
//!
//! let claims = Payload::Map(vec![
//!     (Payload::from("sub"), Payload::from("ada")),
//!     (Payload::from("exp"), Payload::from(1_700_000_000_i64)),
//! ]);
//! let token = encryptor.encrypt_with(&claims, EncryptOptions::default().always_compress(true))?;
//! assert_eq!(decryptor.decrypt(&token)?, claims);
//!
//! let err = decryptor.decrypt("BBBB").unwrap_err();
//! assert_eq!(err.decryption_failure(), Some(DecryptionFailure::UnknownFormat));
//! # Ok(())
//! # }
//! ```

mod cipher;
mod compare;
mod compression;
mod decryptor;
mod encoding;
mod encryptor;
mod error;
mod payload;
mod types;

pub use compare::uniform_time_eq;
pub use decryptor::Decryptor;
pub use encoding::{decode_token, encode_token};
pub use encryptor::Encryptor;
pub use error::{DecryptionFailure, EnvelopeError, EnvelopeErrorExt};
pub use keyrot_keystore::{KeyResolver, KeySource};
pub use payload::Payload;
pub use types::{
    DEFAULT_COMPRESS_LEVEL, EncryptOptions, FLAG_RAW, FLAG_ZLIB, FORMAT_MARKER, IV_LEN, SEPARATOR,
    SIGNATURE_LEN,
};
pub use zeroize::Zeroizing;

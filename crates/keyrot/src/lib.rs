//! # keyrot
//!
//! Envelope encryption for short structured payloads (session cookies, signed
//! tokens) under random keys that rotate on their own.
//!
//! Keys live as files in one directory. The writer side reuses its key while it is
//! fresh and otherwise adopts or mints a newer one, pruning expired files as it goes.
//! The reader side resolves any unexpired key named in a token. Any number of
//! instances and processes can share the directory without further coordination.
//!
//! ## Crates
//!
//! * [`keystore`]: key files, rotation, pruning and the read-through key cache.
//! * [`envelope`]: the signed, encrypted, URL-safe token format.
//!
//! ## Example
//!
//! ```rust
//! use keyrot::{DecryptionFailure, Payload, RandomEncryption};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let tmp = tempfile::tempdir()?;
//! let engine = RandomEncryption::open(tmp.path())?;
//!
//! let token = engine.encrypt(&Payload::from(vec![Payload::from(1), Payload::from("two")]))?;
//! assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
//!
//! let err = engine.decrypt("\0spam").unwrap_err();
//! assert_eq!(err.decryption_failure(), Some(DecryptionFailure::InvalidFormat));
//! # Ok(())
//! # }
//! ```

mod engine;
mod settings;

pub use engine::RandomEncryption;
pub use settings::{ConfigError, ConfigErrorExt, ENV_PREFIX, Settings, load_settings};

pub use keyrot_envelope as envelope;
pub use keyrot_keystore as keystore;

pub use keyrot_envelope::{DecryptionFailure, EncryptOptions, EnvelopeError, Payload};
pub use keyrot_keystore::{KeyStore, KeyStoreConfig, KeyStoreError};

pub mod prelude {
    pub use crate::{
        DecryptionFailure, EncryptOptions, EnvelopeError, KeyStoreConfig, KeyStoreError, Payload,
        RandomEncryption, Settings,
    };
}

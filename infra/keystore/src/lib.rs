//! A directory of automatically rotated random symmetric keys.
//!
//! Every key lives in its own file inside one directory: the file name is the key id,
//! the file content is the raw key material, and the file modification time is the
//! key's age clock. No index, lock file or database sits beside the keys, so any
//! number of processes sharing the directory cooperate through the filesystem alone.
//!
//! ## Roles
//!
//! - [`KeyWriter`] hands out the current key and rotates it once it is older than
//!   `freshness`, pruning keys older than `max_age` along the way.
//! - [`KeyReader`] resolves ids back to key material and caches what it has read.
//!
//! ## Key layout
//!
//! ```text
//! [SIGNING KEY(32)][CIPHER KEY(16 | 24 | 32)]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use keyrot_keystore::{KeyStore, KeyStoreError};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), KeyStoreError> {
//! # let tmp = tempfile::tempdir().unwrap();
//! let store = KeyStore::builder()
//!     .root(tmp.path())
//!     .freshness(Duration::from_secs(60))
//!     .build()?;
//!
//! let current = store.writer.get_fresh_key()?;
//! let resolved = store.reader.get_key(current.id.as_bytes())?;
//! assert_eq!(current.material, resolved);
//!
//! assert!(store.reader.get_key(b"no-such-key").unwrap_err().is_not_found());
//! # Ok(())
//! # }
//! ```

mod builder;
mod clock;
mod config;
mod error;
mod maintenance;
mod reader;
mod record;
mod security;
mod source;
mod writer;

pub use builder::{KeyStore, KeyStoreBuilder, NoRoot, WithRoot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_FRESHNESS, DEFAULT_LENGTH, DEFAULT_MAX_AGE, DEFAULT_MAX_FUTURE, KeyStoreConfig,
};
pub use error::{KeyStoreError, KeyStoreErrorExt};
pub use reader::{DEFAULT_CACHE_CAPACITY, KeyReader, KeyReaderInner};
pub use record::{CIPHER_KEY_LENS, KeyId, KeyMaterial, KeyRecord, SIGNING_KEY_LEN};
pub use security::{HIDDEN_PREFIX, KEY_ID_LEN, MAX_KEY_ID_LEN};
pub use source::{KeyResolver, KeySource};
pub use writer::{KeyWriter, KeyWriterInner};

use crate::clock::age_of;
use crate::error::KeyStoreError;
use crate::record::{CIPHER_KEY_LENS, SIGNING_KEY_LEN};
use std::time::{Duration, SystemTime};
use tracing::warn;

/// Default key material length: a 32-byte signing key plus an AES-128 key.
pub const DEFAULT_LENGTH: usize = 48;
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_FUTURE: Duration = Duration::from_secs(300);

/// Timing and sizing parameters shared by [`KeyWriter`](crate::KeyWriter) and
/// [`KeyReader`](crate::KeyReader).
///
/// - `length`: bytes of key material, split into a 32-byte signing key and a cipher key.
/// - `freshness`: age after which the writer mints a new current key.
/// - `max_age`: age after which any key is unusable and its file prunable.
/// - `max_future`: tolerated clock skew for key files dated in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStoreConfig {
    pub length: usize,
    pub freshness: Duration,
    pub max_age: Duration,
    pub max_future: Duration,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            freshness: DEFAULT_FRESHNESS,
            max_age: DEFAULT_MAX_AGE,
            max_future: DEFAULT_MAX_FUTURE,
        }
    }
}

impl KeyStoreConfig {
    /// Checks that the material length splits into a signing key and an AES key.
    ///
    /// A `freshness` above `max_age` is legal (keys rotate faster than they expire,
    /// which is only wasteful) and merely logged.
    ///
    /// # Errors
    /// Returns [`KeyStoreError::InvalidConfiguration`] for an unsupported `length`.
    pub fn validate(&self) -> Result<(), KeyStoreError> {
        let cipher_len = self.length.checked_sub(SIGNING_KEY_LEN);
        if !cipher_len.is_some_and(|len| CIPHER_KEY_LENS.contains(&len)) {
            return Err(KeyStoreError::InvalidConfiguration {
                message: format!(
                    "Key length {} is not {SIGNING_KEY_LEN} + one of {CIPHER_KEY_LENS:?}",
                    self.length
                )
                .into(),
                context: Some("length".into()),
            });
        }

        if self.freshness > self.max_age {
            warn!(
                freshness = self.freshness.as_secs(),
                max_age = self.max_age.as_secs(),
                "Keys will rotate faster than they expire"
            );
        }

        Ok(())
    }

    /// Whether a key observed at `then` is past `max_age`, or dated further into the
    /// future than `max_future` allows.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime, then: SystemTime) -> bool {
        match age_of(now, then) {
            Ok(age) => age > self.max_age,
            Err(skew) => skew > self.max_future,
        }
    }

    /// Whether a key observed at `then` may still serve as the current key.
    ///
    /// Keys dated in the future never count as fresh: they are still resolvable within
    /// `max_future`, but the writer will not adopt them as current.
    #[must_use]
    pub fn is_fresh(&self, now: SystemTime, then: SystemTime) -> bool {
        age_of(now, then).is_ok_and(|age| age <= self.freshness)
    }
}

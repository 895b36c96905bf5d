//! The resolving side of the key store.

use crate::clock::Clock;
use crate::config::KeyStoreConfig;
use crate::error::{KeyStoreError, KeyStoreErrorExt};
use crate::record::{KeyId, KeyMaterial};
use crate::security::key_file_name;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{trace, warn};

/// Default upper bound on cached keys per reader.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug)]
struct CachedKey {
    material: KeyMaterial,
    /// Modification time of the key file, so expiry counts from key creation.
    modified: SystemTime,
}

/// The internal shared state of a [`KeyReader`].
#[derive(Debug)]
pub struct KeyReaderInner {
    /// The canonicalized store directory.
    pub(crate) root: PathBuf,
    pub(crate) config: KeyStoreConfig,
    pub(crate) clock: Arc<dyn Clock>,
    cache: Mutex<FxHashMap<KeyId, CachedKey>>,
    capacity: usize,
}

/// Resolves key ids to key material, with an in-memory cache per instance.
///
/// Every failure to produce a usable key (malformed id, unknown id, expired or
/// future-dated key, corrupted file) is reported as the same
/// [`KeyStoreError::KeyNotFound`]. Only genuine filesystem failures surface as
/// [`KeyStoreError::Io`].
///
/// Ids are raw bytes; text is rejected at compile time:
///
/// ```rust,compile_fail
/// # use keyrot_keystore::KeyStore;
/// # let tmp = tempfile::tempdir().unwrap();
/// let reader = KeyStore::builder().root(tmp.path()).reader().unwrap();
/// let _ = reader.get_key("spam");
/// ```
#[derive(Debug, Clone)]
pub struct KeyReader {
    inner: Arc<KeyReaderInner>,
}

impl Deref for KeyReader {
    type Target = KeyReaderInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl KeyReader {
    pub(crate) fn new(
        root: PathBuf,
        config: KeyStoreConfig,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(KeyReaderInner {
                root,
                config,
                clock,
                cache: Mutex::new(FxHashMap::default()),
                capacity: capacity.max(1),
            }),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Number of keys currently held in the cache.
    #[must_use]
    pub fn cached_keys(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Resolves `id` to its key material.
    ///
    /// Validation happens before any filesystem access: ids that are empty, start with
    /// the hidden prefix, contain `/`, `\` or NUL, or are not UTF-8 are never looked up.
    /// Names the filesystem refuses (too long for a file name, say) count as unknown.
    ///
    /// A cached key remembers the modification time of its file rather than the time
    /// it was cached, so its age always counts from key creation, the same clock the
    /// writer prunes by. Cached keys are re-checked against `max_age` on every lookup
    /// and evicted once expired.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyNotFound`] if no usable key exists under `id`.
    /// Returns [`KeyStoreError::Io`] if the key file exists but cannot be read.
    pub fn get_key(&self, id: &[u8]) -> Result<KeyMaterial, KeyStoreError> {
        let Some(name) = key_file_name(id) else {
            trace!(key_id = %id.escape_ascii(), "Rejected malformed key id");
            return Err(KeyStoreError::not_found(id.escape_ascii()));
        };

        let now = self.clock.now();
        let mut cache = self.cache.lock();

        if let Some(cached) = cache.get(id) {
            if !self.config.is_expired(now, cached.modified) {
                trace!(key_id = name, "Key cache hit");
                return Ok(cached.material.clone());
            }
            cache.remove(id);
            trace!(key_id = name, "Evicted expired key from cache");
            return Err(KeyStoreError::not_found(name));
        }

        let (material, modified) = self.load(name, now)?;
        self.remember(&mut cache, KeyId::from(id), material.clone(), modified, now);

        Ok(material)
    }

    fn load(&self, name: &str, now: SystemTime) -> Result<(KeyMaterial, SystemTime), KeyStoreError> {
        let path = self.root.join(name);

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::NotFound | ErrorKind::InvalidFilename | ErrorKind::NotADirectory
                ) =>
            {
                trace!(key_id = name, error = %e, "No such key file");
                return Err(KeyStoreError::not_found(name));
            },
            Err(e) => {
                return Err(KeyStoreError::Io {
                    source: e,
                    context: Some(format!("Open failed: {}", path.display()).into()),
                });
            },
        };

        let meta = file.metadata().context(format!("Metadata failed: {}", path.display()))?;
        if !meta.is_file() {
            return Err(KeyStoreError::not_found(name));
        }

        let modified = meta.modified().context("File modification time unavailable")?;
        if self.config.is_expired(now, modified) {
            if modified > now {
                warn!(key_id = name, "Rejecting key file dated in the future");
            } else {
                trace!(key_id = name, "Key file expired");
            }
            return Err(KeyStoreError::not_found(name));
        }

        let expected = self.config.length;
        let mut bytes = Vec::with_capacity(expected);
        file.read_to_end(&mut bytes).context(format!("Read failed: {}", path.display()))?;
        if bytes.len() != expected {
            warn!(key_id = name, len = bytes.len(), expected, "Rejecting key file with unexpected length");
            return Err(KeyStoreError::not_found(name));
        }

        Ok((KeyMaterial::from(bytes), modified))
    }

    /// Inserts into the cache, sweeping expired entries and then evicting the oldest
    /// ones when the cache is full.
    fn remember(
        &self,
        cache: &mut FxHashMap<KeyId, CachedKey>,
        id: KeyId,
        material: KeyMaterial,
        modified: SystemTime,
        now: SystemTime,
    ) {
        if cache.len() >= self.capacity {
            cache.retain(|_, cached| !self.config.is_expired(now, cached.modified));
        }
        while cache.len() >= self.capacity {
            let Some(oldest) =
                cache.iter().min_by_key(|(_, cached)| cached.modified).map(|(id, _)| id.clone())
            else {
                break;
            };
            cache.remove(&oldest);
        }

        cache.insert(id, CachedKey { material, modified });
    }
}

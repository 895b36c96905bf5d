//! The producing side of the key store.
//!
//! A [`KeyWriter`] hands out the current key and rotates it once it is older than
//! `freshness`. Rotation first sweeps the directory (see [`KeyWriter::prune`]), then
//! either adopts a sufficiently fresh key minted by another process or mints and
//! persists a new one.

use crate::clock::Clock;
use crate::config::KeyStoreConfig;
use crate::error::{KeyStoreError, KeyStoreErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::record::{KeyId, KeyMaterial, KeyRecord};
use crate::security::{mint_key_id, mint_material};
use parking_lot::Mutex;
use std::fs;
use std::io::{ErrorKind, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{debug, warn};

/// The internal shared state of a [`KeyWriter`].
#[derive(Debug)]
pub struct KeyWriterInner {
    /// The canonicalized store directory.
    pub(crate) root: PathBuf,
    pub(crate) config: KeyStoreConfig,
    pub(crate) clock: Arc<dyn Clock>,
    /// The current key. Held locked across rotation so one instance never mints twice.
    current: Mutex<Option<KeyRecord>>,
    /// Uniquifies temp file names within this process.
    tmp_counter: AtomicU64,
}

/// Produces the current signing/ciphering key, rotating and persisting as needed.
///
/// Internally reference-counted; clones share the same current key.
///
/// # Example
///
/// ```rust
/// use keyrot_keystore::{KeyStore, KeyStoreError};
///
/// # fn main() -> Result<(), KeyStoreError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// let writer = KeyStore::builder().root(tmp.path()).writer()?;
///
/// let first = writer.get_fresh_key()?;
/// let second = writer.get_fresh_key()?;
/// assert_eq!(first.id, second.id);
/// assert_eq!(std::fs::read(tmp.path().join(first.id.to_string())).unwrap(), first.material.as_bytes());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KeyWriter {
    inner: Arc<KeyWriterInner>,
}

impl Deref for KeyWriter {
    type Target = KeyWriterInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl KeyWriter {
    pub(crate) fn new(root: PathBuf, config: KeyStoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(KeyWriterInner {
                root,
                config,
                clock,
                current: Mutex::new(None),
                tmp_counter: AtomicU64::new(1),
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

    /// Returns the current key, rotating first if it is older than `freshness`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] if the store cannot be swept or the new key cannot
    /// be persisted, and [`KeyStoreError::Entropy`] if the system RNG is unavailable.
    pub fn get_fresh_key(&self) -> Result<KeyRecord, KeyStoreError> {
        let mut current = self.current.lock();
        let now = self.clock.now();

        if let Some(record) =
            current.as_ref().filter(|record| self.config.is_fresh(now, record.observed_at))
        {
            return Ok(record.clone());
        }

        let sweep = maintenance::sweep(&self.root, &self.config, now)?;
        let adopted = match sweep.newest {
            Some((path, name, modified)) => self.adopt(&path, name, modified, now)?,
            None => None,
        };
        let record = match adopted {
            Some(record) => record,
            None => self.mint(now)?,
        };

        *current = Some(record.clone());
        Ok(record)
    }

    /// Deletes key files older than `max_age` along with stale orphaned temp files.
    ///
    /// Entries whose names start with the hidden prefix are otherwise left untouched.
    /// Returns the number of files removed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] if the directory cannot be scanned or an expired
    /// file cannot be deleted. Files already removed by another writer are skipped.
    pub fn prune(&self) -> Result<usize, KeyStoreError> {
        Ok(maintenance::sweep(&self.root, &self.config, self.clock.now())?.removed)
    }

    /// Takes over a key persisted by another writer if it may still serve as current.
    fn adopt(
        &self,
        path: &Path,
        name: String,
        modified: SystemTime,
        now: SystemTime,
    ) -> Result<Option<KeyRecord>, KeyStoreError> {
        if !self.config.is_fresh(now, modified) {
            return Ok(None);
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeyStoreError::Io {
                    source: e,
                    context: Some(format!("Read failed: {}", path.display()).into()),
                });
            },
        };

        if bytes.len() != self.config.length {
            warn!(key_id = %name, len = bytes.len(), "Skipping key file with unexpected length");
            return Ok(None);
        }

        debug!(key_id = %name, "Adopted current key from store");
        Ok(Some(KeyRecord {
            id: KeyId::from(name),
            material: KeyMaterial::from(bytes),
            observed_at: modified,
        }))
    }

    fn mint(&self, now: SystemTime) -> Result<KeyRecord, KeyStoreError> {
        let id = mint_key_id();
        let material = mint_material(self.config.length)?;

        self.persist(&id, &material)?;
        debug!(key_id = %id, "Rotated to a new current key");

        Ok(KeyRecord { id, material, observed_at: now })
    }

    /// Writes a key file without ever replacing an existing one.
    ///
    /// The material goes to a hidden temp file first (written and synced), which is
    /// then hard-linked under its final name, so readers never observe a partial key.
    /// An existing file under the same id means another writer won the race.
    fn persist(&self, id: &KeyId, material: &KeyMaterial) -> Result<(), KeyStoreError> {
        let target = self.root.join(id.to_string());
        let temp = self.tmp_path(id);

        write_new(&temp, material.as_bytes())?;

        let linked = fs::hard_link(&temp, &target);
        if let Err(e) = fs::remove_file(&temp) {
            warn!(path = %temp.display(), error = %e, "Failed to remove temp key file");
        }

        match linked {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(key_id = %id, "Key file already exists, keeping the first copy");
            },
            Err(e) => {
                debug!(error = %e, "Hard link unavailable, creating key file in place");
                match write_new(&target, material.as_bytes()) {
                    Err(KeyStoreError::Io { source, .. })
                        if source.kind() == ErrorKind::AlreadyExists =>
                    {
                        debug!(key_id = %id, "Key file already exists, keeping the first copy");
                    },
                    other => other?,
                }
            },
        }

        sync_dir(&self.root);
        Ok(())
    }

    fn tmp_path(&self, id: &KeyId) -> PathBuf {
        let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{TMP_MARKER}{id}.{}.{counter}", std::process::id()))
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> Result<(), KeyStoreError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file =
        options.open(path).context(format!("Key file creation failed: {}", path.display()))?;
    file.write_all(bytes).context("Write failed")?;
    file.sync_all().context("Hardware sync failed")?;
    Ok(())
}

#[cfg(unix)]
fn sync_dir(path: &Path) {
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

#[cfg(not(unix))]
const fn sync_dir(_path: &Path) {}

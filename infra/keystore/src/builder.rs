use crate::clock::{Clock, SystemClock};
use crate::config::KeyStoreConfig;
use crate::error::{KeyStoreError, KeyStoreErrorExt};
use crate::reader::{DEFAULT_CACHE_CAPACITY, KeyReader};
use crate::writer::KeyWriter;
use private::Sealed;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// A writer and a reader over the same store directory.
#[derive(Debug, Clone)]
pub struct KeyStore {
    pub writer: KeyWriter,
    pub reader: KeyReader,
}

impl KeyStore {
    #[must_use = "Creates a new key store builder with default configuration"]
    pub fn builder() -> KeyStoreBuilder {
        KeyStoreBuilder::new()
    }
}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct KeyStoreBuilder<S: Sealed = NoRoot> {
    state: S,
    config: KeyStoreConfig,
    clock: Arc<dyn Clock>,
    create: bool,
    cache_capacity: usize,
}

impl Default for KeyStoreBuilder<NoRoot> {
    fn default() -> Self {
        Self {
            state: NoRoot,
            config: KeyStoreConfig::default(),
            clock: Arc::new(SystemClock),
            create: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> KeyStoreBuilder<S> {
    #[must_use = "Sets the key material length in bytes"]
    pub const fn length(mut self, length: usize) -> Self {
        self.config.length = length;
        self
    }

    #[must_use = "Sets the age after which the current key is rotated"]
    pub const fn freshness(mut self, freshness: Duration) -> Self {
        self.config.freshness = freshness;
        self
    }

    #[must_use = "Sets the age after which keys are unusable"]
    pub const fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    #[must_use = "Sets the tolerated clock skew for future-dated keys"]
    pub const fn max_future(mut self, max_future: Duration) -> Self {
        self.config.max_future = max_future;
        self
    }

    #[must_use = "Replaces the whole timing and sizing configuration"]
    pub const fn config(mut self, config: KeyStoreConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "Sets the clock used for every age decision"]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use = "Sets whether the store directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }

    #[must_use = "Sets the maximum number of keys a reader keeps in memory"]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> KeyStoreBuilder<N> {
        KeyStoreBuilder {
            state,
            config: self.config,
            clock: self.clock,
            create: self.create,
            cache_capacity: self.cache_capacity,
        }
    }
}

impl KeyStoreBuilder<NoRoot> {
    #[must_use = "Creates a new key store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the directory holding the key files"]
    pub fn root(self, path: impl Into<PathBuf>) -> KeyStoreBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl KeyStoreBuilder<WithRoot> {
    /// Builds the producing side only.
    ///
    /// # Errors
    /// See [`KeyStoreBuilder::build`].
    pub fn writer(self) -> Result<KeyWriter, KeyStoreError> {
        let root = self.prepare()?;
        Ok(KeyWriter::new(root, self.config, self.clock))
    }

    /// Builds the resolving side only.
    ///
    /// # Errors
    /// See [`KeyStoreBuilder::build`].
    pub fn reader(self) -> Result<KeyReader, KeyStoreError> {
        let root = self.prepare()?;
        Ok(KeyReader::new(root, self.config, self.clock, self.cache_capacity))
    }

    /// Validates the configuration, bootstraps the store directory and returns both
    /// halves sharing one clock.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidConfiguration`] for an unsupported key length.
    /// Returns [`KeyStoreError::Io`] if the directory cannot be created or resolved
    /// (including when it is missing and `create(false)` was set).
    pub fn build(self) -> Result<KeyStore, KeyStoreError> {
        let root = self.prepare()?;
        Ok(KeyStore {
            writer: KeyWriter::new(root.clone(), self.config, Arc::clone(&self.clock)),
            reader: KeyReader::new(root, self.config, self.clock, self.cache_capacity),
        })
    }

    fn prepare(&self) -> Result<PathBuf, KeyStoreError> {
        self.config.validate()?;
        let root = &self.state.0;

        if self.create && !root.is_dir() {
            create_root(root)?;
            info!(path = %root.display(), "Bootstrapped key store directory");
        }

        std::fs::canonicalize(root)
            .context(format!("Failed to resolve key store root: {}", root.display()))
    }
}

fn create_root(root: &Path) -> Result<(), KeyStoreError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(root).context(format!("Failed to bootstrap key store root: {}", root.display()))
}

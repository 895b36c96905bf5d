use crate::clock::age_of;
use crate::config::KeyStoreConfig;
use crate::error::KeyStoreError;
use crate::security::{is_hidden, key_file_name};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

/// Marker embedded in the names of in-flight key files.
pub(crate) const TMP_MARKER: &str = ".keyrot-tmp.";

/// Outcome of one pass over the store directory.
#[derive(Debug, Default)]
pub(crate) struct Sweep {
    pub(crate) removed: usize,
    /// The most recently modified key file that survived the pass.
    pub(crate) newest: Option<(PathBuf, String, SystemTime)>,
}

/// Deletes expired key files and stale orphaned temp files, leaving every other hidden
/// entry alone.
///
/// Entries that vanish mid-pass were pruned by a concurrent writer and are skipped.
/// Any other filesystem failure aborts the pass.
pub(crate) fn sweep(
    root: &Path,
    config: &KeyStoreConfig,
    now: SystemTime,
) -> Result<Sweep, KeyStoreError> {
    let mut sweep = Sweep::default();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 && is_vanished(&e) => continue,
            Err(e) => return Err(io_failure(io::Error::from(e), "Directory scan failed", root)),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        let is_key = !is_hidden(name) && key_file_name(name.as_bytes()).is_some();
        let is_orphan = name.starts_with(TMP_MARKER);
        if !is_key && !is_orphan {
            continue;
        }

        let modified = match modified(&entry) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(io_failure(e, "Metadata failed", entry.path())),
        };

        match age_of(now, modified) {
            Ok(age) if age > config.max_age => {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => sweep.removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {},
                    Err(e) => return Err(io_failure(e, "Prune failed", entry.path())),
                }
                continue;
            },
            Err(skew) if is_key && skew > config.max_future => {
                warn!(key_id = name, skew = skew.as_secs(), "Ignoring key file dated in the future");
                continue;
            },
            _ => {},
        }

        if is_key && sweep.newest.as_ref().is_none_or(|(_, _, newest)| modified > *newest) {
            sweep.newest = Some((entry.path().to_path_buf(), name.to_owned(), modified));
        }
    }

    if sweep.removed > 0 {
        info!(removed = sweep.removed, "Pruned expired keys");
    }

    Ok(sweep)
}

fn modified(entry: &DirEntry) -> io::Result<SystemTime> {
    entry.metadata().map_err(io::Error::from)?.modified()
}

fn is_vanished(err: &walkdir::Error) -> bool {
    err.io_error().is_some_and(|e| e.kind() == ErrorKind::NotFound)
}

fn io_failure(source: io::Error, what: &str, path: &Path) -> KeyStoreError {
    KeyStoreError::Io { source, context: Some(format!("{what}: {}", path.display()).into()) }
}

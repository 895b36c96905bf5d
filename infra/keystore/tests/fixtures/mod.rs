#![allow(dead_code)]

use keyrot_keystore::{KeyStore, KeyStoreBuilder, WithRoot};
use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const KEY_LEN: usize = 48;

/// A builder rooted in a fresh temporary directory.
#[must_use]
pub fn store_builder() -> (TempDir, KeyStoreBuilder<WithRoot>) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let builder = KeyStore::builder().root(tmp.path());
    (tmp, builder)
}

/// Writes `bytes` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write file");
    path
}

/// Moves a file's modification time `by` into the past.
pub fn backdate(path: &Path, by: Duration) {
    set_mtime(path, SystemTime::now() - by);
}

/// Moves a file's modification time `by` into the future.
pub fn postdate(path: &Path, by: Duration) {
    set_mtime(path, SystemTime::now() + by);
}

fn set_mtime(path: &Path, at: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(at))
        .expect("set mtime");
}

/// Names of all directory entries, sorted.
#[must_use]
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

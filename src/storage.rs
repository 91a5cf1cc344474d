// File: ./src/storage.rs
// Locked, atomic file access shared by config saving and note rewriting.
use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

pub struct LocalStorage;

impl LocalStorage {
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut name = file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        file_path.with_file_name(name)
    }

    /// Lock file for `file_path` inside `lock_dir`, so files we do not own
    /// (user notes) get no sibling lock. The name is stable per absolute path.
    pub fn lock_path_in(lock_dir: &Path, file_path: &Path) -> PathBuf {
        let absolute = fs::canonicalize(file_path).unwrap_or_else(|_| file_path.to_path_buf());
        let mut hasher = DefaultHasher::new();
        absolute.hash(&mut hasher);
        let stem = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        lock_dir.join(format!("{}-{:016x}.lock", stem, hasher.finish()))
    }

    /// Runs `f` while holding an exclusive advisory lock on `<file>.lock`.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        Self::with_lock_file(&Self::get_lock_path(file_path), f)
    }

    /// Runs `f` while holding an exclusive advisory lock on `lock_path`.
    pub fn with_lock_file<F, T>(lock_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create lock directory {:?}", parent))?;
        }
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: write a uniquely named hidden temp file next to `path`,
    /// then rename it over `path`. No existing file other than `path` is touched.
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp_path = path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp_path, contents) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("Failed to write {:?}", tmp_path));
        }
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("Failed to replace {:?}", path));
        }
        Ok(())
    }
}

//! File-backed key-value store
//!
//! Each key maps to one file in a data directory. Writes go to a sibling
//! temp file which is synced and renamed over the target, so a reader
//! never observes a half-written queue.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use certprep_common::error::{CommonError, CommonResult};
use certprep_common::sync::KeyValueStore;

const TEMP_SUFFIX: &str = ".tmp";

/// [`KeyValueStore`] persisting one file per key
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: PathBuf,
    // Serializes writers within the process so two saves of the same key
    // cannot interleave on the temp file.
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> CommonResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            CommonError::persistence_op(
                "open_store",
                format!("failed to create {}: {}", dir.display(), e),
            )
        })?;
        tracing::debug!(path = %dir.display(), "file_store.opened");
        Ok(Self { dir, write_lock: Mutex::new(()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced so a key can never
    /// escape the data directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        let name = if name.trim_matches('.').is_empty() { format!("_{name}") } else { name };
        self.dir.join(name)
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(TEMP_SUFFIX);
        path.with_file_name(name)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CommonError::persistence_op("read", format!("key '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| CommonError::lock("file store writer"))?;
        let path = self.path_for(key);
        let temp_path = Self::temp_path(&path);

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, &path)
        };

        write().map_err(|e| {
            fs::remove_file(&temp_path).ok();
            tracing::warn!(key, error = %e, "file_store.write_failed");
            CommonError::persistence_op("write", format!("key '{key}': {e}"))
        })?;

        tracing::trace!(key, bytes = value.len(), "file_store.written");
        Ok(())
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| CommonError::lock("file store writer"))?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CommonError::persistence_op("remove", format!("key '{key}': {e}"))),
        }
    }
}

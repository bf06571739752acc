use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, OnceLock};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::{Builder, NamedTempFile};

use crate::cycle::EffectiveDate;
use crate::error::NasrError;

pub const DEFAULT_CACHE_DIR: &str = "./nasr/";

/// Local cache of NASR archives, one `{effective_date}.zip` per cycle.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    cache_root: Utf8PathBuf,
}

impl ArchiveStore {
    pub fn new(cache_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
        }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn archive_path(&self, date: EffectiveDate) -> Utf8PathBuf {
        self.cache_root.join(format!("{date}.zip"))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    pub fn ensure_cache_root(&self) -> Result<(), NasrError> {
        fs::create_dir_all(self.cache_root.as_std_path())
            .map_err(|err| NasrError::Filesystem(format!("create {}: {err}", self.cache_root)))
    }

    /// Temporary file next to the final archive so the persist is a rename.
    pub fn temp_archive(&self) -> Result<NamedTempFile, NasrError> {
        Builder::new()
            .prefix("nasr-tmp")
            .suffix(".zip")
            .tempfile_in(self.cache_root.as_std_path())
            .map_err(|err| NasrError::Filesystem(err.to_string()))
    }

    pub fn persist(temp: NamedTempFile, dest: &Utf8Path) -> Result<(), NasrError> {
        temp.persist(dest.as_std_path())
            .map_err(|err| NasrError::Filesystem(format!("persist {dest}: {}", err.error)))?;
        Ok(())
    }

    /// Lock serializing fetches of one archive path within this process.
    pub fn fetch_lock(path: &Utf8Path) -> Arc<Mutex<()>> {
        static LOCKS: OnceLock<Mutex<HashMap<Utf8PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
        let locks = LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut guard = locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

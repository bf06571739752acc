use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};
use zip::{ZipArchive, ZipWriter};

use crate::cycle::EffectiveDate;
use crate::error::NasrError;
use crate::nasr::{ArchiveVariant, NasrClient, RemoteBody};
use crate::store::ArchiveStore;

pub const SHAPE_FILES_DIR: &str = "Shape_Files";

const COMPREHENSIVE_PREFIX: &str = "Additional_Data/Shape_Files";
const COMPREHENSIVE_ROOT: &str = "Additional_Data/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variant", rename_all = "lowercase")]
pub enum ArchiveSource {
    Override,
    Cache,
    Downloaded(ArchiveVariant),
}

#[derive(Debug, Clone)]
pub struct ResolvedArchive {
    pub path: Utf8PathBuf,
    pub source: ArchiveSource,
}

impl ResolvedArchive {
    /// Address of the shape file directory, `zip://{path}!Shape_Files`.
    pub fn shape_files_uri(&self) -> String {
        format!("zip://{}!{SHAPE_FILES_DIR}", self.path)
    }
}

pub struct ArchiveResolver<C: NasrClient> {
    store: ArchiveStore,
    client: C,
    base_url: String,
}

impl<C: NasrClient> ArchiveResolver<C> {
    pub fn new(store: ArchiveStore, client: C, base_url: impl Into<String>) -> Self {
        Self {
            store,
            client,
            base_url: base_url.into(),
        }
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    pub fn resolve(
        &self,
        date: EffectiveDate,
        override_path: Option<&Utf8Path>,
    ) -> Result<ResolvedArchive, NasrError> {
        if let Some(path) = override_path {
            debug!(%path, "using override archive");
            return Ok(ResolvedArchive {
                path: path.to_path_buf(),
                source: ArchiveSource::Override,
            });
        }

        let path = self.store.archive_path(date);
        if self.store.exists(&path) {
            debug!(%path, "cache hit");
            return Ok(ResolvedArchive {
                path,
                source: ArchiveSource::Cache,
            });
        }

        let lock = ArchiveStore::fetch_lock(&path);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.store.exists(&path) {
            debug!(%path, "archive fetched while waiting for lock");
            return Ok(ResolvedArchive {
                path,
                source: ArchiveSource::Cache,
            });
        }

        let variant = self.fetch(date, &path)?;
        Ok(ResolvedArchive {
            path,
            source: ArchiveSource::Downloaded(variant),
        })
    }

    fn fetch(&self, date: EffectiveDate, dest: &Utf8Path) -> Result<ArchiveVariant, NasrError> {
        let (variant, mut body) = self.request(date)?;

        self.store.ensure_cache_root()?;
        let mut download = self.store.temp_archive()?;
        let bytes = copy_body(&mut body, download.as_file_mut())?;
        info!(%date, ?variant, bytes, "downloaded NASR archive");

        let archive = match variant {
            ArchiveVariant::Compact => download,
            ArchiveVariant::Comprehensive => {
                let mut compact = self.store.temp_archive()?;
                download
                    .seek(SeekFrom::Start(0))
                    .map_err(|err| NasrError::Filesystem(err.to_string()))?;
                let copied = repackage(download.as_file_mut(), compact.as_file_mut())?;
                if copied == 0 {
                    warn!(%date, "comprehensive archive has no {COMPREHENSIVE_PREFIX} entries");
                }
                debug!(%date, copied, "repackaged comprehensive archive");
                compact
            }
        };
        ArchiveStore::persist(archive, dest)?;
        Ok(variant)
    }

    fn request(
        &self,
        date: EffectiveDate,
    ) -> Result<(ArchiveVariant, Box<dyn Read + Send>), NasrError> {
        let url = ArchiveVariant::Compact.url(&self.base_url, date);
        info!(%url, "requesting compact archive");
        if let RemoteBody::Found(body) = self.client.get(&url)? {
            return Ok((ArchiveVariant::Compact, body));
        }

        let url = ArchiveVariant::Comprehensive.url(&self.base_url, date);
        info!(%url, "compact archive unavailable, requesting comprehensive archive");
        match self.client.get(&url)? {
            RemoteBody::Found(body) => Ok((ArchiveVariant::Comprehensive, body)),
            RemoteBody::NotFound => Err(NasrError::RemoteStatus { url, status: 404 }),
        }
    }
}

/// Streams a response body to `dest`. Read failures are transport errors,
/// write failures are filesystem errors.
pub fn copy_body<R: Read, W: Write>(body: &mut R, dest: &mut W) -> Result<u64, NasrError> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let read = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(NasrError::Http(format!("read body: {err}"))),
        };
        dest.write_all(&buf[..read])
            .map_err(|err| NasrError::Filesystem(format!("write archive: {err}")))?;
        total += read as u64;
    }
    dest.flush()
        .map_err(|err| NasrError::Filesystem(format!("write archive: {err}")))?;
    Ok(total)
}

/// Copies every `Additional_Data/Shape_Files` file entry of `source` into
/// `dest` with the `Additional_Data/` segment stripped. Entries are copied
/// raw, keeping their compression method and modification time. Returns the
/// number of entries copied.
pub fn repackage<R, W>(source: R, dest: W) -> Result<usize, NasrError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut source = ZipArchive::new(source).map_err(|err| NasrError::Archive(err.to_string()))?;
    let mut writer = ZipWriter::new(dest);

    let mut copied = 0usize;
    for i in 0..source.len() {
        let entry = source
            .by_index_raw(i)
            .map_err(|err| NasrError::Archive(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = compact_entry_name(entry.name()).map(str::to_string) else {
            continue;
        };
        writer
            .raw_copy_file_rename(entry, name.as_str())
            .map_err(|err| NasrError::Archive(format!("{name}: {err}")))?;
        copied += 1;
    }

    writer
        .finish()
        .map_err(|err| NasrError::Archive(err.to_string()))?;
    Ok(copied)
}

fn compact_entry_name(name: &str) -> Option<&str> {
    if !name.starts_with(COMPREHENSIVE_PREFIX) {
        return None;
    }
    name.strip_prefix(COMPREHENSIVE_ROOT)
}

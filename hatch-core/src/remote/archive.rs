//! Release archive extraction
//!
//! An archive is unpacked into a destination directory, then the top level
//! of that directory is scanned for the first entry carrying the platform's
//! shared-library suffix. Nested directories are not searched.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zip::ZipArchive;

use super::error::RemoteError;

/// Unpacks archives and lists directories.
///
/// Split out so the scan can be exercised against a fixed listing.
pub trait Unpack: Send + Sync {
    /// Unpack every entry of `archive` into `destination`
    fn unpack(&self, archive: &Path, destination: &Path) -> Result<(), RemoteError>;

    /// Names of the immediate entries of `dir`, in scan order
    fn list(&self, dir: &Path) -> Result<Vec<String>, RemoteError>;
}

/// Zip archives on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipUnpacker;

impl Unpack for ZipUnpacker {
    fn unpack(&self, archive: &Path, destination: &Path) -> Result<(), RemoteError> {
        if destination.exists() {
            std::fs::remove_dir_all(destination)?;
        }
        std::fs::create_dir_all(destination)?;

        let mut zip = ZipArchive::new(File::open(archive)?)?;
        zip.extract(destination)?;
        Ok(())
    }

    /// Entry names sorted by name, so the scan is the same on every platform
    fn list(&self, dir: &Path) -> Result<Vec<String>, RemoteError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Unpacks a release archive and finds the shared library inside it
#[derive(Clone)]
pub struct ArchiveExtractor {
    unpacker: Arc<dyn Unpack>,
    suffix: String,
}

impl ArchiveExtractor {
    /// Zip extractor looking for this platform's library suffix
    pub fn new() -> Self {
        Self {
            unpacker: Arc::new(ZipUnpacker),
            suffix: std::env::consts::DLL_SUFFIX.to_string(),
        }
    }

    /// Builder: use another unpacker
    pub fn with_unpacker(mut self, unpacker: Arc<dyn Unpack>) -> Self {
        self.unpacker = unpacker;
        self
    }

    /// Builder: look for another suffix (e.g. `.dylib`)
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Library suffix being scanned for
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Unpack `archive` into `destination` and return the library path
    pub fn extract(&self, archive: &Path, destination: &Path) -> Result<PathBuf, RemoteError> {
        self.unpacker.unpack(archive, destination)?;
        self.find_library(destination)
    }

    /// First top-level entry of `dir` ending in the library suffix
    pub fn find_library(&self, dir: &Path) -> Result<PathBuf, RemoteError> {
        self.unpacker
            .list(dir)?
            .into_iter()
            .find(|name| name.ends_with(&self.suffix))
            .map(|name| dir.join(name))
            .ok_or_else(|| RemoteError::NoDylibFound {
                dir: dir.to_path_buf(),
            })
    }

    /// [`ArchiveExtractor::extract`] on the blocking thread pool
    pub async fn extract_blocking(
        &self,
        archive: PathBuf,
        destination: PathBuf,
    ) -> Result<PathBuf, RemoteError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&archive, &destination))
            .await
            .map_err(|e| RemoteError::Task(e.to_string()))?
    }
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

//! On-disk storage of uploaded profile images.
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::domain::{ImageName, ImageRef, MediaRoot};
use crate::forms::profile::ValidUpload;

/// Attempts at finding a free file name before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Length of the random suffix appended to colliding names.
const SUFFIX_LEN: usize = 7;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to prepare media directories")]
    Setup(#[source] io::Error),
    #[error("failed to save image")]
    Save(#[source] io::Error),
    #[error("no free file name for {0}")]
    NameExhausted(String),
}

/// Media directory layout: images under `images/`, multipart temp files under
/// `.tmp/` so that persisting an upload stays on one file system.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: MediaRoot,
}

impl MediaStorage {
    pub fn new(root: MediaRoot) -> Self {
        Self { root }
    }

    /// Directory stored images land in; the only part of the media root
    /// that is ever served.
    pub fn image_dir(&self) -> PathBuf {
        self.root.image_dir()
    }

    /// Directory for in-flight multipart uploads.
    pub fn temp_dir(&self) -> PathBuf {
        self.root.as_path().join(".tmp")
    }

    /// Create the media directories if they are missing.
    pub fn ensure_dirs(&self) -> StorageResult<()> {
        fs::create_dir_all(self.root.image_dir()).map_err(StorageError::Setup)?;
        fs::create_dir_all(self.temp_dir()).map_err(StorageError::Setup)
    }

    /// Move a validated upload into the image directory without overwriting
    /// existing files. Colliding names get a random suffix.
    pub fn store(&self, upload: ValidUpload) -> StorageResult<ImageRef> {
        fs::create_dir_all(self.root.image_dir()).map_err(StorageError::Setup)?;

        let original = upload.name;
        let mut name = original.clone();
        let mut file = upload.file;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let target = self.root.image_dir().join(name.as_str());
            match file.persist_noclobber(&target) {
                Ok(_) => return Ok(ImageRef::for_image(&name)),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    file = err.file;
                }
                Err(err) => {
                    // Rename across devices fails; fall back to a copy.
                    log::debug!("persist failed for {target:?}, copying: {}", err.error);
                    file = err.file;
                    match copy_new(&file, &target) {
                        Ok(()) => return Ok(ImageRef::for_image(&name)),
                        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                        Err(e) => return Err(StorageError::Save(e)),
                    }
                }
            }
            name = original.with_suffix(&random_suffix());
        }

        Err(StorageError::NameExhausted(original.to_string()))
    }
}

fn copy_new(source: &NamedTempFile, target: &Path) -> io::Result<()> {
    let mut reader = source.reopen()?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)?;
    io::copy(&mut reader, &mut writer)?;
    Ok(())
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
}

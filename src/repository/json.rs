use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::domain::{ImageRef, Profile};
use crate::repository::{ProfileRepository, RepositoryError, RepositoryResult, next_id};

/// Default file name of the profile table.
pub const TABLE_FILE: &str = "profiles.json";

/// Profile table kept as a JSON array on disk. The whole table is held in
/// memory; every insert rewrites the file through a temp file and rename.
#[derive(Debug)]
pub struct JsonProfileRepository {
    path: PathBuf,
    rows: Mutex<Vec<Profile>>,
}

impl JsonProfileRepository {
    /// Load the table at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        let path = path.into();
        let rows = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(RepositoryError::Decode)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(RepositoryError::Read(err)),
        };

        log::info!("Loaded {} profile(s) from {:?}", rows.len(), path);

        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    fn flush(&self, rows: &[Profile]) -> RepositoryResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(RepositoryError::Write)?;

        let encoded = serde_json::to_vec_pretty(rows).map_err(RepositoryError::Encode)?;
        let mut temp = NamedTempFile::new_in(dir).map_err(RepositoryError::Write)?;
        temp.write_all(&encoded).map_err(RepositoryError::Write)?;
        temp.persist(&self.path)
            .map_err(|err| RepositoryError::Write(err.error))?;
        Ok(())
    }
}

impl ProfileRepository for JsonProfileRepository {
    fn create(&self, image: ImageRef) -> RepositoryResult<Profile> {
        let mut rows = self.rows.lock().map_err(|_| RepositoryError::Poisoned)?;
        let profile = Profile::new(next_id(&rows), image);
        rows.push(profile.clone());

        if let Err(err) = self.flush(&rows) {
            rows.pop();
            return Err(err);
        }

        Ok(profile)
    }

    fn list(&self) -> RepositoryResult<Vec<Profile>> {
        let rows = self.rows.lock().map_err(|_| RepositoryError::Poisoned)?;
        Ok(rows.clone())
    }
}

use std::sync::Mutex;

use crate::domain::{ImageRef, Profile};
use crate::repository::{ProfileRepository, RepositoryError, RepositoryResult, next_id};

/// Process-local profile table, used in tests and throwaway runs.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    rows: Mutex<Vec<Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn create(&self, image: ImageRef) -> RepositoryResult<Profile> {
        let mut rows = self.rows.lock().map_err(|_| RepositoryError::Poisoned)?;
        let profile = Profile::new(next_id(&rows), image);
        rows.push(profile.clone());
        Ok(profile)
    }

    fn list(&self) -> RepositoryResult<Vec<Profile>> {
        let rows = self.rows.lock().map_err(|_| RepositoryError::Poisoned)?;
        Ok(rows.clone())
    }
}

//! Persistence of profile records.
use crate::domain::{ImageRef, Profile, ProfileId};

pub mod json;
pub mod memory;

pub use json::JsonProfileRepository;
pub use memory::InMemoryProfileRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to read profile table")]
    Read(#[source] std::io::Error),
    #[error("failed to write profile table")]
    Write(#[source] std::io::Error),
    #[error("corrupt profile table")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode profile table")]
    Encode(#[source] serde_json::Error),
    #[error("profile store lock poisoned")]
    Poisoned,
}

/// Storage of profile rows. Rows are only ever inserted.
pub trait ProfileRepository: Send + Sync {
    /// Persist a new profile for the stored image, assigning the next id.
    fn create(&self, image: ImageRef) -> RepositoryResult<Profile>;

    /// All profiles in insertion order.
    fn list(&self) -> RepositoryResult<Vec<Profile>>;
}

/// Next id after the largest one in `rows`, starting at 1.
fn next_id(rows: &[Profile]) -> ProfileId {
    rows.iter()
        .map(|p| p.id)
        .max()
        .map(|id| id.next())
        .unwrap_or(ProfileId::new(1))
}

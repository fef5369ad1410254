use std::sync::Arc;

use crate::dto::ProfileDto;
use crate::forms::profile::UploadForm;
use crate::repository::ProfileRepository;
use crate::services::ServiceResult;
use crate::storage::MediaStorage;

/// Service turning validated uploads into stored images and profile rows.
#[derive(Clone)]
pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
    storage: MediaStorage,
    media_url: String,
}

impl ProfileService {
    pub fn new(
        repository: Arc<dyn ProfileRepository>,
        storage: MediaStorage,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            storage,
            media_url: media_url.into(),
        }
    }

    pub fn storage(&self) -> &MediaStorage {
        &self.storage
    }

    /// Validate the bound form, store its image and persist a new profile.
    /// Nothing is written when validation fails.
    pub fn create_profile(&self, form: UploadForm) -> ServiceResult<ProfileDto> {
        let upload = form.validate()?;
        let image = self.storage.store(upload)?;
        let profile = self.repository.create(image)?;

        log::info!("Created profile {} with image {}", profile.id, profile.image);

        Ok(ProfileDto::from_profile(&profile, &self.media_url))
    }

    /// All profiles, oldest first.
    pub fn list_profiles(&self) -> ServiceResult<Vec<ProfileDto>> {
        Ok(self
            .repository
            .list()?
            .iter()
            .map(|profile| ProfileDto::from_profile(profile, &self.media_url))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    use actix_multipart::form::tempfile::TempFile;
    use tempfile::{NamedTempFile, tempdir};

    use super::*;
    use crate::domain::MediaRoot;
    use crate::forms::profile::FormError;
    use crate::repository::InMemoryProfileRepository;
    use crate::services::ServiceError;
    use crate::test_support::encoded_image;

    fn gif_bytes() -> Vec<u8> {
        encoded_image(1, 1, image::ImageFormat::Gif)
    }

    fn build_service(root: PathBuf) -> (ProfileService, Arc<InMemoryProfileRepository>) {
        let repository = Arc::new(InMemoryProfileRepository::new());
        let service = ProfileService::new(
            repository.clone(),
            MediaStorage::new(MediaRoot::from(root)),
            "/media/",
        );
        (service, repository)
    }

    fn form_with(name: &str, bytes: &[u8]) -> UploadForm {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(bytes).unwrap();
        UploadForm {
            image: Some(TempFile {
                file: temp,
                content_type: None,
                file_name: Some(name.to_string()),
                size: bytes.len(),
            }),
        }
    }

    #[test]
    fn create_profile_stores_image_and_row() {
        let dir = tempdir().unwrap();
        let (service, repository) = build_service(dir.path().to_path_buf());
        let bytes = gif_bytes();

        let profile = service.create_profile(form_with("dot.gif", &bytes)).unwrap();

        assert_eq!(profile.id, 1);
        assert_eq!(profile.image, "images/dot.gif");
        assert_eq!(profile.image_url, "/media/images/dot.gif");
        assert_eq!(
            fs::read(dir.path().join("images/dot.gif")).unwrap(),
            bytes
        );
        assert_eq!(repository.list().unwrap().len(), 1);
    }

    #[test]
    fn resubmission_creates_duplicate_profile() {
        let dir = tempdir().unwrap();
        let (service, _) = build_service(dir.path().to_path_buf());

        let first = service.create_profile(form_with("dot.gif", &gif_bytes())).unwrap();
        let second = service.create_profile(form_with("dot.gif", &gif_bytes())).unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.image, second.image);
        assert_eq!(service.list_profiles().unwrap().len(), 2);
    }

    #[test]
    fn invalid_form_writes_nothing() {
        let dir = tempdir().unwrap();
        let (service, repository) = build_service(dir.path().to_path_buf());

        let err = service.create_profile(UploadForm::empty()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidForm(FormError::MissingImage)));
        assert!(err.is_client_error());

        let err = service
            .create_profile(form_with("dot.gif", b"not an image"))
            .unwrap_err();
        assert!(err.is_client_error());

        assert!(repository.list().unwrap().is_empty());
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn unreadable_upload_is_a_server_error() {
        let dir = tempdir().unwrap();
        let (service, repository) = build_service(dir.path().to_path_buf());

        let form = form_with("dot.gif", &gif_bytes());
        if let Some(image) = &form.image {
            fs::remove_file(image.file.path()).unwrap();
        }

        let err = service.create_profile(form).unwrap_err();
        assert!(matches!(err, ServiceError::ReadUpload(_)));
        assert!(!err.is_client_error());
        assert!(repository.list().unwrap().is_empty());
    }
}

use std::sync::Arc;

use actix_multipart::form::MultipartFormConfig;
use actix_multipart::form::tempfile::TempFileConfig;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

use crate::domain::MediaRoot;
use crate::models::config::UploadConfig;
use crate::render::{TemplateRenderer, TeraRenderer};
use crate::repository::{JsonProfileRepository, ProfileRepository, RepositoryError};
use crate::services::profiles::ProfileService;
use crate::storage::{MediaStorage, StorageError};

pub mod domain;
pub mod dto;
pub mod forms;
pub mod forwarded;
pub mod greeter;
pub mod middleware;
pub mod models;
pub mod render;
pub mod repository;
pub mod routes;
pub mod services;
pub mod storage;

/// Errors preventing the upload site from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to prepare media storage: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to open profile table: {0}")]
    Repository(#[from] RepositoryError),
    #[error("failed to load templates: {0}")]
    Templates(#[from] tera::Error),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, immutable state handed to every worker of the upload site.
#[derive(Clone)]
pub struct UploadState {
    pub config: web::Data<UploadConfig>,
    pub profiles: web::Data<ProfileService>,
    pub renderer: web::Data<dyn TemplateRenderer>,
}

impl UploadState {
    pub fn new(
        config: UploadConfig,
        repository: Arc<dyn ProfileRepository>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        let storage = MediaStorage::new(MediaRoot::from(config.media_root.clone()));
        let profiles = ProfileService::new(repository, storage, config.media_url.clone());

        Self {
            config: web::Data::new(config),
            profiles: web::Data::new(profiles),
            renderer: web::Data::from(renderer),
        }
    }

    /// Open the on-disk profile table and templates named by the config.
    pub fn from_config(config: UploadConfig) -> Result<Self, StartupError> {
        let storage = MediaStorage::new(MediaRoot::from(config.media_root.clone()));
        storage.ensure_dirs()?;

        let repository = JsonProfileRepository::open(&config.database_path)?;
        let renderer = TeraRenderer::from_dir(&config.templates_dir)?;

        Ok(Self::new(config, Arc::new(repository), Arc::new(renderer)))
    }

    /// Multipart limits for the upload form.
    pub fn multipart_config(&self) -> MultipartFormConfig {
        MultipartFormConfig::default()
            .total_limit(self.config.upload_limit)
            .memory_limit(self.config.upload_limit)
    }

    /// Keep temp files next to the image directory so storing is a rename.
    pub fn temp_file_config(&self) -> TempFileConfig {
        TempFileConfig::default().directory(self.profiles.storage().temp_dir())
    }
}

/// Build and run the profile upload site until it is shut down.
pub async fn run(config: UploadConfig) -> Result<(), StartupError> {
    let state = UploadState::from_config(config)?;
    let bind_address = state.config.bind_address();

    log::info!(
        "Starting profile upload site on {}:{} (debug: {})",
        bind_address.0,
        bind_address.1,
        state.config.debug
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}

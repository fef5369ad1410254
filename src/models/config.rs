//! Configuration models loaded from external sources.
use std::env;
use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use serde::Deserialize;

use crate::domain::IMAGE_DIR;
use crate::repository::json::TABLE_FILE;

#[derive(Clone, Debug, Deserialize)]
/// Settings of the profile upload site, shared across handlers.
pub struct UploadConfig {
    pub address: String,
    pub port: u16,
    /// Serves uploaded media straight from `media_root` when set.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_media_url")]
    pub media_url: String,
    pub media_root: PathBuf,
    /// JSON profile table. Kept outside `media_root`, which may be served.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    /// Bearer token for `/admin/`. The admin listing is off without one.
    #[serde(default)]
    pub admin_token: Option<String>,
    /// Upper bound on a whole multipart request, in bytes.
    #[serde(default = "default_upload_limit")]
    pub upload_limit: usize,
}

#[derive(Clone, Debug, Deserialize)]
/// Settings of the greeter server.
pub struct GreeterConfig {
    #[serde(default = "default_greeter_address")]
    pub address: String,
    #[serde(default = "default_greeter_port")]
    pub port: u16,
    #[serde(default = "default_greeter_workers")]
    pub workers: usize,
    #[serde(default)]
    pub access_log: bool,
    /// Shared secret a reverse proxy puts into `Forwarded` headers.
    #[serde(default)]
    pub forwarded_secret: String,
}

fn default_media_url() -> String {
    "/media/".into()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data").join(TABLE_FILE)
}

fn default_templates_dir() -> String {
    "templates".into()
}

fn default_upload_limit() -> usize {
    10 * 1024 * 1024
}

fn default_greeter_address() -> String {
    "127.0.0.1".into()
}

fn default_greeter_port() -> u16 {
    8000
}

fn default_greeter_workers() -> usize {
    8
}

/// Layered sources: `config/<name>.yaml`, then the optional
/// `config/<name>.<APP_ENV>.yaml` overlay, then `<PREFIX>_*` variables.
fn builder(name: &str, env_prefix: &str) -> ConfigBuilder<DefaultState> {
    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    Config::builder()
        .add_source(config::File::with_name(&format!("config/{name}")))
        .add_source(config::File::with_name(&format!("config/{name}.{app_env}")).required(false))
        .add_source(config::Environment::with_prefix(env_prefix))
}

impl UploadConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(builder("upload", "APP"), env::var("DEBUG").ok())
    }

    /// A non-blank `DEBUG` value wins over every other source.
    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        debug: Option<String>,
    ) -> Result<Self, ConfigError> {
        let debug = debug.filter(|value| !value.trim().is_empty());

        builder
            .set_override_option("debug", debug)?
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.address.clone(), self.port)
    }

    /// URL prefix stored images are served under in debug mode. Always
    /// non-empty, even when `media_url` is `/`.
    pub fn media_mount(&self) -> String {
        format!("{}/{IMAGE_DIR}", self.media_url.trim_end_matches('/'))
    }
}

impl GreeterConfig {
    pub fn load() -> Result<Self, ConfigError> {
        builder("greeter", "GREETER").build()?.try_deserialize()
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.address.clone(), self.port)
    }
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            address: default_greeter_address(),
            port: default_greeter_port(),
            workers: default_greeter_workers(),
            access_log: false,
            forwarded_secret: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use config::{Environment, File, FileFormat};

    use super::*;

    const UPLOAD_YAML: &str = "address: 127.0.0.1\nport: 8080\ndebug: false\nmedia_root: media\n";

    fn layered(app_debug: Option<&str>) -> ConfigBuilder<DefaultState> {
        let vars: HashMap<String, String> = app_debug
            .map(|value| ("APP_DEBUG".to_string(), value.to_string()))
            .into_iter()
            .collect();

        Config::builder()
            .add_source(File::from_str(UPLOAD_YAML, FileFormat::Yaml))
            .add_source(Environment::with_prefix("APP").source(Some(vars)))
    }

    fn load_with(app_debug: Option<&str>, debug: Option<&str>) -> Result<UploadConfig, ConfigError> {
        UploadConfig::from_builder(layered(app_debug), debug.map(str::to_string))
    }

    #[test]
    fn greeter_defaults_match_startup_parameters() {
        let config = GreeterConfig::default();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.workers, 8);
        assert!(!config.access_log);
    }

    #[test]
    fn upload_config_fills_defaults() {
        let config: UploadConfig = Config::builder()
            .set_override("address", "127.0.0.1")
            .unwrap()
            .set_override("port", 8080)
            .unwrap()
            .set_override("media_root", "media")
            .unwrap()
            .set_override("debug", "true")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.debug);
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.templates_dir, "templates");
        assert_eq!(config.upload_limit, 10 * 1024 * 1024);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn debug_variable_overrides_every_layer() {
        assert!(load_with(None, Some("true")).unwrap().debug);
        assert!(load_with(None, Some("1")).unwrap().debug);
        assert!(!load_with(Some("true"), Some("false")).unwrap().debug);
        assert!(load_with(Some("false"), Some("on")).unwrap().debug);
    }

    #[test]
    fn blank_debug_variable_falls_back_to_lower_layers() {
        assert!(!load_with(None, None).unwrap().debug);
        assert!(!load_with(None, Some("")).unwrap().debug);
        assert!(load_with(Some("true"), Some("  ")).unwrap().debug);
        assert!(load_with(Some("true"), None).unwrap().debug);
    }

    #[test]
    fn unparsable_debug_variable_is_rejected() {
        assert!(load_with(None, Some("maybe")).is_err());
    }

    #[test]
    fn database_defaults_outside_media_root() {
        let config = load_with(None, None).unwrap();
        assert_eq!(config.database_path, PathBuf::from("data/profiles.json"));
        assert!(!config.database_path.starts_with(&config.media_root));
    }

    #[test]
    fn media_mount_is_never_empty() {
        let mut config = load_with(None, None).unwrap();
        assert_eq!(config.media_mount(), "/media/images");

        config.media_url = "/".into();
        assert_eq!(config.media_mount(), "/images");

        config.media_url = "/static/uploads".into();
        assert_eq!(config.media_mount(), "/static/uploads/images");
    }
}

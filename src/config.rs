use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::DEFAULT_IMAGE_MODEL_KEY;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    pub gemini_api_key: Option<String>,
    pub grok_api_key: Option<String>,

    #[serde(default = "default_grok_base_url")]
    pub grok_base_url: String,

    #[serde(default = "default_image_model")]
    pub default_image_model: String,

    pub beehiiv_publication_id: Option<String>,
    pub beehiiv_api_key: Option<String>,

    #[serde(default)]
    pub blob: BlobConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    #[default]
    Local,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default)]
    pub backend: BlobBackend,

    /// Root directory for the local backend.
    #[serde(default = "default_blob_dir")]
    pub dir: String,

    /// Prefix for URLs handed out by the local backend.
    pub public_base_url: Option<String>,

    /// Upload endpoint for the HTTP backend.
    pub api_url: Option<String>,
    pub token: Option<String>,
}

fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsdesk");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir
}

fn default_db_path() -> String {
    data_dir().join("newsdesk.db").to_string_lossy().to_string()
}

fn default_blob_dir() -> String {
    data_dir().join("blobs").to_string_lossy().to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_grok_base_url() -> String {
    "https://api.x.ai/v1".to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL_KEY.to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::Local,
            dir: default_blob_dir(),
            public_base_url: None,
            api_url: None,
            token: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            gemini_api_key: None,
            grok_api_key: None,
            grok_base_url: default_grok_base_url(),
            default_image_model: default_image_model(),
            beehiiv_publication_id: None,
            beehiiv_api_key: None,
            blob: BlobConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read the config file at `path`, writing defaults there on first run.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsdesk")
            .join("config.toml")
    }

    /// Secrets may come from the environment instead of the file.
    fn apply_env_overrides(&mut self) {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = var("GROK_API_KEY") {
            self.grok_api_key = Some(key);
        }
        if let Some(url) = var("GROK_API_BASE_URL") {
            self.grok_base_url = url;
        }
        if let Some(model) = var("DEFAULT_COVER_IMAGE_MODEL_KEY") {
            self.default_image_model = model;
        }
        if let Some(id) = var("BEEHIIV_PUBLICATION_ID") {
            self.beehiiv_publication_id = Some(id);
        }
        if let Some(key) = var("BEEHIIV_API_KEY") {
            self.beehiiv_api_key = Some(key);
        }
        if let Some(token) = var("BLOB_READ_WRITE_TOKEN") {
            self.blob.token = Some(token);
        }
    }

    pub fn grok_base_url(&self) -> &str {
        self.grok_base_url.trim_end_matches('/')
    }
}

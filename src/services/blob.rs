use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::config::{BlobBackend, BlobConfig};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Public object storage for generated images.
pub enum BlobStore {
    /// Files under `dir`, addressed by `public_base_url` or a `file://` URL.
    Local {
        dir: PathBuf,
        public_base_url: Option<String>,
    },
    /// An upload service taking `PUT {api_url}/{path}` and answering `{"url": ...}`.
    Http {
        client: Client,
        api_url: String,
        token: String,
    },
}

impl BlobStore {
    pub fn from_config(config: &BlobConfig) -> Result<Self> {
        match config.backend {
            BlobBackend::Local => Ok(BlobStore::Local {
                dir: PathBuf::from(&config.dir),
                public_base_url: config.public_base_url.clone(),
            }),
            BlobBackend::Http => {
                let api_url = config
                    .api_url
                    .clone()
                    .ok_or_else(|| AppError::Config("blob.api_url is not set".to_string()))?;
                let token = config.token.clone().ok_or_else(|| {
                    AppError::Config("BLOB_READ_WRITE_TOKEN is not set".to_string())
                })?;
                let client = Client::builder()
                    .timeout(Duration::from_secs(60))
                    .build()?;
                Ok(BlobStore::Http {
                    client,
                    api_url: api_url.trim_end_matches('/').to_string(),
                    token,
                })
            }
        }
    }

    pub async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<BlobObject> {
        let relative = checked_relative(path)?;

        let object = match self {
            BlobStore::Local {
                dir,
                public_base_url,
            } => {
                let target = dir.join(&relative);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&target, &bytes).await?;

                let url = match public_base_url {
                    Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
                    None => Url::from_file_path(&target)
                        .map_err(|_| {
                            AppError::Blob(format!("Cannot build URL for {}", target.display()))
                        })?
                        .to_string(),
                };
                BlobObject { url }
            }
            BlobStore::Http {
                client,
                api_url,
                token,
            } => {
                let response = client
                    .put(format!("{}/{}", api_url, path))
                    .bearer_auth(token)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(bytes)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let error_text = response.text().await?;
                    return Err(AppError::Blob(format!("Upload failed: {}", error_text)));
                }

                let upload: UploadResponse = response.json().await?;
                BlobObject { url: upload.url }
            }
        };

        info!(path, content_type, url = %object.url, "Blob stored");
        Ok(object)
    }
}

/// Blob paths are relative and may not climb out of the store root.
fn checked_relative(path: &str) -> Result<PathBuf> {
    let relative = Path::new(path);
    let safe = !path.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(AppError::Blob(format!("Invalid blob path: {path}")));
    }
    Ok(relative.to_path_buf())
}

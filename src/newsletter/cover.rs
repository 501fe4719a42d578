use tracing::info;

use crate::ai::{default_model_key, find_model, GeneratedImage, ImageGenerator, ImageModel};
use crate::db::Repository;
use crate::error::{AppError, Result, StoreError};
use crate::models::NewImage;
use crate::services::{BlobObject, BlobStore};

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Prompt -> provider -> blob storage -> `newsletter_images` row, optionally
/// promoted to the newsletter's cover.
pub struct CoverImagePipeline {
    repo: Repository,
    generator: ImageGenerator,
    blobs: BlobStore,
    default_model: &'static ImageModel,
}

impl CoverImagePipeline {
    pub fn new(
        repo: Repository,
        generator: ImageGenerator,
        blobs: BlobStore,
        configured_model: &str,
    ) -> Result<Self> {
        let default_model = find_model(Some(default_model_key(configured_model)))
            .ok_or_else(|| AppError::Config("No image model available".to_string()))?;
        Ok(Self {
            repo,
            generator,
            blobs,
            default_model,
        })
    }

    pub fn default_model(&self) -> &'static ImageModel {
        self.default_model
    }

    /// Generate one image and record it. Returns the stored object.
    pub async fn generate(
        &self,
        newsletter_id: i64,
        prompt: &str,
        model_key: Option<&str>,
        promote: bool,
    ) -> Result<BlobObject> {
        if newsletter_id <= 0 {
            return Err(AppError::validation("Valid newsletter id is required"));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::validation("Image prompt is required"));
        }
        let model = match model_key {
            Some(key) => find_model(Some(key))
                .ok_or_else(|| AppError::validation("Invalid image model selected"))?,
            None => self.default_model,
        };
        if self.repo.get_newsletter(newsletter_id).await?.is_none() {
            return Err(StoreError::NotFound.into());
        }

        let image = self.generator.generate(model, prompt).await?;
        self.record(newsletter_id, prompt, model, image, promote).await
    }

    /// Upload an already generated image and log it as a candidate.
    pub async fn record(
        &self,
        newsletter_id: i64,
        prompt: &str,
        model: &ImageModel,
        image: GeneratedImage,
        promote: bool,
    ) -> Result<BlobObject> {
        let path = format!(
            "newsletters/{}/cover-{}.{}",
            newsletter_id,
            chrono::Utc::now().timestamp_millis(),
            extension_for_mime(&image.mime_type)
        );

        let object = self.blobs.put(&path, image.bytes, &image.mime_type).await?;

        self.repo
            .insert_image(NewImage {
                newsletter_id,
                blob_url: object.url.clone(),
                prompt: prompt.to_string(),
                provider: model.provider.as_str().to_string(),
                model: model.model.to_string(),
            })
            .await?;

        if promote {
            self.repo
                .update_cover_image(newsletter_id, Some(object.url.clone()))
                .await?;
        }

        info!(newsletter_id, url = %object.url, promote, "Cover image recorded");
        Ok(object)
    }
}

/// Promote an existing candidate. Only images generated for this newsletter qualify.
pub async fn select_cover_image(repo: &Repository, newsletter_id: i64, url: &str) -> Result<()> {
    if newsletter_id <= 0 {
        return Err(AppError::validation("Valid newsletter id is required"));
    }
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::validation("Valid cover image URL is required"));
    }

    if repo
        .find_image_by_url(newsletter_id, url.to_string())
        .await?
        .is_none()
    {
        return Err(AppError::validation(
            "Selected image is not associated with this newsletter",
        ));
    }

    repo.update_cover_image(newsletter_id, Some(url.to_string()))
        .await?;
    info!(newsletter_id, url, "Cover image selected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{NewNewsletter, NewsletterStatus};

    async fn pipeline(dir: &std::path::Path) -> (CoverImagePipeline, Repository, i64) {
        let repo = Repository::new(":memory:").await.unwrap();
        let newsletter_id = repo
            .insert_newsletter(NewNewsletter {
                title: "Issue".to_string(),
                publish_date: None,
                status: NewsletterStatus::Draft,
            })
            .await
            .unwrap();
        let config = Config {
            gemini_api_key: None,
            grok_api_key: None,
            ..Config::default()
        };
        let pipeline = CoverImagePipeline::new(
            repo.clone(),
            ImageGenerator::new(&config).unwrap(),
            BlobStore::Local {
                dir: dir.to_path_buf(),
                public_base_url: Some("https://cdn.example.com".to_string()),
            },
            "not-a-model",
        )
        .unwrap();
        (pipeline, repo, newsletter_id)
    }

    fn jpeg() -> GeneratedImage {
        GeneratedImage {
            bytes: vec![0xff, 0xd8, 0xff],
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/gif"), "png");
    }

    #[tokio::test]
    async fn test_unknown_default_model_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _, _) = pipeline(dir.path()).await;
        assert_eq!(pipeline.default_model().key, "gemini-flash-image");
    }

    #[tokio::test]
    async fn test_record_stores_and_promotes() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, repo, newsletter_id) = pipeline(dir.path()).await;
        let model = find_model(Some("grok-imagine-image")).unwrap();

        let object = pipeline
            .record(newsletter_id, "city at dawn", model, jpeg(), true)
            .await
            .unwrap();

        let prefix = format!("https://cdn.example.com/newsletters/{newsletter_id}/cover-");
        assert!(object.url.starts_with(&prefix));
        assert!(object.url.ends_with(".jpg"));

        let images = repo.list_images(newsletter_id).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].provider.as_deref(), Some("grok"));
        assert_eq!(images[0].model.as_deref(), Some("grok-imagine-image"));

        let stored = repo.get_newsletter(newsletter_id).await.unwrap().unwrap();
        assert_eq!(stored.cover_image.as_deref(), Some(object.url.as_str()));
    }

    #[tokio::test]
    async fn test_record_without_promote_keeps_cover() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, repo, newsletter_id) = pipeline(dir.path()).await;
        let model = find_model(None).unwrap();

        pipeline
            .record(newsletter_id, "skyline", model, jpeg(), false)
            .await
            .unwrap();

        let stored = repo.get_newsletter(newsletter_id).await.unwrap().unwrap();
        assert_eq!(stored.cover_image, None);
        assert_eq!(repo.list_images(newsletter_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_validates_before_calling_provider() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _, newsletter_id) = pipeline(dir.path()).await;

        let err = pipeline.generate(newsletter_id, "  ", None, true).await.unwrap_err();
        assert_eq!(err.user_message(), "Image prompt is required");

        let err = pipeline
            .generate(newsletter_id, "dawn", Some("dall-e"), true)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid image model selected");

        let err = pipeline.generate(newsletter_id, "dawn", None, true).await.unwrap_err();
        assert_eq!(err.user_message(), "Missing GEMINI_API_KEY environment variable");
    }

    #[tokio::test]
    async fn test_select_cover_image_requires_own_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, repo, newsletter_id) = pipeline(dir.path()).await;
        let object = pipeline
            .record(newsletter_id, "skyline", find_model(None).unwrap(), jpeg(), false)
            .await
            .unwrap();

        let err = select_cover_image(&repo, newsletter_id, "https://elsewhere.example.com/x.png")
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Selected image is not associated with this newsletter"
        );

        select_cover_image(&repo, newsletter_id, &object.url).await.unwrap();
        let stored = repo.get_newsletter(newsletter_id).await.unwrap().unwrap();
        assert_eq!(stored.cover_image.as_deref(), Some(object.url.as_str()));
    }
}

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_IMAGE_MODEL_KEY: &str = "gemini-flash-image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    Gemini,
    Grok,
}

impl ImageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageProvider::Gemini => "gemini",
            ImageProvider::Grok => "grok",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageModel {
    pub key: &'static str,
    pub label: &'static str,
    pub provider: ImageProvider,
    pub model: &'static str,
}

pub static IMAGE_MODELS: [ImageModel; 5] = [
    ImageModel {
        key: "gemini-flash-image",
        label: "Gemini 2.5 Flash Image",
        provider: ImageProvider::Gemini,
        model: "gemini-2.5-flash-image",
    },
    ImageModel {
        key: "imagen-4",
        label: "Imagen 4",
        provider: ImageProvider::Gemini,
        model: "imagen-4.0-generate-001",
    },
    ImageModel {
        key: "grok-imagine-image-pro",
        label: "Grok Imagine Image Pro",
        provider: ImageProvider::Grok,
        model: "grok-imagine-image-pro",
    },
    ImageModel {
        key: "grok-imagine-image",
        label: "Grok Imagine Image",
        provider: ImageProvider::Grok,
        model: "grok-imagine-image",
    },
    ImageModel {
        key: "grok-2-image-1212",
        label: "Grok 2 Image 1212",
        provider: ImageProvider::Grok,
        model: "grok-2-image-1212",
    },
];

/// Look up a model by key. `None` selects the built-in default.
pub fn find_model(key: Option<&str>) -> Option<&'static ImageModel> {
    let key = key.map(str::trim).unwrap_or(DEFAULT_IMAGE_MODEL_KEY);
    IMAGE_MODELS.iter().find(|m| m.key == key)
}

/// The configured default if it names a known model, else the built-in one.
pub fn default_model_key(configured: &str) -> &'static str {
    find_model(Some(configured))
        .map(|m| m.key)
        .unwrap_or(DEFAULT_IMAGE_MODEL_KEY)
}

/// Provider output normalized to raw bytes plus MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [PredictInstance<'a>; 1],
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct GrokRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GrokResponse {
    #[serde(default)]
    data: Vec<GrokImage>,
}

#[derive(Debug, Deserialize)]
struct GrokImage {
    b64_json: Option<String>,
}

pub struct ImageGenerator {
    client: Client,
    gemini_api_key: Option<String>,
    grok_api_key: Option<String>,
    grok_base_url: String,
}

impl ImageGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            gemini_api_key: config.gemini_api_key.clone(),
            grok_api_key: config.grok_api_key.clone(),
            grok_base_url: config.grok_base_url().to_string(),
        })
    }

    /// One attempt against the model's provider. No retries.
    pub async fn generate(&self, model: &ImageModel, prompt: &str) -> Result<GeneratedImage> {
        let image = match model.provider {
            ImageProvider::Gemini => self.generate_with_gemini(model.model, prompt).await?,
            ImageProvider::Grok => self.generate_with_grok(model.model, prompt).await?,
        };
        info!(
            provider = model.provider.as_str(),
            model = model.model,
            bytes = image.bytes.len(),
            "Image generated"
        );
        Ok(image)
    }

    async fn generate_with_gemini(&self, model: &str, prompt: &str) -> Result<GeneratedImage> {
        let api_key = self.gemini_api_key.as_deref().ok_or_else(|| {
            AppError::ImageProvider("Missing GEMINI_API_KEY environment variable".to_string())
        })?;

        let request = PredictRequest {
            instances: [PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "16:9",
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}:predict", GEMINI_API_URL, model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::ImageProvider(format!(
                "Gemini image generation failed: {}",
                non_empty_or(error_text, status.canonical_reason().unwrap_or("unknown error"))
            )));
        }

        parse_gemini_response(response.json().await?)
    }

    async fn generate_with_grok(&self, model: &str, prompt: &str) -> Result<GeneratedImage> {
        let api_key = self.grok_api_key.as_deref().ok_or_else(|| {
            AppError::ImageProvider("Missing GROK_API_KEY environment variable".to_string())
        })?;

        let request = GrokRequest {
            model,
            prompt,
            n: 1,
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.grok_base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::ImageProvider(format!(
                "Grok image generation failed: {}",
                non_empty_or(error_text, status.canonical_reason().unwrap_or("unknown error"))
            )));
        }

        parse_grok_response(response.json().await?)
    }
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

fn parse_gemini_response(response: PredictResponse) -> Result<GeneratedImage> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .and_then(|p| p.bytes_base64_encoded.filter(|b| !b.is_empty()).map(|b| (b, p.mime_type)));

    let (encoded, mime_type) = prediction
        .ok_or_else(|| AppError::ImageProvider("No image returned from Gemini".to_string()))?;

    Ok(GeneratedImage {
        bytes: STANDARD.decode(encoded)?,
        mime_type: mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "image/png".to_string()),
    })
}

fn parse_grok_response(response: GrokResponse) -> Result<GeneratedImage> {
    let encoded = response
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::ImageProvider("No image returned from Grok".to_string()))?;

    Ok(GeneratedImage {
        bytes: STANDARD.decode(encoded)?,
        mime_type: "image/png".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_lookup() {
        assert_eq!(find_model(None).unwrap().model, "gemini-2.5-flash-image");
        assert_eq!(find_model(Some("imagen-4")).unwrap().provider, ImageProvider::Gemini);
        assert_eq!(
            find_model(Some("grok-2-image-1212")).unwrap().provider,
            ImageProvider::Grok
        );
        assert!(find_model(Some("dall-e")).is_none());
    }

    #[test]
    fn test_unknown_configured_default_is_ignored() {
        assert_eq!(default_model_key("grok-imagine-image"), "grok-imagine-image");
        assert_eq!(default_model_key("dall-e"), "gemini-flash-image");
    }

    #[test]
    fn test_predict_request_shape() {
        let request = PredictRequest {
            instances: [PredictInstance { prompt: "sunrise" }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "16:9",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "instances": [{"prompt": "sunrise"}],
                "parameters": {"sampleCount": 1, "aspectRatio": "16:9"}
            })
        );
    }

    #[test]
    fn test_parse_gemini_prediction() {
        let response: PredictResponse = serde_json::from_str(
            r#"{"predictions":[{"bytesBase64Encoded":"aGVsbG8=","mimeType":"image/jpeg"}]}"#,
        )
        .unwrap();
        let image = parse_gemini_response(response).unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_parse_gemini_empty() {
        let response: PredictResponse = serde_json::from_str(r#"{}"#).unwrap();
        let err = parse_gemini_response(response).unwrap_err();
        assert_eq!(err.user_message(), "No image returned from Gemini");
    }

    #[test]
    fn test_parse_grok_image() {
        let response: GrokResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"aGVsbG8="}]}"#).unwrap();
        let image = parse_grok_response(response).unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime_type, "image/png");

        let empty: GrokResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(
            parse_grok_response(empty).unwrap_err().user_message(),
            "No image returned from Grok"
        );
    }

    #[test]
    fn test_bad_base64_is_an_error() {
        let response: GrokResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"!!not base64!!"}]}"#).unwrap();
        assert!(matches!(
            parse_grok_response(response),
            Err(AppError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let config = Config {
            gemini_api_key: None,
            grok_api_key: None,
            ..Config::default()
        };
        let generator = ImageGenerator::new(&config).unwrap();

        let gemini = find_model(Some("imagen-4")).unwrap();
        let err = generator.generate(gemini, "dawn").await.unwrap_err();
        assert_eq!(err.user_message(), "Missing GEMINI_API_KEY environment variable");

        let grok = find_model(Some("grok-imagine-image")).unwrap();
        let err = generator.generate(grok, "dawn").await.unwrap_err();
        assert_eq!(err.user_message(), "Missing GROK_API_KEY environment variable");
    }
}

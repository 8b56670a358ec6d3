//! OpenAiClient - image generation against the OpenAI images endpoint.

use serde::Serialize;

use super::{
    build_http_client, decode_image_payload, ensure_success, parse_generation_response,
    ImageRequest, ProviderError,
};
use crate::config::OpenAiConfig;

/// The environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default base URL for the OpenAI API.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com";

/// Default model for image generation.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-image-1";

/// Request body for `/v1/images/generations`.
///
/// Exactly one of `size` and `aspect_ratio` is sent.
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
}

/// Client for the OpenAI image generation API.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: Option<String>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client with an explicit API key and the default endpoint.
    pub fn with_api_key(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, OPENAI_API_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey { provider: "openai" });
        }

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            aspect_ratio: None,
            http_client: build_http_client()?,
        })
    }

    /// Build a client from the `[openai]` configuration section.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ProviderError::MissingApiKey { provider: "openai" })?;
        let mut client = Self::with_base_url(api_key, config.base_url().to_string())?;
        client.model = config.model().to_string();
        client.aspect_ratio = config.aspect_ratio.clone();
        Ok(client)
    }

    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate one image and return its encoded bytes.
    ///
    /// The request is sent with `size` first. Some models reject a raw size;
    /// when the API answers 400 and names the `size` parameter, the request is
    /// repeated once with `aspect_ratio` instead, provided one is known.
    pub async fn generate(&self, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        log::info!("OpenAI: generate model={} size={}", self.model, request.size);

        let sized = OpenAiRequest {
            model: &self.model,
            prompt: request.prompt,
            size: Some(request.size),
            aspect_ratio: None,
        };

        match self.send(&sized).await {
            Err(ProviderError::ApiError { status: 400, body }) if mentions_size_param(&body) => {
                let Some(aspect_ratio) = request.aspect_ratio.or(self.aspect_ratio.as_deref())
                else {
                    return Err(ProviderError::ApiError { status: 400, body });
                };
                log::warn!(
                    "OpenAI: size rejected, retrying model={} aspect={}",
                    self.model,
                    aspect_ratio
                );
                let shaped = OpenAiRequest {
                    model: &self.model,
                    prompt: request.prompt,
                    size: None,
                    aspect_ratio: Some(aspect_ratio),
                };
                self.send(&shaped).await
            }
            other => other,
        }
    }

    async fn send(&self, body: &OpenAiRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/v1/images/generations", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let text = response.text().await?;
        let image = parse_generation_response(&text)?;
        match image.b64_json.as_deref().filter(|s| !s.is_empty()) {
            Some(b64) => decode_image_payload(b64),
            None => Err(ProviderError::NoImageData),
        }
    }
}

/// Whether an error body complains about the `size` parameter.
fn mentions_size_param(body: &str) -> bool {
    body.to_lowercase().contains("size")
}

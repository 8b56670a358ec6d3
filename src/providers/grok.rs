//! GrokClient - image generation against the xAI images endpoint.

use serde::Serialize;

use super::size::aspect_ratio_from_size;
use super::{
    build_http_client, decode_image_payload, ensure_success, parse_generation_response,
    ImageRequest, ProviderError,
};
use crate::config::GrokConfig;

/// The environment variable name for the xAI API key.
pub const XAI_API_KEY_ENV: &str = "XAI_API_KEY";

/// Default base URL for the xAI API.
pub const XAI_API_BASE_URL: &str = "https://api.x.ai";

/// Default model for image generation.
pub const DEFAULT_GROK_MODEL: &str = "grok-2-vision";

/// Request body for `/v1/images/generations`.
///
/// Grok has no pixel-size parameter, so only an aspect ratio is sent.
#[derive(Debug, Serialize)]
struct GrokRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    aspect_ratio: &'a str,
}

/// Client for the Grok (xAI) image generation API.
pub struct GrokClient {
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: Option<String>,
    http_client: reqwest::Client,
}

impl GrokClient {
    /// Create a client with an explicit API key and the default endpoint.
    pub fn with_api_key(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, XAI_API_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL. Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::MissingApiKey { provider: "grok" });
        }

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_GROK_MODEL.to_string(),
            aspect_ratio: None,
            http_client: build_http_client()?,
        })
    }

    /// Build a client from the `[grok]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::MissingApiKey` when no key is configured.
    pub fn from_config(config: &GrokConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ProviderError::MissingApiKey { provider: "grok" })?;
        let mut client = Self::with_base_url(api_key, config.base_url().to_string())?;
        client.model = config.model().to_string();
        client.aspect_ratio = config.aspect_ratio.clone();
        Ok(client)
    }

    /// Override the model name.
    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Aspect ratio used when a request carries none.
    pub fn default_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
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

    /// Aspect ratio sent for `request`: explicit, then configured, then derived from the size.
    pub fn resolve_aspect_ratio(&self, request: &ImageRequest<'_>) -> String {
        request
            .aspect_ratio
            .map(str::to_string)
            .or_else(|| self.aspect_ratio.clone())
            .unwrap_or_else(|| aspect_ratio_from_size(request.size))
    }

    /// Generate one image and return its encoded bytes.
    ///
    /// The first entry of the response `data` list is used: inline `b64_json`
    /// is decoded, otherwise its `url` is downloaded.
    ///
    /// # Errors
    ///
    /// `ProviderError::ApiError` on a non-2xx status, `MalformedResponse` or
    /// `NoImageData` on an unusable body, `HttpError` on transport failure.
    pub async fn generate(&self, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let aspect_ratio = self.resolve_aspect_ratio(request);

        log::info!(
            "Grok: POST {} model={} aspect={}",
            url,
            self.model,
            aspect_ratio
        );

        let body = GrokRequest {
            model: &self.model,
            prompt: request.prompt,
            aspect_ratio: &aspect_ratio,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let text = response.text().await?;
        let image = parse_generation_response(&text)?;

        if let Some(b64) = image.b64_json.as_deref().filter(|s| !s.is_empty()) {
            log::debug!("Grok: got b64_json");
            return decode_image_payload(b64);
        }

        if let Some(image_url) = image.url.as_deref().filter(|s| !s.is_empty()) {
            log::info!("Grok: downloading {}", image_url);
            return self.download_image(image_url).await;
        }

        Err(ProviderError::NoImageData)
    }

    /// Download a generated image by URL.
    async fn download_image(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::DownloadFailed {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            bytes.extend_from_slice(&chunk_result?);
        }

        Ok(bytes)
    }
}

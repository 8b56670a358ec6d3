//! Image acquisition: remote providers with a local fallback.
//!
//! Remote providers are tried in a fixed order, each at most once per prompt.
//! Any provider failure is logged and the chain moves on; the local renderer
//! terminates the chain, so acquisition only fails if the placeholder itself
//! cannot be encoded. Whatever the source, the bytes handed back are PNG.

mod grok;
mod openai;
mod size;

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use serde::Deserialize;

use crate::config::Config;
use crate::render;

pub use grok::{GrokClient, DEFAULT_GROK_MODEL, XAI_API_BASE_URL, XAI_API_KEY_ENV};
pub use openai::{OpenAiClient, DEFAULT_OPENAI_MODEL, OPENAI_API_BASE_URL, OPENAI_API_KEY_ENV};
pub use size::{aspect_ratio_from_size, ImageSize, DEFAULT_ASPECT_RATIO, DEFAULT_SIZE};

/// Per-call timeout for provider HTTP requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection timeout for provider HTTP requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest slice of a response body kept in error messages.
const ERROR_SNIPPET_CHARS: usize = 200;

/// Errors that can occur while talking to a remote provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: &'static str },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response carried neither b64_json nor url")]
    NoImageData,

    #[error("Image download from {url} failed with status {status}")]
    DownloadFailed { status: u16, url: String },

    #[error("Invalid base64 image payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Which image source the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Grok,
    OpenAi,
    Fallback,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Grok => "grok",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grok" => Ok(ProviderKind::Grok),
            "openai" => Ok(ProviderKind::OpenAi),
            "fallback" => Ok(ProviderKind::Fallback),
            other => Err(format!(
                "unknown provider '{}' (expected grok, openai or fallback)",
                other
            )),
        }
    }
}

/// One image to generate.
#[derive(Debug, Clone, Copy)]
pub struct ImageRequest<'a> {
    /// Prompt text, passed to providers verbatim.
    pub prompt: &'a str,
    /// Raw `WxH` descriptor.
    pub size: &'a str,
    /// Explicit aspect ratio such as `16:9`.
    pub aspect_ratio: Option<&'a str>,
}

impl<'a> ImageRequest<'a> {
    pub fn new(prompt: &'a str, size: &'a str, aspect_ratio: Option<&'a str>) -> Self {
        Self {
            prompt,
            size,
            aspect_ratio,
        }
    }
}

/// A remote image generation strategy.
pub enum Provider {
    Grok(GrokClient),
    OpenAi(OpenAiClient),
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok(_) => "grok",
            Provider::OpenAi(_) => "openai",
        }
    }

    pub async fn generate(&self, request: &ImageRequest<'_>) -> Result<Vec<u8>, ProviderError> {
        match self {
            Provider::Grok(client) => client.generate(request).await,
            Provider::OpenAi(client) => client.generate(request).await,
        }
    }
}

/// Produces exactly one encoded image per prompt.
pub struct ImageAcquirer {
    chain: Vec<Provider>,
}

impl ImageAcquirer {
    /// Build the provider chain for `selection` from configured credentials.
    ///
    /// A selected provider without a credential is skipped, leaving only the
    /// local renderer.
    pub fn new(selection: ProviderKind, config: &Config) -> Self {
        let mut chain = Vec::new();

        match selection {
            ProviderKind::Grok => match GrokClient::from_config(&config.grok) {
                Ok(client) => chain.push(Provider::Grok(client)),
                Err(e) => log::warn!("Grok unavailable ({}), using local renderer", e),
            },
            ProviderKind::OpenAi => match OpenAiClient::from_config(&config.openai) {
                Ok(client) => chain.push(Provider::OpenAi(client)),
                Err(e) => log::warn!("OpenAI unavailable ({}), using local renderer", e),
            },
            ProviderKind::Fallback => {}
        }

        Self { chain }
    }

    /// An acquirer that only uses the local renderer.
    pub fn local_only() -> Self {
        Self { chain: Vec::new() }
    }

    /// An acquirer with an explicit provider chain, tried in order.
    pub fn with_providers(chain: Vec<Provider>) -> Self {
        Self { chain }
    }

    /// Names of the remote providers that will be tried, in order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(Provider::name).collect()
    }

    /// Obtain PNG bytes for `request`.
    ///
    /// Remote failures are logged and never returned. A provider image that
    /// cannot be decoded counts as a failure of that provider.
    ///
    /// # Errors
    ///
    /// Only if the local placeholder cannot be encoded.
    pub async fn acquire(&self, request: &ImageRequest<'_>) -> Result<Vec<u8>, image::ImageError> {
        for provider in &self.chain {
            match provider.generate(request).await {
                Ok(bytes) => match normalize_to_png(bytes) {
                    Ok(png) => return Ok(png),
                    Err(e) => log::warn!("{} returned an unusable image: {}", provider.name(), e),
                },
                Err(e) => log::warn!("{} error: {}", provider.name(), e),
            }
        }

        log::info!("Fallback: drawing local placeholder");
        render::render_placeholder(request.prompt, ImageSize::parse_or_default(request.size))
    }
}

/// Re-encode `bytes` as PNG unless they already are.
///
/// Frames are written as `img_NN.png`, and ffmpeg picks its image decoder from
/// that extension, so JPEG or WebP payloads must be converted first.
pub fn normalize_to_png(bytes: Vec<u8>) -> Result<Vec<u8>, image::ImageError> {
    if image::guess_format(&bytes)? == image::ImageFormat::Png {
        return Ok(bytes);
    }

    let decoded = image::load_from_memory(&bytes)?;
    let mut buf = Cursor::new(Vec::new());
    decoded.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Image generation response shared by both providers.
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Option<Vec<GeneratedImage>>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()?)
}

/// Parse a generation response body and return its first image entry.
fn parse_generation_response(text: &str) -> Result<GeneratedImage, ProviderError> {
    let parsed: GenerationResponse = serde_json::from_str(text)
        .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, snippet(text))))?;

    parsed
        .data
        .and_then(|data| data.into_iter().next())
        .ok_or_else(|| ProviderError::MalformedResponse(format!("no data: {}", snippet(text))))
}

fn decode_image_payload(b64: &str) -> Result<Vec<u8>, ProviderError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(b64.trim())?)
}

/// Turn a non-2xx response into `ProviderError::ApiError`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = read_error_body(response).await;
    Err(ProviderError::ApiError { status, body })
}

async fn read_error_body(response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    snippet(&text)
}

fn snippet(text: &str) -> String {
    text.chars().take(ERROR_SNIPPET_CHARS).collect()
}

//! Configuration handling for storyreel.
//!
//! Settings come from `~/.config/storyreel/config.toml` (or a custom path),
//! then environment variables (including a `.env` file loaded by the binary)
//! override individual fields. The resolved `Config` is built once at startup
//! and passed down explicitly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::providers::{
    ProviderKind, DEFAULT_GROK_MODEL, DEFAULT_OPENAI_MODEL, OPENAI_API_BASE_URL, XAI_API_BASE_URL,
};

/// Size requested when neither the CLI, the config file nor the environment sets one.
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Configuration file structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub grok: GrokConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[grok]` section: xAI image generation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GrokConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

/// `[openai]` section: OpenAI image generation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

/// `[render]` section: pipeline defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RenderConfig {
    /// Default provider: grok, openai or fallback.
    pub provider: Option<String>,
    /// Explicit path to the ffmpeg executable.
    pub ffmpeg: Option<PathBuf>,
}

impl GrokConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(XAI_API_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GROK_MODEL)
    }
}

impl OpenAiConfig {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Load the config file, then apply the process environment on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::load(path)?.with_env(|key| std::env::var(key).ok()))
    }

    /// Override fields from environment variables looked up through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        override_with(&mut self.grok.api_key, get("XAI_API_KEY"));
        override_with(&mut self.grok.base_url, get("XAI_BASE_URL"));
        override_with(&mut self.grok.model, get("XAI_IMAGE_MODEL"));
        override_with(&mut self.grok.aspect_ratio, get("XAI_ASPECT_RATIO"));
        override_with(&mut self.grok.image_size, get("XAI_IMAGE_SIZE"));

        override_with(&mut self.openai.api_key, get("OPENAI_API_KEY"));
        override_with(&mut self.openai.base_url, get("OPENAI_BASE_URL"));
        override_with(&mut self.openai.model, get("OPENAI_IMAGE_MODEL"));
        override_with(&mut self.openai.aspect_ratio, get("OPENAI_ASPECT_RATIO"));
        override_with(&mut self.openai.image_size, get("OPENAI_IMAGE_SIZE"));

        override_with(&mut self.render.provider, get("IMAGE_PROVIDER"));
        override_with(
            &mut self.render.ffmpeg,
            get("IMAGEIO_FFMPEG_EXE").map(PathBuf::from),
        );

        self
    }

    /// Default provider selection, `grok` when unset.
    pub fn provider(&self) -> Result<ProviderKind, ConfigError> {
        match self.render.provider.as_deref() {
            None => Ok(ProviderKind::default()),
            Some(value) => value.parse().map_err(|reason| ConfigError::InvalidValue {
                name: "provider".to_string(),
                value: value.to_string(),
                reason,
            }),
        }
    }

    /// Default image size: Grok's, then OpenAI's, then 1024x1024.
    pub fn image_size(&self) -> &str {
        self.grok
            .image_size
            .as_deref()
            .or(self.openai.image_size.as_deref())
            .unwrap_or(DEFAULT_IMAGE_SIZE)
    }

    /// Default aspect ratio: Grok's, then OpenAI's.
    pub fn aspect_ratio(&self) -> Option<&str> {
        self.grok
            .aspect_ratio
            .as_deref()
            .or(self.openai.aspect_ratio.as_deref())
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Errors raised for unusable configuration or input.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No prompts provided (after splitting by ';')")]
    NoPrompts,

    #[error("Invalid {name} '{value}': {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("storyreel").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/storyreel/config.toml")
        })
}

/// Template written by `storyreel config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# storyreel configuration
# Environment variables (XAI_*, OPENAI_*, IMAGE_PROVIDER) override these values.

[grok]
# api_key = "xai-..."
base_url = "https://api.x.ai"
model = "grok-2-vision"
# aspect_ratio = "16:9"
# image_size = "1024x1024"

[openai]
# api_key = "sk-..."
base_url = "https://api.openai.com"
model = "gpt-image-1"
# aspect_ratio = "16:9"
# image_size = "1024x1024"

[render]
# Provider: grok, openai, fallback
provider = "grok"
# ffmpeg = "/usr/local/bin/ffmpeg"
"#;

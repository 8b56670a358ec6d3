//! Environment report for `storyreel doctor`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::video::{ffmpeg_version, locate_ffmpeg, EncodingError};

/// Outcome of the environment checks.
#[derive(Debug)]
pub struct DoctorReport {
    pub version: &'static str,
    pub config_path: PathBuf,
    pub config_exists: bool,
    pub provider: String,
    pub grok_key: Option<String>,
    pub grok_model: String,
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub image_size: String,
    pub aspect_ratio: Option<String>,
    pub ffmpeg: Result<(PathBuf, String), EncodingError>,
}

impl DoctorReport {
    /// Run every check against `config`.
    pub fn collect(config: &Config, config_path: &Path) -> Self {
        let ffmpeg = locate_ffmpeg(config.render.ffmpeg.as_deref())
            .and_then(|path| ffmpeg_version(&path).map(|version| (path, version)));

        let provider = match config.provider() {
            Ok(kind) => kind.to_string(),
            Err(e) => format!("invalid ({})", e),
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            config_path: config_path.to_path_buf(),
            config_exists: config_path.exists(),
            provider,
            grok_key: config.grok.api_key.as_deref().map(mask_secret),
            grok_model: config.grok.model().to_string(),
            openai_key: config.openai.api_key.as_deref().map(mask_secret),
            openai_model: config.openai.model().to_string(),
            image_size: config.image_size().to_string(),
            aspect_ratio: config.aspect_ratio().map(str::to_string),
            ffmpeg,
        }
    }

    /// ffmpeg resolved and answered `-version`.
    pub fn is_ok(&self) -> bool {
        self.ffmpeg.is_ok()
    }

    /// Write the rendered report to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_string())
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = |k: &Option<String>| k.clone().unwrap_or_else(|| "not set".to_string());

        writeln!(f, "storyreel {}", self.version)?;
        writeln!(
            f,
            "config: {} ({})",
            self.config_path.display(),
            if self.config_exists { "exists" } else { "not found" }
        )?;
        writeln!(f, "provider: {}", self.provider)?;
        writeln!(f, "grok: key {}, model {}", key(&self.grok_key), self.grok_model)?;
        writeln!(
            f,
            "openai: key {}, model {}",
            key(&self.openai_key),
            self.openai_model
        )?;
        writeln!(f, "size: {}", self.image_size)?;
        writeln!(
            f,
            "aspect: {}",
            self.aspect_ratio.as_deref().unwrap_or("derived from size")
        )?;

        match &self.ffmpeg {
            Ok((path, version)) => {
                writeln!(f, "ffmpeg: {}", path.display())?;
                writeln!(f, "ffmpeg version: {}", version)?;
                writeln!(f, "Doctor: OK")
            }
            Err(e) => writeln!(f, "Doctor: FAIL {}", e),
        }
    }
}

/// Show only the last four characters of a credential.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

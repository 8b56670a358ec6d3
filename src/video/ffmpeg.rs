//! ffmpeg discovery and invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Lines of ffmpeg stderr kept in a failure report.
const STDERR_TAIL_LINES: usize = 20;

/// Errors that can occur while encoding video.
#[derive(Debug)]
pub enum EncodingError {
    /// FFmpeg executable not found
    FfmpegNotFound,
    /// A configured ffmpeg path does not point at a file
    ConfiguredFfmpegMissing(PathBuf),
    /// Failed to spawn FFmpeg process
    SpawnFailed(std::io::Error),
    /// FFmpeg process exited with non-zero status
    ProcessFailed { exit_code: Option<i32>, stderr: String },
    /// An input image could not be inspected
    UnreadableImage { path: PathBuf, reason: String },
    /// I/O error while preparing the output
    IoError(std::io::Error),
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::FfmpegNotFound => {
                write!(
                    f,
                    "FFmpeg not found. Install it (e.g. `brew install ffmpeg` or \
                     `apt install ffmpeg`) or set IMAGEIO_FFMPEG_EXE"
                )
            }
            EncodingError::ConfiguredFfmpegMissing(path) => {
                write!(f, "Configured ffmpeg '{}' does not exist", path.display())
            }
            EncodingError::SpawnFailed(e) => write!(f, "Failed to spawn FFmpeg: {}", e),
            EncodingError::ProcessFailed { exit_code, stderr } => {
                write!(f, "FFmpeg exited with code {:?}\n{}", exit_code, stderr)
            }
            EncodingError::UnreadableImage { path, reason } => {
                write!(f, "Cannot read image '{}': {}", path.display(), reason)
            }
            EncodingError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodingError::SpawnFailed(e) | EncodingError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// Find the ffmpeg executable.
///
/// A configured path wins; otherwise `ffmpeg` is looked up on `PATH`.
pub fn locate_ffmpeg(configured: Option<&Path>) -> Result<PathBuf, EncodingError> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        // Bare names like "ffmpeg6" resolve through PATH.
        return which::which(path)
            .map_err(|_| EncodingError::ConfiguredFfmpegMissing(path.to_path_buf()));
    }

    which::which("ffmpeg").map_err(|_| EncodingError::FfmpegNotFound)
}

/// Run ffmpeg to completion with `args`.
///
/// Output is captured; on failure the tail of stderr is returned in the error.
pub fn run_ffmpeg(ffmpeg: &Path, args: &[String]) -> Result<(), EncodingError> {
    log::debug!("ffmpeg {}", args.join(" "));

    let output = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodingError::FfmpegNotFound
            } else {
                EncodingError::SpawnFailed(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            log::debug!("[ffmpeg] {}", line);
        }
        return Err(EncodingError::ProcessFailed {
            exit_code: output.status.code(),
            stderr: stderr_tail(&stderr),
        });
    }

    Ok(())
}

/// First line of `ffmpeg -version`.
pub fn ffmpeg_version(ffmpeg: &Path) -> Result<String, EncodingError> {
    let output = Command::new(ffmpeg)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(EncodingError::SpawnFailed)?;

    if !output.status.success() {
        return Err(EncodingError::ProcessFailed {
            exit_code: output.status.code(),
            stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

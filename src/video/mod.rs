//! Video assembly.
//!
//! Still images become fixed-duration clips that are concatenated in order
//! and encoded by ffmpeg as H.264 without audio. Frames of different sizes
//! are centered on a shared canvas large enough for all of them.

mod ffmpeg;

use std::path::{Path, PathBuf};

use crate::frame::RenderJob;

pub use ffmpeg::{ffmpeg_version, locate_ffmpeg, run_ffmpeg, EncodingError};

/// Frame rate used when none is given.
pub const DEFAULT_FPS: u32 = 24;

/// Per-frame duration used when no explicit list is given.
pub const DEFAULT_FRAME_SECONDS: f64 = 2.0;

/// Smoke clip: size, color, length and rate.
const SMOKE_SIZE: (u32, u32) = (320, 240);
const SMOKE_COLOR: &str = "0x141414";
const SMOKE_SECONDS: u32 = 2;
const SMOKE_FPS: u32 = 24;

/// Resolve the display duration of each of `count` frames.
///
/// Explicit durations are used in order; a short list is padded with
/// `each_sec`, a long one is cut to `count`. An empty list counts as absent.
pub fn reconcile_durations(count: usize, each_sec: f64, explicit: Option<&[f64]>) -> Vec<f64> {
    let explicit = explicit.unwrap_or_default();
    explicit
        .iter()
        .copied()
        .chain(std::iter::repeat(each_sec))
        .take(count)
        .collect()
}

/// One still image shown for `duration` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub path: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl Clip {
    /// Inspect `path` for its pixel dimensions.
    ///
    /// The format is detected from the file contents, not its extension.
    pub fn from_image(path: &Path, duration: f64) -> Result<Self, EncodingError> {
        let unreadable = |reason: String| EncodingError::UnreadableImage {
            path: path.to_path_buf(),
            reason,
        };
        let (width, height) = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| unreadable(e.to_string()))?
            .into_dimensions()
            .map_err(|e| unreadable(e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            duration,
            width,
            height,
        })
    }
}

/// Encodes clips to a video file through ffmpeg.
#[derive(Debug, Clone)]
pub struct VideoAssembler {
    ffmpeg: PathBuf,
}

impl VideoAssembler {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    /// Locate ffmpeg, preferring `configured`.
    pub fn locate(configured: Option<&Path>) -> Result<Self, EncodingError> {
        Ok(Self::new(locate_ffmpeg(configured)?))
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Assemble `images` into `output`, reconciling `durations` against `each_sec`.
    pub fn assemble(
        &self,
        images: &[PathBuf],
        output: &Path,
        fps: u32,
        each_sec: f64,
        durations: Option<&[f64]>,
    ) -> Result<PathBuf, EncodingError> {
        let resolved = reconcile_durations(images.len(), each_sec, durations);
        let clips = images
            .iter()
            .zip(resolved)
            .map(|(path, duration)| Clip::from_image(path, duration))
            .collect::<Result<Vec<_>, _>>()?;
        self.encode(&clips, output, fps)
    }

    /// Encode a validated render job.
    pub fn render_job(&self, job: &RenderJob) -> Result<PathBuf, EncodingError> {
        let clips = job
            .frames()
            .iter()
            .map(|frame| Clip::from_image(&frame.path, frame.duration))
            .collect::<Result<Vec<_>, _>>()?;
        self.encode(&clips, job.output(), job.fps())
    }

    /// Concatenate `clips` into `output` at `fps`. Overwrites an existing file.
    pub fn encode(&self, clips: &[Clip], output: &Path, fps: u32) -> Result<PathBuf, EncodingError> {
        ensure_parent_dir(output)?;

        let args = compose_args(clips, output, fps);
        log::info!(
            "Encoding {} clip(s) to {} at {} fps",
            clips.len(),
            output.display(),
            fps
        );
        run_ffmpeg(&self.ffmpeg, &args)?;

        Ok(output.to_path_buf())
    }

    /// Render a 2-second 320x240 solid clip to check that encoding works.
    pub fn smoke(&self, output: &Path) -> Result<PathBuf, EncodingError> {
        ensure_parent_dir(output)?;
        run_ffmpeg(&self.ffmpeg, &smoke_args(output))?;
        Ok(output.to_path_buf())
    }
}

/// Smallest even-sized canvas that fits every clip.
pub fn compose_canvas(clips: &[Clip]) -> (u32, u32) {
    let width = clips.iter().map(|c| c.width).max().unwrap_or(2);
    let height = clips.iter().map(|c| c.height).max().unwrap_or(2);
    (round_up_even(width), round_up_even(height))
}

fn round_up_even(n: u32) -> u32 {
    (n.max(2) + 1) & !1
}

/// ffmpeg arguments that loop each image for its duration, center it on
/// the shared canvas and concatenate the results.
pub fn compose_args(clips: &[Clip], output: &Path, fps: u32) -> Vec<String> {
    let (canvas_w, canvas_h) = compose_canvas(clips);
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into(), "-nostdin".into()];

    for clip in clips {
        args.extend([
            "-loop".into(),
            "1".into(),
            "-t".into(),
            format_seconds(clip.duration),
            "-i".into(),
            clip.path.display().to_string(),
        ]);
    }

    let mut filter = String::new();
    for i in 0..clips.len() {
        filter.push_str(&format!(
            "[{i}:v]pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps},format=yuv420p[v{i}];",
            i = i,
            w = canvas_w,
            h = canvas_h,
            fps = fps
        ));
    }
    for i in 0..clips.len() {
        filter.push_str(&format!("[v{}]", i));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=0[out]", clips.len()));

    args.extend([
        "-filter_complex".into(),
        filter,
        "-map".into(),
        "[out]".into(),
        "-r".into(),
        fps.to_string(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-an".into(),
        "-movflags".into(),
        "+faststart".into(),
        output.display().to_string(),
    ]);

    args
}

fn smoke_args(output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-nostdin".into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!(
            "color=c={}:s={}x{}:d={}:r={}",
            SMOKE_COLOR, SMOKE_SIZE.0, SMOKE_SIZE.1, SMOKE_SECONDS, SMOKE_FPS
        ),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-an".into(),
        output.display().to_string(),
    ]
}

/// Seconds as ffmpeg reads them. `f64` display never rounds a small positive
/// value down to zero or switches to exponent notation.
fn format_seconds(seconds: f64) -> String {
    seconds.to_string()
}

fn ensure_parent_dir(output: &Path) -> Result<(), EncodingError> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(EncodingError::IoError)
        }
        _ => Ok(()),
    }
}

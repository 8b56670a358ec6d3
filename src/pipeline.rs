//! Story pipeline: prompts → images → frames on disk → video.
//!
//! Prompts are processed one at a time in order. Frames are written into a
//! scoped temporary directory that is removed when the run ends, unless the
//! caller asks to keep it.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::frame::{frame_file_name, Frame, RenderJob};
use crate::prompts::PromptSource;
use crate::providers::{aspect_ratio_from_size, ImageAcquirer, ImageRequest};
use crate::timeline::Timeline;
use crate::video::{reconcile_durations, EncodingError, VideoAssembler};

/// Prefix of the per-run frame directory.
pub const FRAMES_DIR_PREFIX: &str = "storyreel_imgs_";

/// Errors that end a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Failed to draw placeholder image: {0}")]
    Placeholder(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a `render-images` run needs besides the acquirer and assembler.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub prompts: PromptSource,
    /// `WxH` descriptor passed to providers.
    pub size: String,
    /// Explicit aspect ratio passed to providers.
    pub aspect_ratio: Option<String>,
    pub fps: u32,
    /// Uniform per-frame duration.
    pub each_sec: f64,
    /// Explicit per-frame durations, reconciled against the frame count.
    pub durations: Option<Vec<f64>>,
    pub output: PathBuf,
    /// Keep the frame directory instead of removing it.
    pub keep_frames: bool,
    /// Where to write a JSON timeline manifest.
    pub timeline: Option<PathBuf>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub output: PathBuf,
    pub frames: Vec<Frame>,
    /// Frame directory, present only when it was kept.
    pub frames_dir: Option<PathBuf>,
    pub timeline: Option<PathBuf>,
}

impl RenderOutcome {
    pub fn total_duration(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }
}

/// Drives a run from prompts to the final video.
pub struct StoryPipeline<'a> {
    acquirer: &'a ImageAcquirer,
    assembler: &'a VideoAssembler,
}

impl<'a> StoryPipeline<'a> {
    pub fn new(acquirer: &'a ImageAcquirer, assembler: &'a VideoAssembler) -> Self {
        Self {
            acquirer,
            assembler,
        }
    }

    /// Run the pipeline end to end.
    ///
    /// # Errors
    ///
    /// `RenderError::Config` if there are no prompts or a parameter is out of
    /// range, `RenderError::Encoding` if ffmpeg fails. Provider failures never
    /// surface here.
    pub async fn run(&self, options: &RenderOptions) -> Result<RenderOutcome, RenderError> {
        let prompts = options.prompts.resolve()?;
        validate_timing(options)?;

        let frames_dir = tempfile::Builder::new()
            .prefix(FRAMES_DIR_PREFIX)
            .tempdir()?;
        log::info!(
            "Generating {} frame(s) into {}",
            prompts.len(),
            frames_dir.path().display()
        );

        let durations =
            reconcile_durations(prompts.len(), options.each_sec, options.durations.as_deref());

        let mut frames = Vec::with_capacity(prompts.len());
        for (index, (prompt, duration)) in prompts.into_iter().zip(durations).enumerate() {
            let request =
                ImageRequest::new(&prompt, &options.size, options.aspect_ratio.as_deref());
            let bytes = self.acquirer.acquire(&request).await?;
            let path = materialize_frame(frames_dir.path(), index, &bytes).await?;
            log::info!("saved: {}", path.display());

            frames.push(Frame {
                index,
                prompt,
                path,
                duration,
            });
        }

        let job = RenderJob::new(frames, options.fps, options.output.clone())?;
        let output = self.assembler.render_job(&job)?;

        let timeline = match &options.timeline {
            Some(path) => {
                let aspect = options
                    .aspect_ratio
                    .clone()
                    .unwrap_or_else(|| aspect_ratio_from_size(&options.size));
                Timeline::from_job(&job, &aspect).write(path)?;
                log::info!("Timeline: {}", path.display());
                Some(path.clone())
            }
            None => None,
        };

        let frames_dir = if options.keep_frames {
            Some(frames_dir.keep())
        } else {
            None
        };

        Ok(RenderOutcome {
            output,
            frames: job.frames().to_vec(),
            frames_dir,
            timeline,
        })
    }
}

/// Write one frame's bytes as `img_NN.png` inside `dir`.
pub async fn materialize_frame(dir: &Path, index: usize, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(frame_file_name(index));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

fn validate_timing(options: &RenderOptions) -> Result<(), ConfigError> {
    let positive = |name: &str, value: f64| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                reason: "must be a positive number of seconds".to_string(),
            })
        }
    };

    positive("seconds", options.each_sec)?;
    for value in options.durations.iter().flatten() {
        positive("duration", *value)?;
    }
    Ok(())
}

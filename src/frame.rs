//! Frames and render jobs.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// File name for the frame at `index`: `img_00.png`, `img_01.png`, ...
pub fn frame_file_name(index: usize) -> String {
    format!("img_{:02}.png", index)
}

/// One generated image, materialized on disk, with its display time.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Position in the prompt list.
    pub index: usize,
    /// Prompt the image was generated from.
    pub prompt: String,
    /// Where the encoded image was written.
    pub path: PathBuf,
    /// Display duration in seconds.
    pub duration: f64,
}

/// An ordered frame sequence plus output parameters, consumed by the assembler.
#[derive(Debug, Clone)]
pub struct RenderJob {
    frames: Vec<Frame>,
    fps: u32,
    output: PathBuf,
}

impl RenderJob {
    /// Validate and build a job.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoPrompts` for an empty sequence, `InvalidValue` for a
    /// zero frame rate or a non-positive duration.
    pub fn new(frames: Vec<Frame>, fps: u32, output: PathBuf) -> Result<Self, ConfigError> {
        if frames.is_empty() {
            return Err(ConfigError::NoPrompts);
        }
        if fps == 0 {
            return Err(ConfigError::InvalidValue {
                name: "fps".to_string(),
                value: fps.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(frame) = frames
            .iter()
            .find(|f| !f.duration.is_finite() || f.duration <= 0.0)
        {
            return Err(ConfigError::InvalidValue {
                name: format!("duration for frame {}", frame.index),
                value: frame.duration.to_string(),
                reason: "must be a positive number of seconds".to_string(),
            });
        }

        Ok(Self {
            frames,
            fps,
            output,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn durations(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.duration).collect()
    }

    /// Sum of all frame durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.frames.iter().map(|f| f.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize, duration: f64) -> Frame {
        Frame {
            index,
            prompt: format!("prompt {}", index),
            path: PathBuf::from(frame_file_name(index)),
            duration,
        }
    }

    #[test]
    fn test_frame_file_name_is_zero_padded() {
        assert_eq!(frame_file_name(0), "img_00.png");
        assert_eq!(frame_file_name(7), "img_07.png");
        assert_eq!(frame_file_name(42), "img_42.png");
        assert_eq!(frame_file_name(123), "img_123.png");
    }

    #[test]
    fn test_render_job_total_duration() {
        let job = RenderJob::new(
            vec![frame(0, 2.0), frame(1, 1.5), frame(2, 1.5)],
            24,
            PathBuf::from("out.mp4"),
        )
        .unwrap();
        assert_eq!(job.total_duration(), 5.0);
        assert_eq!(job.durations(), vec![2.0, 1.5, 1.5]);
        assert_eq!(job.fps(), 24);
        assert_eq!(job.output(), Path::new("out.mp4"));
    }

    #[test]
    fn test_render_job_rejects_empty() {
        assert!(matches!(
            RenderJob::new(Vec::new(), 24, PathBuf::from("out.mp4")),
            Err(ConfigError::NoPrompts)
        ));
    }

    #[test]
    fn test_render_job_rejects_bad_duration() {
        assert!(matches!(
            RenderJob::new(vec![frame(0, 0.0)], 24, PathBuf::from("out.mp4")),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            RenderJob::new(vec![frame(0, f64::NAN)], 24, PathBuf::from("out.mp4")),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_render_job_rejects_zero_fps() {
        assert!(matches!(
            RenderJob::new(vec![frame(0, 1.0)], 0, PathBuf::from("out.mp4")),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

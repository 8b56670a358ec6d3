//! JSON timeline manifest describing a rendered story.

use std::path::Path;

use serde::Serialize;

use crate::frame::RenderJob;

/// Manifest format version.
pub const TIMELINE_VERSION: &str = "1.1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub version: String,
    pub aspect: String,
    pub fps: u32,
    pub scenes: Vec<TimelineScene>,
}

/// One frame's slot in the video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineScene {
    pub index: usize,
    pub start: String,
    pub end: String,
    pub duration_sec: f64,
    pub image_prompt: String,
}

impl Timeline {
    /// Lay the job's frames end to end.
    pub fn from_job(job: &RenderJob, aspect: &str) -> Self {
        let mut cursor = 0.0;
        let scenes = job
            .frames()
            .iter()
            .map(|frame| {
                let start = cursor;
                cursor += frame.duration;
                TimelineScene {
                    index: frame.index,
                    start: format_timestamp(start),
                    end: format_timestamp(cursor),
                    duration_sec: frame.duration,
                    image_prompt: frame.prompt.clone(),
                }
            })
            .collect();

        Self {
            version: TIMELINE_VERSION.to_string(),
            aspect: aspect.to_string(),
            fps: job.fps(),
            scenes,
        }
    }

    /// Write the manifest as pretty-printed JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

/// `HH:MM:SS.mmm` for a non-negative number of seconds.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use std::path::PathBuf;

    fn job() -> RenderJob {
        let frames = [("castle", 2.0), ("dragon", 1.5), ("dawn", 1.5)]
            .iter()
            .enumerate()
            .map(|(index, (prompt, duration))| Frame {
                index,
                prompt: prompt.to_string(),
                path: PathBuf::from(format!("img_{:02}.png", index)),
                duration: *duration,
            })
            .collect();
        RenderJob::new(frames, 24, PathBuf::from("out.mp4")).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(2.5), "00:00:02.500");
        assert_eq!(format_timestamp(3725.042), "01:02:05.042");
    }

    #[test]
    fn test_from_job_is_cumulative() {
        let timeline = Timeline::from_job(&job(), "16:9");
        assert_eq!(timeline.version, "1.1");
        assert_eq!(timeline.aspect, "16:9");
        assert_eq!(timeline.fps, 24);
        let ends: Vec<&str> = timeline.scenes.iter().map(|s| s.end.as_str()).collect();
        assert_eq!(ends, vec!["00:00:02.000", "00:00:03.500", "00:00:05.000"]);
        assert_eq!(timeline.scenes[1].start, "00:00:02.000");
        assert_eq!(timeline.scenes[2].image_prompt, "dawn");
    }

    #[test]
    fn test_serializes_camel_case() {
        let timeline = Timeline::from_job(&job(), "1:1");
        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["scenes"][0]["durationSec"], 2.0);
        assert_eq!(json["scenes"][0]["imagePrompt"], "castle");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta/timeline.json");
        Timeline::from_job(&job(), "1:1").write(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\": \"1.1\""));
    }
}

//! CLI argument parsing with clap.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::ProviderArg;
use crate::video::{DEFAULT_FPS, DEFAULT_FRAME_SECONDS};

/// Parse and validate a duration in seconds (> 0)
pub fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("Duration must be greater than 0, got {}", secs));
    }
    Ok(secs)
}

/// Parse and validate framerate (1-120 fps)
pub fn parse_framerate(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid framerate", s))?;
    if !(1..=120).contains(&fps) {
        return Err(format!(
            "Framerate must be between 1 and 120 fps, got {}",
            fps
        ));
    }
    Ok(fps)
}

/// Turn text prompts into a slideshow video of generated images
#[derive(Parser, Debug)]
#[command(name = "storyreel")]
#[command(version, about = "Turn text prompts into a video of AI-generated stills", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Three frames from one prompt
    storyreel render-images --prompt \"a lighthouse at dusk\" --num 3

    # One frame per prompt, custom durations
    storyreel render-images --prompts \"castle; dragon; dawn\" --durations 2 1.5 3

    # Offline run with the local placeholder renderer
    storyreel render-images --prompts \"a; b\" --provider fallback

    # Check ffmpeg and credentials
    storyreel doctor

ENVIRONMENT:
    XAI_API_KEY, OPENAI_API_KEY    Provider credentials (also read from .env)
    IMAGE_PROVIDER                 Default provider: grok, openai, fallback
    IMAGEIO_FFMPEG_EXE             Explicit ffmpeg executable")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report ffmpeg and provider setup
    Doctor {
        /// Also write the report to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render a short solid-color clip to check encoding
    Smoke {
        /// Output video path
        #[arg(long, default_value = "releases/smoke_test.mp4")]
        out: PathBuf,
    },
    /// Generate images then assemble them into an mp4
    RenderImages(RenderImagesArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Clone)]
#[command(group(ArgGroup::new("input").required(true).args(["prompt", "prompts"])))]
pub struct RenderImagesArgs {
    /// One prompt used for every frame (see --num)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Prompts separated by ';', each may span several lines
    #[arg(long)]
    pub prompts: Option<String>,

    /// Number of frames, only used with --prompt
    #[arg(long, default_value_t = 3)]
    pub num: usize,

    /// Seconds per frame when --durations is not given or too short
    #[arg(long, default_value_t = DEFAULT_FRAME_SECONDS, value_parser = parse_seconds)]
    pub seconds: f64,

    /// Output framerate (1-120 fps)
    #[arg(long, default_value_t = DEFAULT_FPS, value_parser = parse_framerate)]
    pub fps: u32,

    /// Seconds for each frame, space or comma separated (e.g. 2 1.5 3)
    #[arg(long, num_args = 1.., value_delimiter = ',', value_parser = parse_seconds)]
    pub durations: Option<Vec<f64>>,

    /// Image size WIDTHxHEIGHT (default: XAI_IMAGE_SIZE, OPENAI_IMAGE_SIZE, 1024x1024)
    #[arg(long)]
    pub size: Option<String>,

    /// Aspect ratio such as 16:9 (default: XAI_ASPECT_RATIO, OPENAI_ASPECT_RATIO)
    #[arg(long)]
    pub aspect: Option<String>,

    /// Image provider (default: IMAGE_PROVIDER, grok)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Output video path
    #[arg(long, short, default_value = "releases/out.mp4")]
    pub out: PathBuf,

    /// Keep the generated frames and print their directory
    #[arg(long)]
    pub keep_frames: bool,

    /// Write a JSON timeline of the rendered scenes
    #[arg(long)]
    pub timeline: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

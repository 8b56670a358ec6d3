//! Subcommand handlers.

use std::path::{Path, PathBuf};

use super::args::{ConfigAction, RenderImagesArgs};
use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};
use crate::doctor::DoctorReport;
use crate::pipeline::{RenderOptions, StoryPipeline};
use crate::prompts::PromptSource;
use crate::providers::{ImageAcquirer, ProviderKind};
use crate::video::VideoAssembler;

/// Exit code for a failed `doctor` run.
pub const DOCTOR_FAILURE_EXIT_CODE: i32 = 2;

/// Build the pipeline options for `args`, filling unset values from `config`.
pub fn render_options(args: &RenderImagesArgs, config: &Config) -> RenderOptions {
    let prompts = match (&args.prompts, &args.prompt) {
        (Some(list), _) => PromptSource::Delimited(list.clone()),
        (None, prompt) => PromptSource::Repeated {
            prompt: prompt.clone().unwrap_or_default(),
            count: args.num,
        },
    };

    let aspect_ratio = args
        .aspect
        .as_deref()
        .or(config.aspect_ratio())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    RenderOptions {
        prompts,
        size: args
            .size
            .clone()
            .unwrap_or_else(|| config.image_size().to_string()),
        aspect_ratio,
        fps: args.fps,
        each_sec: args.seconds,
        durations: args.durations.clone().filter(|d| !d.is_empty()),
        output: args.out.clone(),
        keep_frames: args.keep_frames,
        timeline: args.timeline.clone(),
    }
}

/// Run `render-images` and return the written video path.
pub fn run_render_images(args: &RenderImagesArgs, config: &Config) -> Result<PathBuf, String> {
    let provider: ProviderKind = match args.provider {
        Some(p) => p.into(),
        None => config.provider().map_err(|e| e.to_string())?,
    };
    let options = render_options(args, config);

    let assembler =
        VideoAssembler::locate(config.render.ffmpeg.as_deref()).map_err(|e| e.to_string())?;
    let acquirer = ImageAcquirer::new(provider, config);
    log::info!(
        "Provider: {} (remote chain: [{}])",
        provider,
        acquirer.provider_names().join(", ")
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    let outcome = rt
        .block_on(StoryPipeline::new(&acquirer, &assembler).run(&options))
        .map_err(|e| e.to_string())?;

    if let Some(dir) = &outcome.frames_dir {
        println!("Frames: {}", dir.display());
    }
    if let Some(timeline) = &outcome.timeline {
        println!("Timeline: {}", timeline.display());
    }
    println!(
        "Video: {} ({} frames, {:.2}s)",
        outcome.output.display(),
        outcome.frames.len(),
        outcome.total_duration()
    );

    Ok(outcome.output)
}

/// Run `smoke` and return the written video path.
pub fn run_smoke(out: &Path, config: &Config) -> Result<PathBuf, String> {
    let assembler =
        VideoAssembler::locate(config.render.ffmpeg.as_deref()).map_err(|e| e.to_string())?;
    let path = assembler.smoke(out).map_err(|e| e.to_string())?;
    println!("Rendered: {}", path.display());
    Ok(path)
}

/// Run `doctor`, print the report and return the process exit code.
pub fn run_doctor(out: Option<&Path>, config: &Config, config_path: &Path) -> i32 {
    let report = DoctorReport::collect(config, config_path);
    print!("{}", report);

    if let Some(out) = out {
        match report.save(out) {
            Ok(()) => println!("Report: {}", out.display()),
            Err(e) => eprintln!("Warning: could not write {}: {}", out.display(), e),
        }
    }

    if report.is_ok() {
        0
    } else {
        DOCTOR_FAILURE_EXIT_CODE
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    config_path: &Path,
) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            let provider = config
                .provider()
                .map(|p| p.to_string())
                .unwrap_or_else(|e| e.to_string());

            println!("Current configuration:");
            println!("  Provider: {}", provider);
            println!("  Size: {}", config.image_size());
            println!(
                "  Aspect: {}",
                config.aspect_ratio().unwrap_or("derived from size")
            );
            println!("  Grok: {} ({})", config.grok.model(), config.grok.base_url());
            println!(
                "  OpenAI: {} ({})",
                config.openai.model(),
                config.openai.base_url()
            );
            println!(
                "  ffmpeg: {}",
                config
                    .render
                    .ffmpeg
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "from PATH".to_string())
            );
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(format!(
                    "Config file already exists: {}\nUse 'storyreel config show' to view current settings.",
                    config_path.display()
                ));
            }

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Error creating config directory: {}", e))?;
            }

            std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE)
                .map_err(|e| format!("Error writing config file: {}", e))?;

            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

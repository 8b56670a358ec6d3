//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{parse_framerate, parse_seconds, Args, Command, ConfigAction, RenderImagesArgs};
pub use commands::{
    handle_config_action, render_options, run_doctor, run_render_images, run_smoke,
    DOCTOR_FAILURE_EXIT_CODE,
};
pub use enums::ProviderArg;

//! storyreel library crate.
//!
//! Prompts become images (remote providers with a local fallback), and the
//! images become one H.264 video through ffmpeg. The modules are public so
//! integration tests can drive each stage directly.

pub mod cli;
pub mod config;
pub mod doctor;
pub mod frame;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod timeline;
pub mod video;

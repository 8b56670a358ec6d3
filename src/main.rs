use clap::Parser;
use tracing_subscriber::EnvFilter;

use storyreel::cli::{self, Args, Command};
use storyreel::config::{self, Config};

/// Load .env file without overriding existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `info` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    load_env();
    init_logging();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(config::default_path);

    let cfg = match Config::resolve(Some(config_path.as_path())) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Doctor { out } => {
            let code = cli::run_doctor(out.as_deref(), &cfg, &config_path);
            std::process::exit(code);
        }
        Command::Smoke { out } => {
            if let Err(e) = cli::run_smoke(&out, &cfg) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Command::RenderImages(render_args) => {
            if let Err(e) = cli::run_render_images(&render_args, &cfg) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Config { action } => {
            if let Err(e) = cli::handle_config_action(action, &cfg, &config_path) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

//! Ward Assist CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ward_cli::cli::Cli;
use ward_cli::commands;
use ward_core::Settings;

fn main() {
    // .env / .env.local hold GROQ_API_KEY and the store credentials
    ward_core::load_env();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    let state_dir = cli.state_dir();

    let result = Settings::from_env()
        .map_err(Into::into)
        .and_then(|settings| commands::execute(cli.command, &settings, &state_dir));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

//! Command handlers for CLI subcommands.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use ward_agent::SpeechClient;
use ward_api::{ApiConfig, AppState};
use ward_core::Settings;
use ward_orchestrator::{Answer, Orchestrator, SessionId};

use crate::cli::Commands;
use crate::error::Result;
use crate::repl::Repl;

/// Execute a CLI command. `None` starts the REPL.
pub fn execute(command: Option<Commands>, settings: &Settings, state_dir: &Path) -> Result<()> {
    match command {
        None | Some(Commands::Chat) => cmd_chat(settings, state_dir),
        Some(Commands::Ask { message }) => cmd_ask(settings, &message.join(" ")),
        Some(Commands::Serve {
            host,
            port,
            no_speech,
        }) => cmd_serve(settings, host, port, no_speech),
    }
}

fn cmd_chat(settings: &Settings, state_dir: &Path) -> Result<()> {
    let orchestrator = Orchestrator::from_settings(settings)?;
    let mut repl = Repl::new(orchestrator, state_dir)?;
    repl.run()
}

fn cmd_ask(settings: &Settings, message: &str) -> Result<()> {
    let orchestrator = Orchestrator::from_settings(settings)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let answer = runtime.block_on(ask(&orchestrator, message))?;
    if answer.failed {
        warn!("Turn failed");
    }
    println!("{}", answer.text);
    Ok(())
}

/// Run one turn on a throwaway session.
pub async fn ask(orchestrator: &Orchestrator, message: &str) -> Result<Answer> {
    let session = SessionId::new();
    Ok(orchestrator.handle_turn(&session, message).await?)
}

fn cmd_serve(
    settings: &Settings,
    host: Option<String>,
    port: Option<u16>,
    no_speech: bool,
) -> Result<()> {
    let orchestrator = Orchestrator::from_settings(settings)?;
    let speech = if no_speech {
        None
    } else {
        Some(SpeechClient::from_settings(&settings.llm)?)
    };

    let mut api = settings.api.clone();
    if let Some(host) = host {
        api.host = host;
    }
    if let Some(port) = port {
        api.port = port;
    }
    let config = ApiConfig::from_settings(&api);

    info!(
        address = %config.bind_address(),
        speech = speech.is_some(),
        "Starting API server"
    );
    println!("Ward Assist API listening on http://{}", config.bind_address());

    let state = AppState::new(config.clone(), Arc::new(orchestrator), speech);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(ward_api::serve(config, state))?;
    Ok(())
}

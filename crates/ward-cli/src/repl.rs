//! Interactive REPL (Read-Eval-Print Loop) for Ward Assist.

use std::path::{Path, PathBuf};

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::{debug, info};

use ward_core::config::HISTORY_FILE;
use ward_orchestrator::{Message, MessageRole, Orchestrator, OrchestratorError, SessionId};

use crate::error::Result;

/// Slash commands with their one-line help.
const HELP: &[(&str, &str)] = &[
    ("/history", "Show this conversation"),
    ("/clear", "Start a new conversation"),
    ("/help", "Show this help"),
    ("/quit", "Exit (also /exit, Ctrl+D)"),
];

/// Tab completion for slash commands.
struct CommandCompleter;

impl CommandCompleter {
    const COMMANDS: &'static [&'static str] = &["/clear", "/exit", "/help", "/history", "/quit"];
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let prefix = &line[..pos];
        let matches: Vec<Pair> = Self::COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Input understood by the REPL.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Show the conversation so far
    History,
    /// Drop the conversation and start a new one
    Clear,
    /// Show help
    Help,
    /// Quit the REPL
    Quit,
    /// Unknown slash command
    Unknown(String),
    /// A question for the assistant
    Text(String),
}

impl ReplCommand {
    /// Parses input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        let Some(stripped) = input.strip_prefix('/') else {
            return ReplCommand::Text(input.to_string());
        };

        let cmd = stripped
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match cmd.as_str() {
            "history" => ReplCommand::History,
            "clear" | "new" => ReplCommand::Clear,
            "help" | "h" | "?" => ReplCommand::Help,
            "quit" | "q" | "exit" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(cmd),
        }
    }
}

/// Render one history entry for the terminal.
pub fn format_entry(message: &Message) -> String {
    let speaker = match message.role {
        MessageRole::User => "You",
        MessageRole::Assistant => "Assistant",
    };
    format!(
        "[{}] {}: {}",
        message.timestamp.format("%H:%M:%S"),
        speaker,
        message.content
    )
}

/// REPL state
pub struct Repl {
    editor: Editor<CommandCompleter, DefaultHistory>,
    orchestrator: Orchestrator,
    session: SessionId,
    runtime: tokio::runtime::Runtime,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Creates a new REPL instance.
    pub fn new(orchestrator: Orchestrator, state_dir: &Path) -> Result<Self> {
        let config = rustyline::Config::builder()
            .completion_type(rustyline::CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CommandCompleter));

        let runtime = tokio::runtime::Runtime::new()?;

        let history_path = state_dir.join(HISTORY_FILE);
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }

        Ok(Self {
            editor,
            orchestrator,
            session: SessionId::new(),
            runtime,
            history_path: Some(history_path),
        })
    }

    /// Runs the REPL loop.
    pub fn run(&mut self) -> Result<()> {
        println!("Ward Assist v{}", env!("CARGO_PKG_VERSION"));
        println!("Ask about equipment, staff or locations. Type /help for commands, /quit to exit");
        println!();

        loop {
            match self.editor.readline("ward> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(&line)?;

                    let cmd = ReplCommand::parse(&line);
                    debug!(?cmd, "Parsed command");

                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Handles a REPL command. Returns true if should quit.
    fn handle_command(&mut self, cmd: ReplCommand) -> bool {
        match cmd {
            ReplCommand::Text(text) => {
                match self
                    .runtime
                    .block_on(self.orchestrator.handle_turn(&self.session, &text))
                {
                    Ok(answer) => println!("\n{}\n", answer.text),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            ReplCommand::History => {
                match self.runtime.block_on(self.orchestrator.history(&self.session)) {
                    Ok(messages) if !messages.is_empty() => {
                        for message in &messages {
                            println!("{}", format_entry(message));
                        }
                    }
                    Ok(_) | Err(OrchestratorError::SessionNotFound(_)) => {
                        println!("No messages yet.")
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            ReplCommand::Clear => {
                let old = std::mem::take(&mut self.session);
                self.runtime.block_on(self.orchestrator.sessions().remove(&old));
                info!(session_id = %self.session, "Started new conversation");
                println!("Started a new conversation.");
            }
            ReplCommand::Help => {
                println!("Type a question, or one of:");
                for (command, description) in HELP {
                    println!("  {:<10} {}", command, description);
                }
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: /{}. Type /help for commands.", cmd);
            }
            ReplCommand::Quit => return true,
        }
        false
    }
}

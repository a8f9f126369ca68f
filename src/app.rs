//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A chat-style terminal recorder: type messages into a log, record short
/// audio clips from the microphone and play the last one back
#[derive(Parser)]
#[command(name = "chatrec")]
#[command(version)]
#[command(about = "Chat-style terminal recorder")]
#[command(
    long_about = "A chat-style terminal recorder.\n\nType messages into a scrollable log, record short audio clips from the\nsystem microphone and play the last recording back through the speakers.\nRecordings are saved as mono WAV files in the working directory.\n\nDEFAULT COMMAND:\n    If no command is specified, 'chat' is used by default.\n\nEXAMPLES:\n    # Start the chat window\n    $ chatrec\n    $ chatrec chat\n\n    # See which audio devices are available\n    $ chatrec list-devices\n\n    # Troubleshoot a session\n    $ chatrec logs"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/chatrec/chatrec.toml (optional)\n    Logs:               ~/.local/state/chatrec/chatrec.log.*\n    Recordings:         ./recording_<unix-timestamp>.wav"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat window (default)
    ///
    /// Enter sends the typed message, Ctrl+R starts recording, Ctrl+S stops
    /// and saves, Ctrl+P plays the last recording, Esc or Ctrl+C quits.
    #[command(visible_alias = "c")]
    Chat,

    /// List available audio input and output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the input device in chatrec.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   chatrec completions bash > chatrec.bash
    ///   chatrec completions zsh > _chatrec
    ///   chatrec completions fish > chatrec.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "chatrec", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Chat) => {
            commands::handle_chat().await?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

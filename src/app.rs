//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the appropriate
//! command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// Record a short clip, identify the song, optionally download it
#[derive(Parser)]
#[command(name = "trackdown")]
#[command(version)]
#[command(about = "Record a clip from the microphone, identify the song via Shazam, optionally download it with yt-dlp")]
#[command(
    long_about = "trackdown records a short clip from your microphone, identifies the song\n\
                  through the Shazam recognition API, and can download the matching audio\n\
                  from YouTube via yt-dlp.\n\n\
                  DEFAULT COMMAND:\n    \
                  If no command is specified, 'listen' is used by default.\n\n\
                  SETUP:\n    \
                  The recognition API key is read from the RAPIDAPI_KEY environment\n    \
                  variable, or from a RAPIDAPI_KEY.env file in the working directory."
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/trackdown/trackdown.toml\n    Logs:               ~/.local/state/trackdown/trackdown.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record, identify, and optionally download a song (default)
    ///
    /// Opens the interactive surface. Adjust the recording duration and the
    /// download toggle in the sidebar, press Enter to record and identify.
    #[command(visible_alias = "l")]
    Listen,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio device, sample rate, and download settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in trackdown.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   trackdown completions bash > trackdown.bash
    ///   trackdown completions zsh > _trackdown
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "trackdown", &mut io::stdout());
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
        None | Some(Commands::Listen) => {
            commands::handle_listen()?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

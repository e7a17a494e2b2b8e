//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands::{self, SimulateOptions};
use crate::logging;
use crate::waveform::ScalingProfileId;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;

/// A terminal waveform for live microphone levels
#[derive(Parser)]
#[command(name = "wavetide")]
#[command(version)]
#[command(about = "A terminal waveform for live microphone levels")]
#[command(long_about = "A terminal waveform for live microphone levels.\n\nDEFAULT COMMAND:\n    If no command is specified, 'live' is used by default.\n\nKEYS:\n    Space       start / stop capture (stopping fades the waveform out)\n    q, Esc      quit\n\nEXAMPLES:\n    # Show the default microphone\n    $ wavetide\n\n    # Try the display without a microphone, with 7 analyser bands\n    $ wavetide simulate --bands 7\n\n    # Compare the web scaling profile\n    $ wavetide simulate --profile web")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavetide/wavetide.toml\n    Logs:               ~/.local/state/wavetide/wavetide.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the scrolling waveform of the configured input device (default)
    #[command(visible_alias = "l")]
    Live,

    /// Drive the waveform with a synthetic speech-like signal
    ///
    /// Useful without a microphone, or to compare scaling profiles.
    #[command(visible_alias = "s")]
    Simulate {
        /// Emit band vectors of this width instead of scalar levels
        #[arg(short, long, value_name = "N")]
        bands: Option<usize>,

        /// Samples per second produced by the synthetic voice
        #[arg(short, long, value_name = "HZ")]
        rate: Option<u32>,

        /// Scaling profile to use instead of the configured one
        #[arg(short, long, value_enum)]
        profile: Option<ProfileArg>,

        /// Seed for the synthetic voice
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Writes the defaults first if the file does not exist.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in wavetide.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   wavetide completions bash > wavetide.bash
    ///   wavetide completions zsh > _wavetide
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Web,
    Native,
}

impl From<ProfileArg> for ScalingProfileId {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Web => ScalingProfileId::Web,
            ProfileArg::Native => ScalingProfileId::Native,
        }
    }
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wavetide", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Live) => commands::handle_live(),
        Some(Commands::Simulate {
            bands,
            rate,
            profile,
            seed,
        }) => commands::handle_simulate(SimulateOptions {
            bands,
            rate_hz: rate,
            profile: profile.map(Into::into),
            seed,
        }),
        Some(Commands::Config) => commands::handle_config(),
        Some(Commands::Completions { .. } | Commands::ListDevices | Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_simulate_arguments() {
        let cli = Cli::try_parse_from(["wavetide", "simulate", "--bands", "7", "-p", "web"])
            .expect("valid arguments");
        match cli.command {
            Some(Commands::Simulate { bands, profile, .. }) => {
                assert_eq!(bands, Some(7));
                assert!(matches!(profile, Some(ProfileArg::Web)));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_no_subcommand_means_live() {
        let cli = Cli::try_parse_from(["wavetide"]).expect("valid arguments");
        assert!(cli.command.is_none());
    }
}

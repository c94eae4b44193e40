//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - games: list the available games
//! - play: run one session
//! - results: show saved results

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vigil::domain::{DifficultyLevel, GameKind};

/// Vigil - timed stimulus-response games for attention and impulsivity
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available games
    Games,

    /// Play a session with a simulated participant
    Play {
        /// Game id (star-catch, go-light, digit-watch, card-sort, tri-sort, sequence-recall, card-match)
        game: GameKind,

        /// Difficulty level (easy, medium, hard)
        #[arg(short, long)]
        difficulty: Option<DifficultyLevel>,

        /// Session length in seconds
        #[arg(short = 't', long)]
        duration: Option<u64>,

        /// Seed for stimulus generation and the participant
        #[arg(short, long)]
        seed: Option<u64>,

        /// Probability the participant responds correctly (0.0 - 1.0)
        #[arg(short, long)]
        accuracy: Option<f64>,

        /// Run against the wall clock instead of logical time
        #[arg(short, long)]
        realtime: bool,
    },

    /// Show saved results
    Results {
        /// Only results for this game id
        #[arg(short, long)]
        game: Option<String>,

        /// Show at most this many results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["vigil"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["vigil", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["vigil", "-c", "/path/to/vigil.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/vigil.yml")));
    }

    #[test]
    fn test_games_command() {
        let cli = Cli::try_parse_from(["vigil", "games"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Games)));
    }

    #[test]
    fn test_play_defaults() {
        let cli = Cli::try_parse_from(["vigil", "play", "star-catch"]).unwrap();
        match cli.command {
            Some(Commands::Play {
                game,
                difficulty,
                duration,
                seed,
                accuracy,
                realtime,
            }) => {
                assert_eq!(game, GameKind::StarCatch);
                assert!(difficulty.is_none());
                assert!(duration.is_none());
                assert!(seed.is_none());
                assert!(accuracy.is_none());
                assert!(!realtime);
            }
            _ => panic!("Expected play command"),
        }
    }

    #[test]
    fn test_play_with_options() {
        let cli = Cli::try_parse_from([
            "vigil", "play", "card-match", "-d", "hard", "-t", "30", "--seed", "7", "-a", "0.9", "--realtime",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Play {
                game,
                difficulty,
                duration,
                seed,
                accuracy,
                realtime,
            }) => {
                assert_eq!(game, GameKind::CardMatch);
                assert_eq!(difficulty, Some(DifficultyLevel::Hard));
                assert_eq!(duration, Some(30));
                assert_eq!(seed, Some(7));
                assert_eq!(accuracy, Some(0.9));
                assert!(realtime);
            }
            _ => panic!("Expected play command"),
        }
    }

    #[test]
    fn test_play_unknown_game_rejected() {
        assert!(Cli::try_parse_from(["vigil", "play", "chess"]).is_err());
    }

    #[test]
    fn test_play_unknown_difficulty_rejected() {
        assert!(Cli::try_parse_from(["vigil", "play", "go-light", "-d", "nightmare"]).is_err());
    }

    #[test]
    fn test_results_command() {
        let cli = Cli::try_parse_from(["vigil", "results"]).unwrap();
        match cli.command {
            Some(Commands::Results { game, limit }) => {
                assert!(game.is_none());
                assert_eq!(limit, 10);
            }
            _ => panic!("Expected results command"),
        }
    }

    #[test]
    fn test_results_with_filters() {
        let cli = Cli::try_parse_from(["vigil", "results", "-g", "tri-sort", "-l", "3"]).unwrap();
        match cli.command {
            Some(Commands::Results { game, limit }) => {
                assert_eq!(game, Some("tri-sort".to_string()));
                assert_eq!(limit, 3);
            }
            _ => panic!("Expected results command"),
        }
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["vigil", "--version"]);
        assert!(result.is_err());
    }
}

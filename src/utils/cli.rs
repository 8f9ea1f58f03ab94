use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::START_FEN;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version = env!("APP_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// TOML file with search, ordering and evaluation settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a position and print the score, PV and statistics
    Search {
        /// FEN string for the position
        #[arg(short, long, default_value = START_FEN)]
        fen: String,
        /// set search depth
        #[arg(short, long, default_value = "6")]
        depth: u8,
        /// Stop starting new depths after this many milliseconds
        #[arg(short, long)]
        time: Option<u64>,
    },

    /// Run perft on game with given FEN and depth, or use default fen
    Perft {
        /// FEN string for starting position
        #[arg(short, long, default_value = START_FEN)]
        fen: String,
        /// set perft depth
        #[arg(short, long, default_value = "5")]
        depth: u8,
        /// Print node counts per root move
        #[arg(long, default_value = "false")]
        divide: bool,
    },

    /// Start game with given FEN and depth, or use default fen
    Play {
        /// FEN string for starting position
        #[arg(short, long, default_value = START_FEN)]
        fen: String,
        /// set search depth
        #[arg(short, long, default_value = "5")]
        depth: u8,
    },

    /// Run headless to play with GUI over UCI
    Headless,

    /// Write the default configuration to a file
    DumpConfig {
        #[arg(default_value = "pinboard.toml")]
        path: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "game_cmd", no_binary_name = true)]
pub struct GameCommand {
    #[command(subcommand)]
    pub cmd: GameSubcommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum GameSubcommand {
    /// Make a move in long algebraic notation, e.g. e2e4 or e7e8q
    #[clap(visible_alias = "m")]
    Move { mv: String },

    /// Print the current board state
    #[clap(visible_alias = "p")]
    Print,

    /// Undo the last move pair
    #[clap(visible_alias = "u")]
    Undo,

    /// Change the engine search depth
    #[clap(visible_alias = "d")]
    Depth { depth: u8 },

    /// Show the static evaluation of the position
    #[clap(visible_alias = "e")]
    Eval,

    /// Show the current fen of the board, or set a new one
    #[clap(visible_alias = "f")]
    Fen { set: Option<String> },

    /// Run a perft test with given depth [default: 4]
    #[clap(visible_alias = "pe")]
    Perft {
        depth: Option<u8>,
        #[arg(short, default_value = "false")]
        divide: bool,
    },

    /// Clear screen
    #[clap(visible_alias = "c")]
    Clear,

    /// Restart game with same fen
    #[clap(visible_alias = "r")]
    Restart,

    /// Quit game
    #[clap(visible_alias = "q")]
    Quit,
}

impl GameCommand {
    /// Splits a console line like a shell would and parses it.
    pub fn parse_line(line: &str) -> miette::Result<Self> {
        let words = shell_words::split(line)
            .map_err(|e| miette::miette!("Could not split '{line}': {e}"))?;
        Self::try_parse_from(words).map_err(|e| miette::miette!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_commands_parse_with_aliases() {
        assert_eq!(
            GameCommand::parse_line("m e2e4").unwrap().cmd,
            GameSubcommand::Move {
                mv: "e2e4".to_string()
            }
        );
        assert_eq!(
            GameCommand::parse_line("depth 7").unwrap().cmd,
            GameSubcommand::Depth { depth: 7 }
        );
        assert_eq!(GameCommand::parse_line("q").unwrap().cmd, GameSubcommand::Quit);
    }

    #[test]
    fn quoted_fen_is_one_argument() {
        let cmd = GameCommand::parse_line("fen '8/8/8/8/8/8/8/K6k w - - 0 1'").unwrap();
        assert_eq!(
            cmd.cmd,
            GameSubcommand::Fen {
                set: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string())
            }
        );
    }

    #[test]
    fn bad_lines_are_errors() {
        assert!(GameCommand::parse_line("fly e2e4").is_err());
        assert!(GameCommand::parse_line("depth many").is_err());
        assert!(GameCommand::parse_line("move 'e2e4").is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pinboard", "perft", "-d", "3", "--divide", "--verbose"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Perft { depth, divide, fen }) => {
                assert_eq!(depth, 3);
                assert!(divide);
                assert_eq!(fen, START_FEN);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

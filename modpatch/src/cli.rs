//! Root CLI structure for modpatch

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modpatch")]
#[command(about = "Install and remove game mods inside hash-indexed data containers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Game installation directory
    #[arg(
        short,
        long,
        env = "MODPATCH_GAME_DIR",
        default_value = ".",
        global = true
    )]
    pub game_dir: PathBuf,

    /// YAML configuration file
    #[arg(short, long, env = "MODPATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Mod(crate::commands::mods::ModCommands),

    /// Print the path hash of logical paths
    Hash {
        /// Logical paths to hash
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// Log level requested on the command line, if any
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        match (self.verbose, self.quiet) {
            (0, false) => None,
            (0, true) => Some(log::LevelFilter::Error),
            (1, _) => Some(log::LevelFilter::Info),
            (2, _) => Some(log::LevelFilter::Debug),
            _ => Some(log::LevelFilter::Trace),
        }
    }
}

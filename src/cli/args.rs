use crate::core::Severity;
use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phpinspect")]
#[command(about = "Static inspections for PHP class hierarchies and database calls", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze PHP files and directories
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format (defaults to `[output] default_format`, then terminal)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (skips `.phpinspect.toml` discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of worker threads (0 = number of CPUs)
        #[arg(short = 'j', long, default_value = "0", env = "PHPINSPECT_JOBS")]
        jobs: usize,

        /// Analyze files sequentially
        #[arg(long)]
        no_parallel: bool,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbosity: u8,

        /// Exit with failure when diagnostics at or above this severity are found
        #[arg(long, default_value = "warning")]
        fail_on: Severity,
    },

    /// Check fixture files with inline `<warning>` markers
    Verify {
        /// Fixture files
        #[arg(required = true)]
        fixtures: Vec<PathBuf>,

        /// Configuration file (skips `.phpinspect.toml` discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Increase log verbosity
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

//! CLI module for phpinspect
//!
//! - Argument parsing (`args`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod setup;

pub use args::{Cli, Commands};
pub use setup::{configure_thread_pool, get_worker_count, init_logging, level_for_verbosity};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}

//! Setup and initialization functions for CLI
//!
//! Thread pool configuration and logging setup.

/// Rayon thread stack size (8MB for deeply nested PHP expression trees)
const RAYON_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Configure rayon global thread pool once at startup
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new().stack_size(RAYON_STACK_SIZE);

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        tracing::debug!("Thread pool already configured: {e}");
    }
}

/// Get the number of worker threads to use
pub fn get_worker_count(jobs: usize) -> usize {
    if jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        jobs
    }
}

/// Default log directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `-v`.
/// `log` records from the config loader are bridged into it.
pub fn init_logging(verbosity: u8) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{fmt, EnvFilter};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

        let _ = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .try_init();
    });
}

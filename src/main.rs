use anyhow::Result;
use clap::Parser;
use phpinspect::cli::{self, Cli, Commands};
use phpinspect::commands::{self, AnalyzeConfig, VerifyConfig};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    let passed = match args.command {
        Commands::Analyze {
            paths,
            format,
            output,
            config,
            jobs,
            no_parallel,
            verbosity,
            fail_on,
        } => {
            cli::init_logging(verbosity);
            commands::handle_analyze(AnalyzeConfig {
                paths,
                format,
                output,
                config,
                jobs,
                parallel: !no_parallel,
                fail_on,
            })?
        }
        Commands::Verify {
            fixtures,
            config,
            verbosity,
        } => {
            cli::init_logging(verbosity);
            commands::handle_verify(VerifyConfig { fixtures, config })?
        }
        Commands::Init { force } => {
            cli::init_logging(0);
            commands::init_config(force)?;
            true
        }
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

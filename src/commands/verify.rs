use super::resolve_config;
use crate::io;
use crate::testkit::fixture::{verify_fixture, FixtureOutcome};
use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

pub struct VerifyConfig {
    pub fixtures: Vec<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Verify every fixture, printing mismatches. Returns whether all matched.
pub fn handle_verify(config: VerifyConfig) -> Result<bool> {
    let settings = resolve_config(config.config.as_deref())?;
    let mut all_passed = true;

    for path in &config.fixtures {
        let text = io::read_file(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let outcome = verify_fixture(&text, path, &settings)
            .with_context(|| format!("Failed to verify fixture {}", path.display()))?;

        if outcome.is_success() {
            println!("{} {}", "ok".green(), path.display());
        } else {
            all_passed = false;
            print_mismatch(path, &outcome);
        }
    }

    Ok(all_passed)
}

fn print_mismatch(path: &Path, outcome: &FixtureOutcome) {
    println!("{} {}", "FAILED".red().bold(), path.display());
    for expected in &outcome.missing {
        println!(
            "  missing {} at bytes {}..{}: {}",
            expected.severity,
            expected.start,
            expected.end,
            expected.message.as_deref().unwrap_or("<any message>")
        );
    }
    for diagnostic in &outcome.unexpected {
        println!(
            "  unexpected {} at {}:{} (bytes {}..{}): {}",
            diagnostic.severity,
            diagnostic.span.line,
            diagnostic.span.column + 1,
            diagnostic.span.start,
            diagnostic.span.end,
            diagnostic.message
        );
    }
}

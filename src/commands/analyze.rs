use super::resolve_config;
use crate::cli;
use crate::core::Severity;
use crate::io::output::{create_writer, OutputFormat};
use crate::pipeline::{analyze_paths, BatchOptions, BatchReport};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use tracing::info;

pub struct AnalyzeConfig {
    pub paths: Vec<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub jobs: usize,
    pub parallel: bool,
    pub fail_on: Severity,
}

/// Run the analysis and write the report. Returns whether the run passed:
/// no diagnostics at or above `fail_on` and no per-file failures.
pub fn handle_analyze(config: AnalyzeConfig) -> Result<bool> {
    let settings = resolve_config(config.config.as_deref())?;
    let format = config
        .format
        .or_else(|| settings.default_format())
        .unwrap_or_default();

    if config.parallel {
        cli::configure_thread_pool(config.jobs);
        info!(workers = cli::get_worker_count(config.jobs), "Parallel analysis");
    }

    let report = analyze_paths(
        &config.paths,
        &settings,
        BatchOptions {
            parallel: config.parallel,
        },
    );

    configure_output(&config);
    write_report(&report, format, config.output.as_ref())?;

    Ok(passes(&report, config.fail_on))
}

fn configure_output(config: &AnalyzeConfig) {
    let use_color = config.output.is_none()
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();
    colored::control::set_override(use_color);
}

fn write_report(report: &BatchReport, format: OutputFormat, output: Option<&PathBuf>) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = create_writer(format, sink);
    writer.write_report(report)
}

pub fn passes(report: &BatchReport, fail_on: Severity) -> bool {
    report.count_at_least(fail_on) == 0 && report.is_complete_success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Diagnostic, FileReport, InspectionKind, Span};

    fn report_with(kind: InspectionKind) -> BatchReport {
        let mut file = FileReport::new("a.php");
        file.diagnostics
            .push(Diagnostic::new(kind, Span::default(), "finding"));
        BatchReport {
            files: vec![file],
            failures: vec![],
        }
    }

    #[test]
    fn test_weak_warning_passes_default_threshold() {
        let report = report_with(InspectionKind::DbCallPattern);
        assert!(passes(&report, Severity::Warning));
        assert!(!passes(&report, Severity::WeakWarning));
    }

    #[test]
    fn test_warning_fails_any_threshold() {
        let report = report_with(InspectionKind::InterfaceRedeclaration);
        assert!(!passes(&report, Severity::Warning));
        assert!(!passes(&report, Severity::WeakWarning));
    }

    #[test]
    fn test_empty_report_passes() {
        assert!(passes(&BatchReport::default(), Severity::WeakWarning));
    }
}

//! Parse, inspect, suppress, sort.
//!
//! Per-file analysis is independent, so batches run on the rayon pool and a
//! file that cannot be read or parsed becomes an [`AnalysisFailure`] instead
//! of stopping the batch.

use crate::analyzers::php::PhpAnalyzer;
use crate::config::PhpInspectConfig;
use crate::core::{sort_diagnostics, Diagnostic, Error, FileReport, ParsedFile, Result, Severity};
use crate::inspections::{
    enabled_inspections, parse_suppression_comments, HandleTypes, Inspection, InspectionContext,
};
use crate::io::walker::FileWalker;
use crate::resolver::ClassRegistry;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

/// Runs the enabled inspections over single files.
pub struct Inspector {
    analyzer: PhpAnalyzer,
    inspections: Vec<Box<dyn Inspection>>,
    handles: HandleTypes,
}

impl Inspector {
    pub fn new(config: &PhpInspectConfig) -> Self {
        Self {
            analyzer: PhpAnalyzer::new(),
            inspections: enabled_inspections(&config.inspections),
            handles: config.handle_types(),
        }
    }

    /// Inspect an already lowered file. `source` is only consulted for
    /// suppression comments.
    pub fn inspect_parsed(&self, file: &ParsedFile, source: &str) -> FileReport {
        let registry = ClassRegistry::from_declarations(file.classes.iter().cloned());
        let context = InspectionContext {
            registry: &registry,
            handles: &self.handles,
        };

        let mut diagnostics: Vec<Diagnostic> = self
            .inspections
            .iter()
            .flat_map(|inspection| inspection.inspect(file, &context))
            .collect();

        let suppressions = parse_suppression_comments(source);
        let found = diagnostics.len();
        diagnostics.retain(|diagnostic| !suppressions.is_diagnostic_suppressed(diagnostic));
        sort_diagnostics(&mut diagnostics);

        for line in &suppressions.unclosed_blocks {
            warn!(path = %file.path.display(), line, "phpinspect:ignore-start without matching ignore-end");
        }

        FileReport {
            path: file.path.clone(),
            suppressed: found - diagnostics.len(),
            diagnostics,
            unclosed_suppressions: suppressions.unclosed_blocks,
        }
    }

    pub fn analyze_source(&self, path: impl Into<PathBuf>, source: &str) -> Result<FileReport> {
        let file = self.analyzer.parse(source, path)?;
        let report = self.inspect_parsed(&file, source);
        debug!(
            path = %report.path.display(),
            diagnostics = report.diagnostics.len(),
            suppressed = report.suppressed,
            "File inspected"
        );
        Ok(report)
    }

    pub fn analyze_file(&self, path: &Path) -> Result<FileReport> {
        let source = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        self.analyze_source(path, &source)
    }
}

/// Analyze one in-memory source file.
pub fn analyze_source(
    path: impl Into<PathBuf>,
    source: &str,
    config: &PhpInspectConfig,
) -> Result<FileReport> {
    Inspector::new(config).analyze_source(path, source)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationType {
    FileRead,
    FileParse,
    DirectoryAccess,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileRead => "File read",
            Self::FileParse => "File parse",
            Self::DirectoryAccess => "Directory access",
        }
    }
}

/// A file or directory the batch could not analyze.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub path: PathBuf,
    pub operation: OperationType,
    pub error: String,
}

impl AnalysisFailure {
    pub fn new(path: PathBuf, operation: OperationType, error: &Error) -> Self {
        Self {
            path,
            operation,
            error: error.to_string(),
        }
    }

    fn from_file_error(path: PathBuf, error: &Error) -> Self {
        let operation = match error {
            Error::Parse { .. } | Error::Parser(_) => OperationType::FileParse,
            _ => OperationType::FileRead,
        };
        Self::new(path, operation, error)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One report per analyzed file, ordered by path.
    pub files: Vec<FileReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AnalysisFailure>,
}

impl BatchReport {
    pub fn total_diagnostics(&self) -> usize {
        self.files.iter().map(|file| file.diagnostics.len()).sum()
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.files.iter().map(|file| file.count_at_least(severity)).sum()
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.files.iter().map(|file| file.count_of(severity)).sum()
    }

    pub fn total_suppressed(&self) -> usize {
        self.files.iter().map(|file| file.suppressed).sum()
    }

    pub fn files_with_diagnostics(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|file| !file.diagnostics.is_empty())
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Expand the given files and directories into the PHP files to analyze.
///
/// Explicitly named files are kept whatever their extension; directories
/// are walked honoring `.gitignore` and the configured ignore globs.
pub fn collect_php_files(
    paths: &[PathBuf],
    ignore_patterns: &[String],
) -> (Vec<PathBuf>, Vec<AnalysisFailure>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            let error = Error::file_system("path does not exist", path);
            failures.push(AnalysisFailure::new(path.clone(), OperationType::DirectoryAccess, &error));
            continue;
        }

        match FileWalker::new(path.clone())
            .with_ignore_patterns(ignore_patterns.to_vec())
            .walk()
        {
            Ok(found) => files.extend(found),
            Err(error) => {
                failures.push(AnalysisFailure::new(path.clone(), OperationType::DirectoryAccess, &error))
            }
        }
    }

    files.sort();
    files.dedup();
    (files, failures)
}

pub fn analyze_paths(
    paths: &[PathBuf],
    config: &PhpInspectConfig,
    options: BatchOptions,
) -> BatchReport {
    let span = info_span!("analyze_paths", inputs = paths.len(), parallel = options.parallel);
    let _entered = span.enter();

    let (files, mut failures) = collect_php_files(paths, &config.ignore_patterns());
    info!(files = files.len(), "Collected PHP files");

    let inspector = Inspector::new(config);
    let results: Vec<(&PathBuf, Result<FileReport>)> = if options.parallel {
        files
            .par_iter()
            .map(|path| (path, inspector.analyze_file(path)))
            .collect()
    } else {
        files
            .iter()
            .map(|path| (path, inspector.analyze_file(path)))
            .collect()
    };

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(error) => {
                warn!(path = %path.display(), %error, "Skipping file");
                failures.push(AnalysisFailure::from_file_error(path.clone(), &error));
            }
        }
    }

    let batch = BatchReport {
        files: reports,
        failures,
    };
    info!(
        files = batch.files.len(),
        diagnostics = batch.total_diagnostics(),
        suppressed = batch.total_suppressed(),
        failures = batch.failures.len(),
        "Analysis complete"
    );
    batch
}

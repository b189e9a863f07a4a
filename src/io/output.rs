use crate::core::{FileReport, Severity};
use crate::pipeline::BatchReport;
use crate::testkit::fixture::annotate;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    /// The analyzed sources with inline diagnostic markers.
    Annotated,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_file(&mut self, file: &FileReport) -> anyhow::Result<()> {
        for diagnostic in &file.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Warning => diagnostic.severity.as_str().yellow().bold(),
                Severity::WeakWarning => diagnostic.severity.as_str().cyan(),
            };
            writeln!(
                self.writer,
                "{}:{}:{} {} {} {}",
                file.path.display(),
                diagnostic.span.line,
                diagnostic.span.column + 1,
                severity,
                diagnostic.message,
                format!("[{}]", diagnostic.kind).dimmed()
            )?;
        }
        for line in &file.unclosed_suppressions {
            writeln!(
                self.writer,
                "{}:{} {} phpinspect:ignore-start has no matching ignore-end",
                file.path.display(),
                line,
                "warning".yellow()
            )?;
        }
        Ok(())
    }

    fn write_summary(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        for failure in &report.failures {
            writeln!(
                self.writer,
                "{} {} failed for {}: {}",
                "error".red().bold(),
                failure.operation.as_str(),
                failure.path.display(),
                failure.error
            )?;
        }

        let total = report.total_diagnostics();
        let counts = format!(
            "{} warning(s), {} weak warning(s) in {} file(s)",
            report.count_of(Severity::Warning),
            report.count_of(Severity::WeakWarning),
            report.files.len()
        );
        let summary = if total == 0 {
            counts.green()
        } else {
            counts.yellow()
        };
        write!(self.writer, "{summary}")?;
        let suppressed = report.total_suppressed();
        if suppressed > 0 {
            write!(self.writer, ", {suppressed} suppressed")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        for file in &report.files {
            self.write_file(file)?;
        }
        self.write_summary(report)
    }
}

/// Re-reads each file with diagnostics and prints it with inline markers.
pub struct AnnotatedWriter<W: Write> {
    writer: W,
}

impl<W: Write> AnnotatedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for AnnotatedWriter<W> {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        for file in report.files_with_diagnostics() {
            let source = fs::read_to_string(&file.path)?;
            writeln!(self.writer, "// {}", file.path.display())?;
            self.writer
                .write_all(annotate(&source, &file.diagnostics).as_bytes())?;
            if !source.ends_with('\n') {
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }
}

pub fn create_writer(format: OutputFormat, writer: Box<dyn Write>) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
        OutputFormat::Annotated => Box::new(AnnotatedWriter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhpInspectConfig;
    use crate::pipeline::{analyze_paths, BatchOptions};
    use indoc::indoc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SOURCE: &str = indoc! {r#"
        <?php
        function f(\PDO $db) {
            $db->query('DELETE FROM t');
        }
    "#};

    fn batch_for(source: &str) -> (TempDir, BatchReport) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.php");
        fs::write(&path, source).unwrap();
        let report = analyze_paths(
            &[PathBuf::from(&path)],
            &PhpInspectConfig::default(),
            BatchOptions { parallel: false },
        );
        (temp_dir, report)
    }

    fn render(format: OutputFormat, report: &BatchReport) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Json => JsonWriter::new(&mut buffer).write_report(report).unwrap(),
            OutputFormat::Terminal => TerminalWriter::new(&mut buffer).write_report(report).unwrap(),
            OutputFormat::Annotated => AnnotatedWriter::new(&mut buffer).write_report(report).unwrap(),
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_terminal_lists_diagnostics_and_summary() {
        let (_dir, report) = batch_for(SOURCE);
        let output = render(OutputFormat::Terminal, &report);

        assert!(output.contains(
            "db.php:3:5 weak-warning 'PDO::exec(...)' should be used instead (consumes less resources). [db-call-pattern]"
        ));
        assert!(output.contains("0 warning(s), 1 weak warning(s) in 1 file(s)"));
    }

    #[test]
    fn test_json_serializes_reports() {
        let (_dir, report) = batch_for(SOURCE);
        let value: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json, &report)).unwrap();

        let diagnostic = &value["files"][0]["diagnostics"][0];
        assert_eq!(diagnostic["severity"], "weak-warning");
        assert_eq!(diagnostic["kind"], "db-call-pattern");
        assert_eq!(diagnostic["span"]["line"], 3);
        assert!(value.get("failures").is_none());
    }

    #[test]
    fn test_annotated_wraps_flagged_expression() {
        let (_dir, report) = batch_for(SOURCE);
        let output = render(OutputFormat::Annotated, &report);
        assert!(output.contains(
            r#"<weak_warning descr="'PDO::exec(...)' should be used instead (consumes less resources).">$db->query('DELETE FROM t')</weak_warning>;"#
        ));
    }

    #[test]
    fn test_format_names() {
        let format: OutputFormat = serde_json::from_str("\"annotated\"").unwrap();
        assert_eq!(format, OutputFormat::Annotated);
        assert_eq!(OutputFormat::default(), OutputFormat::Terminal);
    }
}

pub mod ast;
pub mod errors;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub use ast::{
    Block, CallExpression, ClassDeclaration, ClassKind, Expression, FunctionScope,
    InterfaceReference, Parameter, ParsedFile, QualifiedName, ReceiverType, Statement,
    TypeReference,
};
pub use errors::{Error, Result};

/// Severity vocabulary of the inspections. Ordered so that `Warning` is the
/// stronger level.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    WeakWarning,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::WeakWarning => "weak-warning",
            Severity::Warning => "warning",
        }
    }

    /// Tag name used by inline fixture markers (`<weak_warning descr="...">`).
    pub fn marker_tag(&self) -> &'static str {
        match self {
            Severity::WeakWarning => "weak_warning",
            Severity::Warning => "warning",
        }
    }

    pub fn from_marker_tag(tag: &str) -> Option<Self> {
        match tag {
            "weak_warning" => Some(Severity::WeakWarning),
            "warning" => Some(Severity::Warning),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "weak-warning" => Ok(Severity::WeakWarning),
            "warning" => Ok(Severity::Warning),
            other => Err(Error::Validation(format!("unknown severity '{other}'"))),
        }
    }
}

/// The inspections this crate ships.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum InspectionKind {
    /// A class re-announces an interface one of its ancestors already implements.
    InterfaceRedeclaration,
    /// A database handle is driven through a more expensive call sequence than needed.
    DbCallPattern,
}

impl InspectionKind {
    pub const ALL: [InspectionKind; 2] = [
        InspectionKind::InterfaceRedeclaration,
        InspectionKind::DbCallPattern,
    ];

    /// Stable identifier used in suppression comments and configuration.
    pub fn id(&self) -> &'static str {
        match self {
            InspectionKind::InterfaceRedeclaration => "interface-redeclaration",
            InspectionKind::DbCallPattern => "db-call-pattern",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.id().eq_ignore_ascii_case(id.trim()))
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            InspectionKind::InterfaceRedeclaration => Severity::Warning,
            InspectionKind::DbCallPattern => Severity::WeakWarning,
        }
    }
}

impl std::fmt::Display for InspectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Location of a token or expression in a source file.
///
/// `start`/`end` are byte offsets; lines are 1-based, columns are 0-based
/// byte columns (the convention tree-sitter reports).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();

        Span {
            start: node.start_byte(),
            end: node.end_byte(),
            line: start.row + 1,
            column: start.column,
            end_line: end.row + 1,
            end_column: end.column,
        }
    }

    /// Build a span for a byte range of `source`, computing line and column.
    pub fn from_offsets(source: &str, start: usize, end: usize) -> Self {
        let (line, column) = line_and_column(source, start);
        let (end_line, end_column) = line_and_column(source, end);
        Span {
            start,
            end,
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let prefix = &source.as_bytes()[..offset.min(source.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let column = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(prefix.len(), |newline| prefix.len() - newline - 1);
    (line, column)
}

/// A single finding produced by an inspection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: InspectionKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: InspectionKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            span,
            message: message.into(),
        }
    }
}

/// Put diagnostics in source order. Ties are broken by end offset, then
/// inspection, then message, so the order never depends on detector order.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.span.start, a.span.end, a.kind, &a.message).cmp(&(
            b.span.start,
            b.span.end,
            b.kind,
            &b.message,
        ))
    });
}

/// Inspection results for one file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Number of diagnostics dropped by suppression comments.
    pub suppressed: usize,
    /// Lines of `phpinspect:ignore-start` markers without a matching end.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unclosed_suppressions: Vec<usize>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity >= severity)
            .count()
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

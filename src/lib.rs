// Export modules for library usage
pub mod analyzers;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod inspections;
pub mod io;
pub mod pipeline;
pub mod resolver;
pub mod testkit;

pub use crate::core::errors;

// Re-export commonly used types
pub use crate::core::{
    Diagnostic, Error, FileReport, InspectionKind, ParsedFile, QualifiedName, Result, Severity,
    Span,
};

pub use crate::analyzers::PhpAnalyzer;

pub use crate::config::{load_config, load_config_from, PhpInspectConfig};

pub use crate::inspections::{
    db_call_pattern::detect_db_call_patterns,
    interface_redeclaration::detect_interface_redeclarations, parse_suppression_comments,
    HandleTypes, Inspection, InspectionContext, SuppressionContext,
};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::pipeline::{analyze_paths, analyze_source, BatchOptions, BatchReport, Inspector};

pub use crate::resolver::{ClassRegistry, NameContext};

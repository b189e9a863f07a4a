//! The inspections and the pieces they share.
//!
//! Inspections are stateless: each one maps a lowered file plus the
//! resolved context to diagnostics, and none sees another's output.

pub mod db_call_pattern;
pub mod interface_redeclaration;
pub mod predicates;
pub mod suppression;

pub use db_call_pattern::{DbCallPatternInspection, HandleTypes};
pub use interface_redeclaration::InterfaceRedeclarationInspection;
pub use suppression::{parse_suppression_comments, SuppressionContext};

use crate::config::InspectionsConfig;
use crate::core::{Diagnostic, InspectionKind, ParsedFile};
use crate::resolver::ClassRegistry;

/// Read-only data an inspection may consult.
#[derive(Debug, Clone, Copy)]
pub struct InspectionContext<'a> {
    pub registry: &'a ClassRegistry,
    pub handles: &'a HandleTypes,
}

pub trait Inspection: Send + Sync {
    fn kind(&self) -> InspectionKind;
    fn inspect(&self, file: &ParsedFile, context: &InspectionContext) -> Vec<Diagnostic>;
}

pub fn inspection_for(kind: InspectionKind) -> Box<dyn Inspection> {
    match kind {
        InspectionKind::InterfaceRedeclaration => Box::new(InterfaceRedeclarationInspection),
        InspectionKind::DbCallPattern => Box::new(DbCallPatternInspection),
    }
}

pub fn enabled_inspections(config: &InspectionsConfig) -> Vec<Box<dyn Inspection>> {
    InspectionKind::ALL
        .iter()
        .copied()
        .filter(|kind| config.is_enabled(*kind))
        .map(inspection_for)
        .collect()
}

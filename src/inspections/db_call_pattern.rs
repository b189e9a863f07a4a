//! Database-call pattern inspection.
//!
//! Two weak warnings on calls made through a database handle:
//!
//! - a `prepare(...)` immediately followed by a parameterless `execute()`,
//!   either chained directly or through a variable bound in the previous
//!   statement whose value is used only by that `execute()`;
//! - a `query(...)` whose result set is never read.
//!
//! A variable's value is followed from its binding to the next plain
//! assignment to the same name. Bindings that outlive the call (reference
//! parameters, `global`, `static`, reference captures) are never flagged.
//!
//! Only the shape of the call chain and the receiver's static type are
//! inspected, never the SQL text.

use super::predicates::{DiscardedResult, HandleCall, ParameterlessExecute, ReceiverIsHandle};
use super::{Inspection, InspectionContext};
use crate::core::{
    Block, CallExpression, Diagnostic, Expression, FunctionScope, InspectionKind, ParsedFile,
    QualifiedName,
};
use crate::resolver::ClassRegistry;
use stillwater::predicate::Predicate;
use tracing::debug;

pub const DEFAULT_HANDLE_TYPE: &str = "\\PDO";

/// Class names recognized as database handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleTypes {
    types: Vec<QualifiedName>,
}

impl Default for HandleTypes {
    fn default() -> Self {
        Self::new([QualifiedName::new(DEFAULT_HANDLE_TYPE)])
    }
}

impl HandleTypes {
    pub fn new(types: impl IntoIterator<Item = QualifiedName>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(QualifiedName::new))
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualifiedName> {
        self.types.iter()
    }

    /// The recognized handle type `class` is, or extends.
    pub fn family_of(&self, class: &QualifiedName, registry: &ClassRegistry) -> Option<&QualifiedName> {
        self.types
            .iter()
            .find(|handle| registry.is_same_or_subclass(class, handle))
    }
}

pub fn prepare_execute_message(handle: &QualifiedName) -> String {
    format!(
        "'{}::query(...)' should be used instead of 'prepare-execute' calls chain.",
        handle.without_leading_separator()
    )
}

pub fn unused_query_message(handle: &QualifiedName) -> String {
    format!(
        "'{}::exec(...)' should be used instead (consumes less resources).",
        handle.without_leading_separator()
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DbCallPatternInspection;

impl Inspection for DbCallPatternInspection {
    fn kind(&self) -> InspectionKind {
        InspectionKind::DbCallPattern
    }

    fn inspect(&self, file: &ParsedFile, context: &InspectionContext) -> Vec<Diagnostic> {
        file.scopes
            .iter()
            .flat_map(|scope| detect_db_call_patterns(scope, context.handles, context.registry))
            .collect()
    }
}

/// Run both rules over one function scope.
pub fn detect_db_call_patterns(
    scope: &FunctionScope,
    handles: &HandleTypes,
    registry: &ClassRegistry,
) -> Vec<Diagnostic> {
    let detector = ScopeDetector {
        scope,
        prepare: HandleCall::prepare(ReceiverIsHandle::new(handles, registry)),
        query: HandleCall::query(ReceiverIsHandle::new(handles, registry)),
        execute: ParameterlessExecute::default(),
    };

    let mut diagnostics = Vec::new();
    scope.body.walk_blocks(&mut |block| detector.inspect_block(block, &mut diagnostics));
    diagnostics
}

struct ScopeDetector<'a> {
    scope: &'a FunctionScope,
    prepare: HandleCall<'a>,
    query: HandleCall<'a>,
    execute: ParameterlessExecute,
}

impl ScopeDetector<'_> {
    fn inspect_block(&self, block: &Block, diagnostics: &mut Vec<Diagnostic>) {
        for (index, statement) in block.statements.iter().enumerate() {
            for expression in statement.expressions() {
                expression.walk(&mut |node| {
                    if let Some(call) = node.as_call() {
                        if let Some(handle) = self.prepared_then_executed(call, block, index) {
                            debug!(
                                line = call.span.line,
                                rule = %self.prepare.description(),
                                "prepare/execute chain"
                            );
                            diagnostics.push(Diagnostic::new(
                                InspectionKind::DbCallPattern,
                                call.span,
                                prepare_execute_message(handle),
                            ));
                        }
                    }
                });
            }

            if let Some((call, handle)) = self.unused_query(block, index) {
                debug!(
                    line = call.span.line,
                    rule = %self.query.description(),
                    "unused query result"
                );
                diagnostics.push(Diagnostic::new(
                    InspectionKind::DbCallPattern,
                    call.span,
                    unused_query_message(handle),
                ));
            }
        }
    }

    /// Reads of the value bound at `block.statements[index]`. A binding still
    /// live when a nested block ends may be read anywhere else in the scope.
    fn binding_reads(&self, block: &Block, index: usize, variable: &str) -> usize {
        match block.reads_until_rebind(index, variable) {
            (reads, true) => reads,
            (reads, false) if std::ptr::eq(block, &self.scope.body) => reads,
            _ => self.scope.count_reads(variable),
        }
    }

    /// Rule A, for a call inside `block.statements[index]`. Returns the
    /// handle type the statement was prepared on.
    fn prepared_then_executed(
        &self,
        call: &CallExpression,
        block: &Block,
        index: usize,
    ) -> Option<&QualifiedName> {
        if !self.execute.check(call) {
            return None;
        }

        match call.receiver.as_ref() {
            Expression::MethodCall(receiver) => self.prepare.handle_type(receiver),
            Expression::Variable { name, .. } => {
                let binding = index.checked_sub(1)?;
                let (bound, value) = block
                    .statements
                    .get(binding)?
                    .as_expression()?
                    .as_variable_assignment()?;
                if bound != name.as_str()
                    || self.scope.outlives_call(bound)
                    || self.binding_reads(block, binding, bound) != 1
                {
                    return None;
                }
                self.prepare.handle_type(value.as_call()?)
            }
            _ => None,
        }
    }

    /// Rule B: a handle `query` whose result is dropped on the floor or
    /// bound to a variable nothing reads before it is rebound.
    fn unused_query<'s>(
        &self,
        block: &'s Block,
        index: usize,
    ) -> Option<(&'s CallExpression, &QualifiedName)> {
        let statement = block.statements.get(index)?;
        let expression = statement.as_expression()?;

        let call = if DiscardedResult.check(statement) {
            expression.as_call()?
        } else {
            let (bound, value) = expression.as_variable_assignment()?;
            if self.scope.outlives_call(bound) || self.binding_reads(block, index, bound) != 0 {
                return None;
            }
            value.as_call()?
        };

        self.query.handle_type(call).map(|handle| (call, handle))
    }
}

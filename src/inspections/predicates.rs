//! Call-shape predicates for the database-call inspection.
//!
//! Each predicate checks one structural property of the lowered expression
//! tree. Composite predicates combine them by conjunction, so every rule of
//! the detector reads as a single `check`.
//!
//! # Available Predicates
//!
//! ## Leaf Predicates
//! - [`MethodNamed`]: the call's method name matches (ASCII case-insensitive)
//! - [`NoArguments`]: the call has an empty argument list
//! - [`ReceiverIsHandle`]: the receiver's static type is a database handle
//! - [`DiscardedResult`]: a statement consists of nothing but a call
//!
//! ## Composed Predicates
//! - [`HandleCall`]: a given method called on a database handle
//! - [`ParameterlessExecute`]: `execute()` without bound parameters

use super::db_call_pattern::HandleTypes;
use crate::core::{CallExpression, QualifiedName, Statement};
use crate::resolver::ClassRegistry;
use stillwater::predicate::Predicate;

/// Method name comparison ignoring ASCII case.
#[derive(Debug, Clone, Copy)]
pub struct MethodNamed {
    name: &'static str,
}

impl MethodNamed {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn description(&self) -> String {
        format!("method named '{}'", self.name)
    }
}

impl Predicate<CallExpression> for MethodNamed {
    fn check(&self, call: &CallExpression) -> bool {
        call.method_is(self.name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoArguments;

impl Predicate<CallExpression> for NoArguments {
    fn check(&self, call: &CallExpression) -> bool {
        call.arguments.is_empty()
    }
}

/// The receiver's statically known class is a recognized handle type or a
/// class declared as extending one.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverIsHandle<'a> {
    handles: &'a HandleTypes,
    registry: &'a ClassRegistry,
}

impl<'a> ReceiverIsHandle<'a> {
    pub fn new(handles: &'a HandleTypes, registry: &'a ClassRegistry) -> Self {
        Self { handles, registry }
    }

    /// The recognized handle type the receiver belongs to.
    pub fn handle_type(&self, call: &CallExpression) -> Option<&'a QualifiedName> {
        call.receiver_type
            .known()
            .and_then(|class| self.handles.family_of(class, self.registry))
    }
}

impl Predicate<CallExpression> for ReceiverIsHandle<'_> {
    fn check(&self, call: &CallExpression) -> bool {
        self.handle_type(call).is_some()
    }
}

/// `<handle>-><method>(...)`
#[derive(Debug, Clone, Copy)]
pub struct HandleCall<'a> {
    method: MethodNamed,
    receiver: ReceiverIsHandle<'a>,
}

impl<'a> HandleCall<'a> {
    pub fn new(method: &'static str, receiver: ReceiverIsHandle<'a>) -> Self {
        Self {
            method: MethodNamed::new(method),
            receiver,
        }
    }

    pub fn prepare(receiver: ReceiverIsHandle<'a>) -> Self {
        Self::new("prepare", receiver)
    }

    pub fn query(receiver: ReceiverIsHandle<'a>) -> Self {
        Self::new("query", receiver)
    }

    pub fn handle_type(&self, call: &CallExpression) -> Option<&'a QualifiedName> {
        self.check(call)
            .then(|| self.receiver.handle_type(call))
            .flatten()
    }

    pub fn description(&self) -> String {
        format!("{} on a database handle", self.method.description())
    }
}

impl Predicate<CallExpression> for HandleCall<'_> {
    fn check(&self, call: &CallExpression) -> bool {
        self.method.check(call) && self.receiver.check(call)
    }
}

/// `->execute()` with nothing bound. `execute([])` does not match.
#[derive(Debug, Clone, Copy)]
pub struct ParameterlessExecute {
    method: MethodNamed,
    arguments: NoArguments,
}

impl Default for ParameterlessExecute {
    fn default() -> Self {
        Self {
            method: MethodNamed::new("execute"),
            arguments: NoArguments,
        }
    }
}

impl Predicate<CallExpression> for ParameterlessExecute {
    fn check(&self, call: &CallExpression) -> bool {
        self.method.check(call) && self.arguments.check(call)
    }
}

/// An expression statement that is a bare method call, so its result is
/// thrown away.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardedResult;

impl Predicate<Statement> for DiscardedResult {
    fn check(&self, statement: &Statement) -> bool {
        statement
            .as_expression()
            .is_some_and(|expression| expression.as_call().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClassDeclaration, Expression, ReceiverType, Span};

    fn call(method: &str, receiver_type: Option<&str>, arguments: usize) -> CallExpression {
        CallExpression {
            receiver: Box::new(Expression::Variable {
                name: "db".into(),
                span: Span::default(),
            }),
            receiver_type: receiver_type
                .map_or(ReceiverType::Unknown, |name| ReceiverType::Known(QualifiedName::new(name))),
            method: Some(method.into()),
            arguments: (0..arguments)
                .map(|_| Expression::Literal {
                    span: Span::default(),
                })
                .collect(),
            span: Span::default(),
        }
    }

    #[test]
    fn test_method_named_ignores_case() {
        let predicate = MethodNamed::new("prepare");
        assert!(predicate.check(&call("Prepare", None, 1)));
        assert!(!predicate.check(&call("prepared", None, 1)));
    }

    #[test]
    fn test_parameterless_execute() {
        let predicate = ParameterlessExecute::default();
        assert!(predicate.check(&call("execute", None, 0)));
        assert!(predicate.check(&call("EXECUTE", None, 0)));
        assert!(!predicate.check(&call("execute", None, 1)));
        assert!(!predicate.check(&call("fetch", None, 0)));
    }

    #[test]
    fn test_handle_call_requires_known_handle_receiver() {
        let handles = HandleTypes::default();
        let registry = ClassRegistry::new();
        let predicate = HandleCall::query(ReceiverIsHandle::new(&handles, &registry));

        assert!(predicate.check(&call("query", Some("\\PDO"), 1)));
        assert!(predicate.check(&call("query", Some("\\pdo"), 1)));
        assert!(!predicate.check(&call("query", None, 1)));
        assert!(!predicate.check(&call("query", Some("\\Mysqli"), 1)));
        assert!(!predicate.check(&call("exec", Some("\\PDO"), 1)));
        assert_eq!(
            predicate.description(),
            "method named 'query' on a database handle"
        );
    }

    #[test]
    fn test_handle_call_reports_recognized_type_for_subclasses() {
        let handles = HandleTypes::default();
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\App\\Db").extending("\\PDO")
        ]);
        let predicate = HandleCall::prepare(ReceiverIsHandle::new(&handles, &registry));

        let recognized = predicate.handle_type(&call("prepare", Some("\\App\\Db"), 1));
        assert_eq!(recognized, Some(&QualifiedName::new("\\PDO")));
    }

    #[test]
    fn test_discarded_result() {
        let bare = Statement::Expression {
            expression: Expression::MethodCall(call("query", None, 1)),
            span: Span::default(),
        };
        let assigned = Statement::Expression {
            expression: Expression::Assignment {
                target: Box::new(Expression::Variable {
                    name: "r".into(),
                    span: Span::default(),
                }),
                value: Box::new(Expression::MethodCall(call("query", None, 1))),
                span: Span::default(),
            },
            span: Span::default(),
        };

        assert!(DiscardedResult.check(&bare));
        assert!(!DiscardedResult.check(&assigned));
    }
}

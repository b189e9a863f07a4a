//! Receiver-type inference for method calls.
//!
//! A variable has a known class when every assignment to it in the scope
//! (and its parameter type hint, if it is a parameter) agrees on one class.
//! The only assignments that carry a class are `$v = new T(...)`.

use crate::core::{Expression, FunctionScope, QualifiedName, ReceiverType, Statement};
use std::collections::HashMap;

pub(super) fn annotate_receivers(scope: &mut FunctionScope) {
    let environment = TypeEnvironment::for_scope(scope);
    for statement in &mut scope.body.statements {
        annotate_statement(statement, &environment);
    }
}

#[derive(Debug, Default)]
struct TypeEnvironment {
    /// `None` once a variable has been given an unknown or conflicting type.
    variables: HashMap<String, Option<QualifiedName>>,
}

impl TypeEnvironment {
    fn for_scope(scope: &FunctionScope) -> Self {
        let mut environment = Self::default();
        for parameter in &scope.parameters {
            let class = parameter
                .type_hint
                .as_ref()
                .and_then(|hint| hint.resolved.clone());
            environment.record(&parameter.name, class);
        }

        scope.body.walk_blocks(&mut |block| {
            for statement in &block.statements {
                for expression in statement.expressions() {
                    expression.walk(&mut |node| {
                        if let Some((name, value)) = node.as_variable_assignment() {
                            environment.record(name, instantiated_class(value));
                        }
                    });
                }
            }
        });
        environment
    }

    fn record(&mut self, variable: &str, class: Option<QualifiedName>) {
        match self.variables.get_mut(variable) {
            None => {
                self.variables.insert(variable.to_string(), class);
            }
            Some(existing) => {
                if *existing != class {
                    *existing = None;
                }
            }
        }
    }

    fn lookup(&self, variable: &str) -> ReceiverType {
        match self.variables.get(variable) {
            Some(Some(class)) => ReceiverType::Known(class.clone()),
            _ => ReceiverType::Unknown,
        }
    }
}

fn instantiated_class(value: &Expression) -> Option<QualifiedName> {
    match value {
        Expression::New {
            class: Some(class), ..
        } => class.resolved.clone(),
        _ => None,
    }
}

fn annotate_statement(statement: &mut Statement, environment: &TypeEnvironment) {
    match statement {
        Statement::Expression { expression, .. } => annotate_expression(expression, environment),
        Statement::Compound {
            expressions,
            blocks,
            ..
        } => {
            for expression in expressions {
                annotate_expression(expression, environment);
            }
            for block in blocks {
                for nested in &mut block.statements {
                    annotate_statement(nested, environment);
                }
            }
        }
    }
}

fn annotate_expression(expression: &mut Expression, environment: &TypeEnvironment) {
    match expression {
        Expression::MethodCall(call) => {
            call.receiver_type = match call.receiver.as_ref() {
                Expression::Variable { name, .. } => environment.lookup(name),
                Expression::New { .. } => instantiated_class(&call.receiver)
                    .map_or(ReceiverType::Unknown, ReceiverType::Known),
                _ => ReceiverType::Unknown,
            };
            annotate_expression(&mut call.receiver, environment);
            for argument in &mut call.arguments {
                annotate_expression(argument, environment);
            }
        }
        Expression::Assignment { target, value, .. } => {
            annotate_expression(target, environment);
            annotate_expression(value, environment);
        }
        Expression::New {
            arguments: children,
            ..
        }
        | Expression::Array {
            elements: children,
            ..
        }
        | Expression::Other { children, .. } => {
            for child in children {
                annotate_expression(child, environment);
            }
        }
        Expression::Variable { .. } | Expression::Literal { .. } => {}
    }
}

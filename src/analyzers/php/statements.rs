//! Statements and expressions.

use super::{named_children, Lowerer};
use crate::core::{Block, CallExpression, ClassKind, Expression, ReceiverType, Span, Statement, TypeReference};
use crate::resolver::NameContext;
use tree_sitter::Node;

impl<'s> Lowerer<'s> {
    pub(super) fn lower_block(&mut self, node: Node, context: &NameContext) -> Block {
        let statements = named_children(node)
            .into_iter()
            .filter_map(|child| self.lower_statement(child, context))
            .collect();
        Block::new(statements)
    }

    /// Declarations are recorded on the lowerer and produce no statement.
    pub(super) fn lower_statement(&mut self, node: Node, context: &NameContext) -> Option<Statement> {
        let span = Span::from_node(node);
        match node.kind() {
            "php_tag" | "text" | "text_interpolation" | "empty_statement" | "ERROR" => None,
            "expression_statement" => {
                let expression = named_children(node).into_iter().next()?;
                Some(Statement::Expression {
                    expression: self.lower_expression(expression, context),
                    span,
                })
            }
            "class_declaration" => {
                self.lower_class(node, context, ClassKind::Class);
                None
            }
            "interface_declaration" => {
                self.lower_class(node, context, ClassKind::Interface);
                None
            }
            "trait_declaration" | "enum_declaration" => {
                self.lower_members(node, context);
                None
            }
            "function_definition" => {
                self.lower_function(node, context);
                None
            }
            "compound_statement" | "colon_block" => Some(Statement::Compound {
                expressions: Vec::new(),
                blocks: vec![self.lower_block(node, context)],
                span,
            }),
            "global_declaration" | "function_static_declaration" => {
                self.record_nonlocal(node);
                Some(self.lower_control_flow(node, context, span))
            }
            _ => Some(self.lower_control_flow(node, context, span)),
        }
    }

    fn lower_control_flow(&mut self, node: Node, context: &NameContext, span: Span) -> Statement {
        let mut expressions = Vec::new();
        let mut blocks = Vec::new();
        self.lower_compound(node, context, &mut expressions, &mut blocks);
        Statement::Compound {
            expressions,
            blocks,
            span,
        }
    }

    /// Split a control-flow statement into its own expressions and its
    /// nested blocks. Consecutive bare statements (a `case` body, a braceless
    /// `if` body) form one block so their order is kept.
    fn lower_compound(
        &mut self,
        node: Node,
        context: &NameContext,
        expressions: &mut Vec<Expression>,
        blocks: &mut Vec<Block>,
    ) {
        let mut pending: Vec<Statement> = Vec::new();

        for child in named_children(node) {
            let kind = child.kind();
            if is_statement_kind(kind) {
                if let Some(statement) = self.lower_statement(child, context) {
                    pending.push(statement);
                }
                continue;
            }

            if !pending.is_empty() {
                blocks.push(Block::new(std::mem::take(&mut pending)));
            }
            match kind {
                "ERROR" => {}
                "compound_statement" | "colon_block" | "switch_block" => {
                    blocks.push(self.lower_block(child, context))
                }
                _ if kind.ends_with("_clause") => {
                    self.lower_compound(child, context, expressions, blocks)
                }
                _ => expressions.push(self.lower_expression(child, context)),
            }
        }

        if !pending.is_empty() {
            blocks.push(Block::new(pending));
        }
    }

    pub(super) fn lower_expression(&mut self, node: Node, context: &NameContext) -> Expression {
        let span = Span::from_node(node);
        match node.kind() {
            "variable_name" => Expression::Variable {
                name: self.text(node).trim_start_matches('$').to_string(),
                span,
            },
            "member_call_expression" | "nullsafe_member_call_expression" => {
                self.lower_member_call(node, context)
            }
            "assignment_expression" | "reference_assignment_expression" => {
                match (node.child_by_field_name("left"), node.child_by_field_name("right")) {
                    (Some(left), Some(right)) => Expression::Assignment {
                        target: Box::new(self.lower_expression(left, context)),
                        value: Box::new(self.lower_expression(right, context)),
                        span,
                    },
                    _ => self.lower_opaque(node, context),
                }
            }
            "object_creation_expression" => self.lower_instantiation(node, context),
            "array_creation_expression" => Expression::Array {
                elements: self.lower_children(node, context),
                span,
            },
            "parenthesized_expression" => match named_children(node).into_iter().next() {
                Some(inner) => self.lower_expression(inner, context),
                None => Expression::Literal { span },
            },
            "string" | "integer" | "float" | "boolean" | "null" | "nowdoc" => {
                Expression::Literal { span }
            }
            "anonymous_function" | "anonymous_function_creation_expression" => {
                self.lower_function(node, context);
                // Variables captured with `use (...)` are read by the closure.
                let captured = named_children(node)
                    .into_iter()
                    .filter(|child| child.kind() == "anonymous_function_use_clause")
                    .flat_map(|clause| self.lower_children(clause, context))
                    .collect();
                Expression::Other {
                    children: captured,
                    span,
                }
            }
            "arrow_function" => {
                let children = node
                    .child_by_field_name("body")
                    .map(|body| vec![self.lower_expression(body, context)])
                    .unwrap_or_default();
                Expression::Other { children, span }
            }
            _ => self.lower_opaque(node, context),
        }
    }

    fn lower_member_call(&mut self, node: Node, context: &NameContext) -> Expression {
        let Some(object) = node.child_by_field_name("object") else {
            return self.lower_opaque(node, context);
        };

        let method = node
            .child_by_field_name("name")
            .filter(|name| name.kind() == "name")
            .map(|name| self.text(name).to_string());
        let arguments = node
            .child_by_field_name("arguments")
            .map(|arguments| self.lower_arguments(arguments, context))
            .unwrap_or_default();

        Expression::MethodCall(CallExpression {
            receiver: Box::new(self.lower_expression(object, context)),
            receiver_type: ReceiverType::Unknown,
            method,
            arguments,
            span: Span::from_node(node),
        })
    }

    fn lower_instantiation(&mut self, node: Node, context: &NameContext) -> Expression {
        let mut class = None;
        let mut arguments = Vec::new();

        for child in named_children(node) {
            match child.kind() {
                "name" | "qualified_name" => {
                    let written = self.text(child);
                    class = Some(TypeReference::new(
                        written,
                        context.resolve(written),
                        Span::from_node(child),
                    ));
                }
                "arguments" => arguments = self.lower_arguments(child, context),
                "anonymous_class" => {
                    if let Some(constructor) = named_children(child)
                        .into_iter()
                        .find(|part| part.kind() == "arguments")
                    {
                        arguments = self.lower_arguments(constructor, context);
                    }
                    self.lower_anonymous_class(child, context);
                }
                // Grammars without an `anonymous_class` node keep its clauses
                // on the creation expression itself.
                "declaration_list" => self.lower_anonymous_class(node, context),
                _ => {}
            }
        }

        Expression::New {
            class,
            arguments,
            span: Span::from_node(node),
        }
    }

    fn lower_arguments(&mut self, node: Node, context: &NameContext) -> Vec<Expression> {
        named_children(node)
            .into_iter()
            .map(|argument| match argument.kind() {
                // Named arguments (`name: value`) keep only the value.
                "argument" => match named_children(argument).into_iter().last() {
                    Some(value) => self.lower_expression(value, context),
                    None => Expression::Literal {
                        span: Span::from_node(argument),
                    },
                },
                _ => self.lower_expression(argument, context),
            })
            .collect()
    }

    fn lower_children(&mut self, node: Node, context: &NameContext) -> Vec<Expression> {
        named_children(node)
            .into_iter()
            .map(|child| self.lower_expression(child, context))
            .collect()
    }

    fn lower_opaque(&mut self, node: Node, context: &NameContext) -> Expression {
        Expression::Other {
            children: self.lower_children(node, context),
            span: Span::from_node(node),
        }
    }
}

fn is_statement_kind(kind: &str) -> bool {
    (kind.ends_with("_statement") && kind != "compound_statement")
        || kind.ends_with("_declaration")
        || kind == "function_definition"
}

#[cfg(test)]
mod tests {
    use crate::analyzers::php::PhpAnalyzer;
    use crate::core::{Expression, ParsedFile, Statement};
    use indoc::indoc;

    fn parse(source: &str) -> ParsedFile {
        PhpAnalyzer::new().parse(source, "statements.php").unwrap()
    }

    fn scope_named<'a>(file: &'a ParsedFile, name: &str) -> &'a crate::core::FunctionScope {
        file.scopes
            .iter()
            .find(|scope| scope.name.as_deref() == Some(name))
            .unwrap()
    }

    #[test]
    fn test_if_statement_keeps_condition_and_blocks() {
        let file = parse(indoc! {r#"
            <?php
            function f($db) {
                if ($db->ready()) {
                    $db->exec('A');
                    $db->exec('B');
                } else {
                    $db->exec('C');
                }
            }
        "#});

        let body = &scope_named(&file, "f").body;
        let Statement::Compound {
            expressions,
            blocks,
            ..
        } = &body.statements[0]
        else {
            panic!("expected compound statement");
        };
        assert_eq!(expressions.len(), 1);
        let statement_counts: Vec<usize> = blocks.iter().map(|b| b.statements.len()).collect();
        assert!(statement_counts.contains(&2));
        assert_eq!(body.count_reads("db"), 4);
    }

    #[test]
    fn test_case_bodies_stay_in_order() {
        let file = parse(indoc! {r#"
            <?php
            function f($db, $kind) {
                switch ($kind) {
                    case 1:
                        $s = $db->prepare('x');
                        $s->execute();
                        break;
                }
            }
        "#});

        let mut longest = 0;
        scope_named(&file, "f")
            .body
            .walk_blocks(&mut |block| longest = longest.max(block.statements.len()));
        assert_eq!(longest, 3);
    }

    #[test]
    fn test_closure_is_its_own_scope_and_captures_count_as_reads() {
        let file = parse(indoc! {r#"
            <?php
            function outer($stmt) {
                $run = function () use ($stmt) { return $stmt->execute(); };
                return $run;
            }
        "#});

        let outer = scope_named(&file, "outer");
        assert_eq!(outer.count_reads("stmt"), 1);
        assert_eq!(file.scopes.len(), 3);
    }

    #[test]
    fn test_reference_parameters_and_nonlocal_names() {
        let file = parse(indoc! {r#"
            <?php
            function f(\PDO $db, &$out, array &$rows) {
                global $last;
                static $cache = null, $hits = 0;
                $run = function () use ($db, &$captured) {};
            }
        "#});

        let f = scope_named(&file, "f");
        let by_reference: Vec<(&str, bool)> = f
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.by_reference))
            .collect();
        assert_eq!(by_reference, vec![("db", false), ("out", true), ("rows", true)]);
        assert_eq!(f.nonlocal_variables, vec!["last", "cache", "hits"]);
        assert!(f.outlives_call("out"));
        assert!(!f.outlives_call("run"));

        let closure = file
            .scopes
            .iter()
            .find(|scope| scope.name.is_none() && scope.nonlocal_variables.contains(&"captured".to_string()));
        assert!(closure.is_some(), "{:?}", file.scopes);
    }

    #[test]
    fn test_anonymous_class_is_declared() {
        let file = parse(indoc! {r#"
            <?php
            interface I {}
            $first = new class extends B implements I {
                public function run() { return 1; }
            };
            $second = new class($arg) implements \Countable {};
        "#});

        let anonymous: Vec<_> = file
            .classes
            .iter()
            .filter(|class| class.name.as_str().starts_with("\\class@anonymous"))
            .collect();
        assert_eq!(anonymous.len(), 2);
        assert_ne!(anonymous[0].name, anonymous[1].name);
        assert_eq!(anonymous[0].parent_name().map(|n| n.as_str()), Some("\\B"));
        assert_eq!(anonymous[0].interfaces[0].written, "I");
        assert_eq!(anonymous[1].interfaces[0].written, "\\Countable");
        assert!(file.scopes.iter().any(|scope| scope.name.as_deref() == Some("run")));

        let second = file
            .scopes
            .last()
            .and_then(|scope| scope.body.statements.get(1))
            .and_then(Statement::as_expression)
            .and_then(Expression::as_variable_assignment)
            .map(|(_, value)| value);
        assert!(matches!(second, Some(Expression::New { arguments, .. }) if arguments.len() == 1));
    }

    #[test]
    fn test_named_arguments_keep_values() {
        let file = parse("<?php\n$db->query(query: 'SELECT 1', mode: $mode);\n");
        let call = file
            .scopes
            .last()
            .and_then(|scope| scope.body.statements.first())
            .and_then(Statement::as_expression)
            .and_then(Expression::as_call)
            .unwrap();
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(call.arguments[0], Expression::Literal { .. }));
        assert_eq!(call.arguments[1].variable_name(), Some("mode"));
    }
}

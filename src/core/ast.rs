//! Plain-data model the inspections run on.
//!
//! The PHP front-end lowers a tree-sitter tree into these types once; every
//! name is already alias-resolved and every node carries its span. Nothing
//! here is mutated after lowering.

use super::Span;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Fully-qualified PHP name with a leading separator, e.g. `\App\Model\User`.
///
/// PHP class-like names are case-insensitive, so equality and hashing ignore
/// ASCII case while `Display` keeps the spelling it was built from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(name: impl AsRef<str>) -> Self {
        let trimmed = name.as_ref().trim().trim_start_matches('\\');
        Self(format!("\\{trimmed}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its leading separator (`PDO` for `\PDO`).
    pub fn without_leading_separator(&self) -> &str {
        &self.0[1..]
    }

    /// Last segment of the name.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('\\').next().unwrap_or(&self.0)
    }

    /// Append further segments (`\A` + `B\C` = `\A\B\C`).
    pub fn join(&self, rest: &str) -> Self {
        let rest = rest.trim_matches('\\');
        if rest.is_empty() {
            self.clone()
        } else {
            Self(format!("{}\\{}", self.0, rest))
        }
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A class-like name as written at a use site.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeReference {
    /// Text of the reference token (`ForeachSupport`, `\Traversable`).
    pub written: String,
    /// Alias-resolved target; `None` for names that cannot be resolved
    /// statically (`self`, `static`, `parent`).
    pub resolved: Option<QualifiedName>,
    pub span: Span,
}

impl TypeReference {
    pub fn new(written: impl Into<String>, resolved: Option<QualifiedName>, span: Span) -> Self {
        Self {
            written: written.into(),
            resolved,
            span,
        }
    }

    /// Reference whose written form is its fully-qualified name.
    pub fn qualified(name: &str, span: Span) -> Self {
        Self::new(name, Some(QualifiedName::new(name)), span)
    }
}

/// An entry of an `implements` list (or an interface's `extends` list).
pub type InterfaceReference = TypeReference;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: QualifiedName,
    pub kind: ClassKind,
    /// `extends` target of a class.
    pub parent: Option<TypeReference>,
    /// `implements` list of a class, or `extends` list of an interface, in
    /// declaration order.
    pub interfaces: Vec<InterfaceReference>,
    /// Span of the declared name.
    pub span: Span,
}

impl ClassDeclaration {
    pub fn class(name: &str) -> Self {
        Self::declare(name, ClassKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::declare(name, ClassKind::Interface)
    }

    fn declare(name: &str, kind: ClassKind) -> Self {
        Self {
            name: QualifiedName::new(name),
            kind,
            parent: None,
            interfaces: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn extending(mut self, parent: &str) -> Self {
        self.parent = Some(TypeReference::qualified(parent, Span::default()));
        self
    }

    pub fn implementing(mut self, interfaces: &[&str]) -> Self {
        self.interfaces.extend(
            interfaces
                .iter()
                .map(|name| TypeReference::qualified(name, Span::default())),
        );
        self
    }

    pub fn parent_name(&self) -> Option<&QualifiedName> {
        self.parent.as_ref().and_then(|parent| parent.resolved.as_ref())
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &QualifiedName> {
        self.interfaces
            .iter()
            .filter_map(|reference| reference.resolved.as_ref())
    }
}

/// Statically known type of a method-call receiver.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReceiverType {
    Known(QualifiedName),
    #[default]
    Unknown,
}

impl ReceiverType {
    pub fn known(&self) -> Option<&QualifiedName> {
        match self {
            ReceiverType::Known(name) => Some(name),
            ReceiverType::Unknown => None,
        }
    }
}

/// `$receiver->method(arguments)`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CallExpression {
    pub receiver: Box<Expression>,
    pub receiver_type: ReceiverType,
    /// `None` for dynamic method names (`$db->$method()`).
    pub method: Option<String>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

impl CallExpression {
    /// PHP method names are case-insensitive.
    pub fn method_is(&self, name: &str) -> bool {
        self.method
            .as_deref()
            .is_some_and(|method| method.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Expression {
    /// `$name`; the name is stored without the sigil.
    Variable { name: String, span: Span },
    MethodCall(CallExpression),
    Assignment {
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },
    New {
        class: Option<TypeReference>,
        arguments: Vec<Expression>,
        span: Span,
    },
    Array { elements: Vec<Expression>, span: Span },
    Literal { span: Span },
    /// Anything else; children are kept so variable uses stay visible.
    Other { children: Vec<Expression>, span: Span },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Variable { span, .. }
            | Expression::Assignment { span, .. }
            | Expression::New { span, .. }
            | Expression::Array { span, .. }
            | Expression::Literal { span }
            | Expression::Other { span, .. } => *span,
            Expression::MethodCall(call) => call.span,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpression> {
        match self {
            Expression::MethodCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Expression::Variable { name, .. } => Some(name),
            _ => None,
        }
    }

    /// `$target = <value>` with a plain variable on the left.
    pub fn as_variable_assignment(&self) -> Option<(&str, &Expression)> {
        match self {
            Expression::Assignment { target, value, .. } => {
                target.variable_name().map(|name| (name, value.as_ref()))
            }
            _ => None,
        }
    }

    /// Pre-order walk over this expression and all nested expressions.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Expression)) {
        visit(self);
        match self {
            Expression::Variable { .. } | Expression::Literal { .. } => {}
            Expression::MethodCall(call) => {
                call.receiver.walk(visit);
                call.arguments.iter().for_each(|argument| argument.walk(visit));
            }
            Expression::Assignment { target, value, .. } => {
                target.walk(visit);
                value.walk(visit);
            }
            Expression::New { arguments, .. } => {
                arguments.iter().for_each(|argument| argument.walk(visit));
            }
            Expression::Array { elements, .. } => {
                elements.iter().for_each(|element| element.walk(visit));
            }
            Expression::Other { children, .. } => {
                children.iter().for_each(|child| child.walk(visit));
            }
        }
    }

    /// Number of times `variable` is read. The target of a plain
    /// `$variable = ...` assignment is a write and does not count.
    pub fn count_reads(&self, variable: &str) -> usize {
        match self {
            Expression::Variable { name, .. } => usize::from(name == variable),
            Expression::Literal { .. } => 0,
            Expression::MethodCall(call) => {
                call.receiver.count_reads(variable)
                    + sum_reads(&call.arguments, variable)
            }
            Expression::Assignment { target, value, .. } => {
                let target_reads = match target.as_ref() {
                    Expression::Variable { .. } => 0,
                    other => other.count_reads(variable),
                };
                target_reads + value.count_reads(variable)
            }
            Expression::New { arguments, .. } => sum_reads(arguments, variable),
            Expression::Array { elements, .. } => sum_reads(elements, variable),
            Expression::Other { children, .. } => sum_reads(children, variable),
        }
    }
}

fn sum_reads(expressions: &[Expression], variable: &str) -> usize {
    expressions
        .iter()
        .map(|expression| expression.count_reads(variable))
        .sum()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Statement {
    /// `<expression>;`
    Expression { expression: Expression, span: Span },
    /// Control flow and other statements: their own expressions (conditions,
    /// echo arguments, return values) plus nested blocks.
    Compound {
        expressions: Vec<Expression>,
        blocks: Vec<Block>,
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Expression { span, .. } | Statement::Compound { span, .. } => *span,
        }
    }

    /// Expressions owned directly by this statement (not by nested blocks).
    pub fn expressions(&self) -> &[Expression] {
        match self {
            Statement::Expression { expression, .. } => std::slice::from_ref(expression),
            Statement::Compound { expressions, .. } => expressions,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        match self {
            Statement::Expression { .. } => &[],
            Statement::Compound { blocks, .. } => blocks,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Statement::Expression { expression, .. } => Some(expression),
            Statement::Compound { .. } => None,
        }
    }

    /// `$variable = ...;` as a statement of its own.
    pub fn rebinds(&self, variable: &str) -> bool {
        self.as_expression()
            .and_then(Expression::as_variable_assignment)
            .is_some_and(|(bound, _)| bound == variable)
    }

    pub fn count_reads(&self, variable: &str) -> usize {
        sum_reads(self.expressions(), variable)
            + self
                .blocks()
                .iter()
                .map(|block| block.count_reads(variable))
                .sum::<usize>()
    }
}

/// A sequence of statements; comments are not statements.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Visit this block and every nested block, outermost first.
    pub fn walk_blocks<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        for statement in &self.statements {
            for block in statement.blocks() {
                block.walk_blocks(visit);
            }
        }
    }

    pub fn count_reads(&self, variable: &str) -> usize {
        self.statements
            .iter()
            .map(|statement| statement.count_reads(variable))
            .sum()
    }

    /// Reads of the value bound by the statement at `index`, counted over the
    /// following statements of this block up to and including the next
    /// plain `$variable = ...` at this level. The flag is `false` when the
    /// block ends with the binding still live.
    pub fn reads_until_rebind(&self, index: usize, variable: &str) -> (usize, bool) {
        let mut reads = 0;
        for statement in self.statements.iter().skip(index + 1) {
            reads += statement.count_reads(variable);
            if statement.rebinds(variable) {
                return (reads, true);
            }
        }
        (reads, false)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<TypeReference>,
    /// `&$name`
    #[serde(default)]
    pub by_reference: bool,
}

/// Body of a function, method, closure, or the file's top-level code.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionScope {
    /// `None` for top-level code and closures.
    pub name: Option<String>,
    pub parameters: Vec<Parameter>,
    /// Names declared `global` or `static` in the body, and closure captures
    /// taken by reference.
    #[serde(default)]
    pub nonlocal_variables: Vec<String>,
    pub body: Block,
    pub span: Span,
}

impl FunctionScope {
    pub fn count_reads(&self, variable: &str) -> usize {
        self.body.count_reads(variable)
    }

    /// Whether a value bound to `variable` stays visible after the call
    /// returns.
    pub fn outlives_call(&self, variable: &str) -> bool {
        self.nonlocal_variables.iter().any(|name| name == variable)
            || self
                .parameters
                .iter()
                .any(|parameter| parameter.by_reference && parameter.name == variable)
    }
}

/// Everything the inspections need from one source file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub classes: Vec<ClassDeclaration>,
    pub scopes: Vec<FunctionScope>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn variable(name: &str) -> Expression {
        Expression::Variable {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    #[test]
    fn test_qualified_name_normalizes_leading_separator() {
        assert_eq!(QualifiedName::new("App\\User").as_str(), "\\App\\User");
        assert_eq!(QualifiedName::new("\\App\\User").as_str(), "\\App\\User");
        assert_eq!(QualifiedName::new("\\PDO").without_leading_separator(), "PDO");
        assert_eq!(QualifiedName::new("\\App\\User").short_name(), "User");
    }

    #[test]
    fn test_qualified_name_is_case_insensitive() {
        let a = QualifiedName::new("\\App\\Traversable");
        let b = QualifiedName::new("\\app\\TRAVERSABLE");
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_qualified_name_join() {
        let base = QualifiedName::new("\\Vendor\\Lib");
        assert_eq!(base.join("Sub\\Thing").as_str(), "\\Vendor\\Lib\\Sub\\Thing");
        assert_eq!(base.join("").as_str(), "\\Vendor\\Lib");
    }

    #[test]
    fn test_count_reads_skips_assignment_target() {
        let assignment = Expression::Assignment {
            target: Box::new(variable("y")),
            value: Box::new(variable("y")),
            span: Span::default(),
        };
        assert_eq!(assignment.count_reads("y"), 1);
        assert_eq!(assignment.as_variable_assignment().map(|(n, _)| n), Some("y"));
    }

    #[test]
    fn test_count_reads_through_calls_and_blocks() {
        let call = Expression::MethodCall(CallExpression {
            receiver: Box::new(variable("stmt")),
            receiver_type: ReceiverType::Unknown,
            method: Some("bindValue".into()),
            arguments: vec![variable("stmt")],
            span: Span::default(),
        });
        let inner = Block::new(vec![Statement::Expression {
            expression: call,
            span: Span::default(),
        }]);
        let outer = Block::new(vec![Statement::Compound {
            expressions: vec![variable("stmt")],
            blocks: vec![inner],
            span: Span::default(),
        }]);

        assert_eq!(outer.count_reads("stmt"), 3);
        assert_eq!(outer.count_reads("other"), 0);

        let mut visited = 0;
        outer.walk_blocks(&mut |_| visited += 1);
        assert_eq!(visited, 2);
    }

    fn assign(name: &str, value: Expression) -> Statement {
        Statement::Expression {
            expression: Expression::Assignment {
                target: Box::new(variable(name)),
                value: Box::new(value),
                span: Span::default(),
            },
            span: Span::default(),
        }
    }

    fn read(name: &str) -> Statement {
        Statement::Expression {
            expression: variable(name),
            span: Span::default(),
        }
    }

    #[test]
    fn test_reads_until_rebind_stops_at_next_binding() {
        let block = Block::new(vec![
            assign("stmt", Expression::Literal { span: Span::default() }),
            read("stmt"),
            assign("stmt", variable("stmt")),
            read("stmt"),
            read("stmt"),
        ]);

        assert_eq!(block.reads_until_rebind(0, "stmt"), (2, true));
        assert_eq!(block.reads_until_rebind(2, "stmt"), (2, false));
        assert_eq!(block.reads_until_rebind(4, "stmt"), (0, false));
    }

    #[test]
    fn test_nested_assignment_is_not_a_rebind() {
        let block = Block::new(vec![
            assign("r", Expression::Literal { span: Span::default() }),
            Statement::Compound {
                expressions: vec![],
                blocks: vec![Block::new(vec![assign("r", variable("x"))])],
                span: Span::default(),
            },
            read("r"),
        ]);
        assert_eq!(block.reads_until_rebind(0, "r"), (1, false));
    }

    #[test]
    fn test_outlives_call() {
        let scope = FunctionScope {
            parameters: vec![
                Parameter {
                    name: "out".into(),
                    type_hint: None,
                    by_reference: true,
                },
                Parameter {
                    name: "db".into(),
                    type_hint: None,
                    by_reference: false,
                },
            ],
            nonlocal_variables: vec!["cache".into()],
            ..FunctionScope::default()
        };

        assert!(scope.outlives_call("out"));
        assert!(scope.outlives_call("cache"));
        assert!(!scope.outlives_call("db"));
        assert!(!scope.outlives_call("local"));
    }

    #[test]
    fn test_method_is_ignores_case() {
        let call = CallExpression {
            receiver: Box::new(variable("db")),
            receiver_type: ReceiverType::Unknown,
            method: Some("PREPARE".into()),
            arguments: vec![],
            span: Span::default(),
        };
        assert!(call.method_is("prepare"));
        assert!(!call.method_is("query"));
    }
}

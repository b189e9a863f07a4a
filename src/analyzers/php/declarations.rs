//! Namespaces, imports, class-likes and functions.

use super::{named_children, node_text, Lowerer};
use crate::core::{ClassDeclaration, ClassKind, Parameter, QualifiedName, Span, Statement, TypeReference};
use crate::resolver::NameContext;
use tracing::debug;
use tree_sitter::Node;

impl<'s> Lowerer<'s> {
    /// Lower the children of the program or of a braced namespace body.
    pub(super) fn lower_top_level(
        &mut self,
        container: Node,
        context: &mut NameContext,
        out: &mut Vec<Statement>,
    ) {
        for child in named_children(container) {
            match child.kind() {
                "namespace_definition" => self.lower_namespace(child, context, out),
                "namespace_use_declaration" => collect_imports(child, self.source, context),
                _ => {
                    if let Some(statement) = self.lower_statement(child, context) {
                        out.push(statement);
                    }
                }
            }
        }
    }

    fn lower_namespace(&mut self, node: Node, context: &mut NameContext, out: &mut Vec<Statement>) {
        let namespace = node
            .child_by_field_name("name")
            .map(|name| self.text(name))
            .unwrap_or("");
        let mut scoped = NameContext::in_namespace(namespace);

        match node.child_by_field_name("body") {
            Some(body) => self.lower_top_level(body, &mut scoped, out),
            // `namespace Foo;` applies to everything up to the next namespace.
            None => *context = scoped,
        }
    }

    pub(super) fn lower_class(&mut self, node: Node, context: &NameContext, kind: ClassKind) {
        let Some(name_node) = node.child_by_field_name("name") else {
            debug!(line = node.start_position().row + 1, "skipping class-like without a name");
            return;
        };

        let (parent, interfaces) = self.inheritance(node, context, kind);
        self.classes.push(ClassDeclaration {
            name: context.qualify_declaration(self.text(name_node)),
            kind,
            parent,
            interfaces,
            span: Span::from_node(name_node),
        });
        self.lower_members(node, context);
    }

    /// `new class(...) extends B implements I { ... }`. The declaration gets
    /// a file-unique synthetic name and the span of its `class` keyword.
    pub(super) fn lower_anonymous_class(&mut self, node: Node, context: &NameContext) {
        let (parent, interfaces) = self.inheritance(node, context, ClassKind::Class);
        let keyword = (0..node.child_count())
            .filter_map(|index| node.child(index))
            .find(|child| child.kind() == "class")
            .unwrap_or(node);

        self.anonymous_classes += 1;
        self.classes.push(ClassDeclaration {
            name: QualifiedName::new(format!("class@anonymous#{}", self.anonymous_classes)),
            kind: ClassKind::Class,
            parent,
            interfaces,
            span: Span::from_node(keyword),
        });
        self.lower_members(node, context);
    }

    /// Parent class and `implements` list of a class, or the `extends` list
    /// of an interface.
    fn inheritance(
        &self,
        node: Node,
        context: &NameContext,
        kind: ClassKind,
    ) -> (Option<TypeReference>, Vec<TypeReference>) {
        let mut parent = None;
        let mut interfaces = Vec::new();
        for child in named_children(node) {
            match (child.kind(), kind) {
                ("base_clause", ClassKind::Class) => {
                    parent = self.type_references(child, context).into_iter().next();
                }
                ("base_clause", ClassKind::Interface) | ("class_interface_clause", _) => {
                    interfaces.extend(self.type_references(child, context));
                }
                _ => {}
            }
        }
        (parent, interfaces)
    }

    fn type_references(&self, clause: Node, context: &NameContext) -> Vec<TypeReference> {
        named_children(clause)
            .into_iter()
            .filter(|child| matches!(child.kind(), "name" | "qualified_name"))
            .map(|child| {
                let written = self.text(child);
                TypeReference::new(written, context.resolve(written), Span::from_node(child))
            })
            .collect()
    }

    /// Lower the methods of a class-like body into their own scopes.
    pub(super) fn lower_members(&mut self, node: Node, context: &NameContext) {
        let body = node
            .child_by_field_name("body")
            .or_else(|| {
                named_children(node)
                    .into_iter()
                    .find(|child| child.kind().ends_with("declaration_list"))
            })
            .unwrap_or(node);

        for member in named_children(body) {
            if member.kind() == "method_declaration" {
                self.lower_function(member, context);
            }
        }
    }

    /// Functions, methods and closures. Bodiless (abstract) methods and
    /// arrow functions produce no scope.
    pub(super) fn lower_function(&mut self, node: Node, context: &NameContext) {
        let name = node
            .child_by_field_name("name")
            .map(|name| self.text(name).to_string());
        let parameters = node
            .child_by_field_name("parameters")
            .map(|parameters| self.lower_parameters(parameters, context))
            .unwrap_or_default();
        let Some(body) = node
            .child_by_field_name("body")
            .filter(|body| body.kind() == "compound_statement")
        else {
            return;
        };

        let captures = self.reference_captures(node);
        self.nonlocal.push(captures);
        let block = self.lower_block(body, context);
        let nonlocal = self.nonlocal.pop().unwrap_or_default();
        self.push_scope(name, parameters, nonlocal, block, Span::from_node(node));
    }

    /// Names of a closure's `use (&$name)` captures.
    fn reference_captures(&self, node: Node) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "anonymous_function_use_clause")
            .flat_map(named_children)
            .filter(|capture| capture.kind() == "by_ref" || self.text(*capture).starts_with('&'))
            .map(|capture| variable_name(self.text(capture)))
            .collect()
    }

    /// Record the names bound by `global $a, $b;` or `static $a = 1;` on the
    /// function being lowered.
    pub(super) fn record_nonlocal(&mut self, declaration: Node) {
        let names: Vec<String> = named_children(declaration)
            .into_iter()
            .filter_map(|child| match child.kind() {
                "variable_name" => Some(child),
                _ => child.child_by_field_name("name"),
            })
            .map(|name| variable_name(self.text(name)))
            .collect();
        if let Some(frame) = self.nonlocal.last_mut() {
            frame.extend(names);
        }
    }

    fn lower_parameters(&self, node: Node, context: &NameContext) -> Vec<Parameter> {
        named_children(node)
            .into_iter()
            .filter(|parameter| {
                matches!(
                    parameter.kind(),
                    "simple_parameter" | "variadic_parameter" | "property_promotion_parameter"
                )
            })
            .filter_map(|parameter| {
                let name = parameter
                    .child_by_field_name("name")
                    .map(|name| self.text(name).trim_start_matches('$').to_string())?;
                let type_hint = parameter
                    .child_by_field_name("type")
                    .and_then(|hint| self.single_class_type(hint, context));
                let by_reference = parameter.child_by_field_name("reference_modifier").is_some()
                    || named_children(parameter)
                        .iter()
                        .any(|child| child.kind() == "reference_modifier");
                Some(Parameter {
                    name,
                    type_hint,
                    by_reference,
                })
            })
            .collect()
    }

    /// The one class named by a type hint; `None` for scalar, intersection
    /// and multi-class union types.
    fn single_class_type(&self, node: Node, context: &NameContext) -> Option<TypeReference> {
        match node.kind() {
            "name" | "qualified_name" => {
                let written = self.text(node);
                let resolved = context.resolve(written)?;
                Some(TypeReference::new(written, Some(resolved), Span::from_node(node)))
            }
            "named_type" | "optional_type" => named_children(node)
                .into_iter()
                .find_map(|child| self.single_class_type(child, context)),
            "union_type" => {
                let mut candidates = named_children(node)
                    .into_iter()
                    .filter_map(|child| self.single_class_type(child, context));
                let first = candidates.next()?;
                candidates.next().is_none().then_some(first)
            }
            _ => None,
        }
    }
}

/// `$name` or `&$name` without its sigils.
fn variable_name(text: &str) -> String {
    text.trim_start_matches('&').trim().trim_start_matches('$').to_string()
}

/// Register the aliases introduced by a `use` declaration. Function and
/// constant imports do not name class-likes and are ignored.
pub(super) fn collect_imports(node: Node, source: &str, context: &mut NameContext) {
    if has_import_kind_keyword(node) {
        return;
    }

    let mut prefix: Option<String> = None;
    for child in named_children(node) {
        match child.kind() {
            "namespace_name" | "namespace_name_as_prefix" => {
                prefix = Some(node_text(child, source).trim_matches('\\').to_string());
            }
            "namespace_use_clause" => import_clause(child, None, source, context),
            "namespace_use_group" => {
                for clause in named_children(child) {
                    if matches!(
                        clause.kind(),
                        "namespace_use_clause" | "namespace_use_group_clause"
                    ) {
                        import_clause(clause, prefix.as_deref(), source, context);
                    }
                }
            }
            _ => {}
        }
    }
}

fn import_clause(clause: Node, prefix: Option<&str>, source: &str, context: &mut NameContext) {
    if has_import_kind_keyword(clause) {
        return;
    }

    let mut target: Option<&str> = None;
    let mut alias: Option<&str> = clause
        .child_by_field_name("alias")
        .map(|alias| node_text(alias, source));

    for child in named_children(clause) {
        match child.kind() {
            "name" | "qualified_name" | "namespace_name" if target.is_none() => {
                target = Some(node_text(child, source));
            }
            "name" if alias.is_none() => alias = Some(node_text(child, source)),
            "namespace_aliasing_clause" => {
                alias = named_children(child)
                    .into_iter()
                    .find(|name| name.kind() == "name")
                    .map(|name| node_text(name, source));
            }
            _ => {}
        }
    }

    let Some(target) = target else {
        return;
    };
    let target = target.trim_start_matches('\\');
    let qualified = match prefix {
        Some(prefix) if !prefix.is_empty() => QualifiedName::new(prefix).join(target),
        _ => QualifiedName::new(target),
    };

    match alias {
        Some(alias) => context.add_alias(alias, qualified),
        None => context.add_import(qualified),
    }
}

/// `use function ...` / `use const ...`
fn has_import_kind_keyword(node: Node) -> bool {
    (0..node.child_count())
        .filter_map(|index| node.child(index))
        .take_while(|child| {
            !matches!(
                child.kind(),
                "namespace_use_clause" | "namespace_use_group" | "name" | "qualified_name"
            )
        })
        .any(|child| matches!(child.kind(), "function" | "const"))
}

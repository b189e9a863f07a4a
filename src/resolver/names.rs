//! Name resolution for class-like references.
//!
//! A [`NameContext`] is the namespace a reference appears in plus the import
//! aliases active there. Resolution is a pure lookup; the front-end calls it
//! once per reference and stores the result on the reference.

use crate::core::QualifiedName;
use std::collections::HashMap;

/// Type names that never denote a class.
const NON_CLASS_NAMES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "string", "true", "void", "self", "static", "parent",
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NameContext {
    /// Current namespace without separators at either end; `None` is global.
    namespace: Option<String>,
    /// Lowercased alias -> target.
    aliases: HashMap<String, QualifiedName>,
}

impl NameContext {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: &str) -> Self {
        let namespace = namespace.trim().trim_matches('\\');
        Self {
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            aliases: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Register `use <target> as <alias>;`. Later imports of the same alias win.
    pub fn add_alias(&mut self, alias: &str, target: QualifiedName) {
        self.aliases.insert(alias.trim().to_ascii_lowercase(), target);
    }

    /// Register `use <target>;`, aliased by its last segment.
    pub fn add_import(&mut self, target: QualifiedName) {
        let alias = target.short_name().to_string();
        self.add_alias(&alias, target);
    }

    pub fn alias_target(&self, alias: &str) -> Option<&QualifiedName> {
        self.aliases.get(&alias.to_ascii_lowercase())
    }

    /// Fully-qualified name of a class-like declared in this namespace.
    pub fn qualify_declaration(&self, short_name: &str) -> QualifiedName {
        self.prefix_namespace(short_name.trim())
    }

    /// Resolve a class-like reference as written in source.
    ///
    /// Returns `None` for names that do not denote a class (`self`, scalar
    /// type names, empty text).
    pub fn resolve(&self, written: &str) -> Option<QualifiedName> {
        let name: String = written.chars().filter(|c| !c.is_whitespace()).collect();
        if name.is_empty() || NON_CLASS_NAMES.contains(&name.to_ascii_lowercase().as_str()) {
            return None;
        }

        if name.starts_with('\\') {
            return Some(QualifiedName::new(&name));
        }

        if let Some(relative) = strip_prefix_ignore_case(&name, "namespace\\") {
            return Some(self.prefix_namespace(relative));
        }

        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name.as_str(), None),
        };

        match (self.alias_target(first), rest) {
            (Some(target), Some(rest)) => Some(target.join(rest)),
            (Some(target), None) => Some(target.clone()),
            (None, _) => Some(self.prefix_namespace(&name)),
        }
    }

    fn prefix_namespace(&self, name: &str) -> QualifiedName {
        match &self.namespace {
            Some(namespace) => QualifiedName::new(namespace).join(name),
            None => QualifiedName::new(name),
        }
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

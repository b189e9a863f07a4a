//! Class and interface hierarchy registry.
//!
//! The registry indexes the class-like declarations of the analyzed input
//! and answers two questions: which interfaces a class's ancestors already
//! announce (and who announced them first), and whether a class extends a
//! given class. Names not declared in the input are unknown: they end a
//! walk instead of failing it.

use crate::core::{ClassDeclaration, ClassKind, QualifiedName};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Interfaces already guaranteed by a class's ancestors, each mapped to the
/// nearest declaration that introduces it. Iteration follows discovery
/// order, nearest ancestor first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestorInterfaceSet {
    entries: Vec<(QualifiedName, QualifiedName)>,
    index: HashMap<QualifiedName, usize>,
}

impl AncestorInterfaceSet {
    /// Record `interface` as introduced by `introducer` unless an earlier
    /// (nearer) introducer is already known.
    pub fn insert(&mut self, interface: QualifiedName, introducer: QualifiedName) -> bool {
        if self.index.contains_key(&interface) {
            return false;
        }
        self.index.insert(interface.clone(), self.entries.len());
        self.entries.push((interface, introducer));
        true
    }

    pub fn contains(&self, interface: &QualifiedName) -> bool {
        self.index.contains_key(interface)
    }

    /// The stored entry for `interface`: its canonical spelling and introducer.
    pub fn get(&self, interface: &QualifiedName) -> Option<(&QualifiedName, &QualifiedName)> {
        self.index
            .get(interface)
            .map(|&position| (&self.entries[position].0, &self.entries[position].1))
    }

    pub fn introducer_of(&self, interface: &QualifiedName) -> Option<&QualifiedName> {
        self.get(interface).map(|(_, introducer)| introducer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedName, &QualifiedName)> {
        self.entries.iter().map(|(interface, introducer)| (interface, introducer))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ClassRegistry {
    declarations: HashMap<QualifiedName, ClassDeclaration>,
    closures: DashMap<QualifiedName, Arc<AncestorInterfaceSet>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations(declarations: impl IntoIterator<Item = ClassDeclaration>) -> Self {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.register(declaration);
        }
        registry
    }

    /// Add a declaration. The first declaration of a name wins, matching
    /// PHP's refusal to redeclare a class.
    pub fn register(&mut self, declaration: ClassDeclaration) {
        if self.declarations.contains_key(&declaration.name) {
            debug!(name = %declaration.name, "ignoring duplicate class-like declaration");
            return;
        }
        self.closures.clear();
        self.declarations
            .insert(declaration.name.clone(), declaration);
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&ClassDeclaration> {
        self.declarations.get(name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Canonical spelling of a name: the declared one when known.
    pub fn canonical<'a>(&'a self, name: &'a QualifiedName) -> &'a QualifiedName {
        self.declarations
            .get(name)
            .map_or(name, |declaration| &declaration.name)
    }

    /// Ancestor interface closure of `class`, computed once and cached.
    pub fn ancestor_interfaces(&self, class: &QualifiedName) -> Arc<AncestorInterfaceSet> {
        if let Some(cached) = self.closures.get(class) {
            return Arc::clone(cached.value());
        }
        let computed = Arc::new(self.compute_ancestor_interfaces(class));
        self.closures
            .entry(class.clone())
            .or_insert(computed)
            .value()
            .clone()
    }

    fn compute_ancestor_interfaces(&self, class: &QualifiedName) -> AncestorInterfaceSet {
        let mut closure = AncestorInterfaceSet::default();
        let mut visited_classes = HashSet::from([class.clone()]);
        let mut current = self.get(class).and_then(ClassDeclaration::parent_name);

        while let Some(parent_name) = current {
            if !visited_classes.insert(parent_name.clone()) {
                debug!(class = %class, parent = %parent_name, "inheritance cycle, stopping walk");
                break;
            }
            let Some(parent) = self.get(parent_name) else {
                break;
            };
            if parent.kind != ClassKind::Class {
                break;
            }

            for interface in parent.interface_names() {
                closure.insert(self.canonical(interface).clone(), parent.name.clone());
            }
            self.extend_with_interface_parents(parent.interface_names(), &mut closure);

            current = parent.parent_name();
        }

        closure
    }

    /// Breadth-first walk of the interface `extends` graph below `roots`.
    /// Each discovered interface is attributed to the interface whose
    /// `extends` list names it.
    fn extend_with_interface_parents<'a>(
        &'a self,
        roots: impl Iterator<Item = &'a QualifiedName>,
        closure: &mut AncestorInterfaceSet,
    ) {
        let mut queue: VecDeque<&QualifiedName> = roots.collect();
        let mut seen: HashSet<&QualifiedName> = queue.iter().copied().collect();

        while let Some(interface) = queue.pop_front() {
            let Some(declaration) = self.get(interface) else {
                continue;
            };
            for extended in declaration.interface_names() {
                closure.insert(self.canonical(extended).clone(), declaration.name.clone());
                if seen.insert(extended) {
                    queue.push_back(extended);
                }
            }
        }
    }

    /// Names of the classes `class` extends, nearest first. The walk stops
    /// after the first name that is not declared in the input (that name is
    /// still included) and on cycles.
    pub fn ancestor_classes(&self, class: &QualifiedName) -> Vec<QualifiedName> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::from([class.clone()]);
        let mut current = self.get(class).and_then(ClassDeclaration::parent_name);

        while let Some(parent) = current {
            if !visited.insert(parent.clone()) {
                break;
            }
            ancestors.push(self.canonical(parent).clone());
            current = self.get(parent).and_then(ClassDeclaration::parent_name);
        }

        ancestors
    }

    /// Whether `class` is `ancestor` or extends it.
    pub fn is_same_or_subclass(&self, class: &QualifiedName, ancestor: &QualifiedName) -> bool {
        class == ancestor || self.ancestor_classes(class).contains(ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(text: &str) -> QualifiedName {
        QualifiedName::new(text)
    }

    fn basic_registry() -> ClassRegistry {
        ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\Ns\\ParentInterface"),
            ClassDeclaration::interface("\\Ns\\ChildInterface").implementing(&["\\Ns\\ParentInterface"]),
            ClassDeclaration::class("\\Ns\\AbstractOne").implementing(&["\\Ns\\ParentInterface"]),
            ClassDeclaration::class("\\Ns\\AbstractTwo")
                .implementing(&["\\Ns\\ParentInterface", "\\Ns\\ChildInterface"]),
            ClassDeclaration::class("\\Ns\\ClassOne").extending("\\Ns\\AbstractOne"),
            ClassDeclaration::class("\\Ns\\ClassTwo").extending("\\Ns\\AbstractTwo"),
        ])
    }

    #[test]
    fn test_direct_parent_interfaces_are_attributed_to_parent() {
        let registry = basic_registry();
        let closure = registry.ancestor_interfaces(&name("\\Ns\\ClassOne"));

        assert_eq!(
            closure.introducer_of(&name("\\Ns\\ParentInterface")),
            Some(&name("\\Ns\\AbstractOne"))
        );
        assert_eq!(closure.len(), 1);
    }

    #[test]
    fn test_direct_declaration_wins_over_interface_parent() {
        let registry = basic_registry();
        let closure = registry.ancestor_interfaces(&name("\\Ns\\ClassTwo"));

        assert_eq!(
            closure.introducer_of(&name("\\Ns\\ParentInterface")),
            Some(&name("\\Ns\\AbstractTwo"))
        );
        assert_eq!(
            closure.introducer_of(&name("\\Ns\\ChildInterface")),
            Some(&name("\\Ns\\AbstractTwo"))
        );
    }

    #[test]
    fn test_interface_parents_are_attributed_to_extending_interface() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\Base"),
            ClassDeclaration::interface("\\Left").implementing(&["\\Base"]),
            ClassDeclaration::interface("\\Right"),
            ClassDeclaration::interface("\\Both").implementing(&["\\Left", "\\Right"]),
            ClassDeclaration::class("\\Impl").implementing(&["\\Both"]),
            ClassDeclaration::class("\\Child").extending("\\Impl"),
        ]);
        let closure = registry.ancestor_interfaces(&name("\\Child"));

        let entries: Vec<(String, String)> = closure
            .iter()
            .map(|(interface, introducer)| (interface.to_string(), introducer.to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("\\Both".to_string(), "\\Impl".to_string()),
                ("\\Left".to_string(), "\\Both".to_string()),
                ("\\Right".to_string(), "\\Both".to_string()),
                ("\\Base".to_string(), "\\Left".to_string()),
            ]
        );
    }

    #[test]
    fn test_grandparent_interfaces_are_included() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\A").implementing(&["\\Countable"]),
            ClassDeclaration::class("\\B").extending("\\A"),
            ClassDeclaration::class("\\C").extending("\\B"),
        ]);

        let closure = registry.ancestor_interfaces(&name("\\C"));
        assert_eq!(closure.introducer_of(&name("\\Countable")), Some(&name("\\A")));
    }

    #[test]
    fn test_unknown_parent_contributes_nothing() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\Child").extending("\\Vendor\\Missing"),
        ]);

        assert!(registry.ancestor_interfaces(&name("\\Child")).is_empty());
        assert!(registry.ancestor_interfaces(&name("\\NotDeclared")).is_empty());
    }

    #[test]
    fn test_cycles_terminate() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\A").extending("\\B").implementing(&["\\I"]),
            ClassDeclaration::class("\\B").extending("\\A").implementing(&["\\J"]),
            ClassDeclaration::interface("\\I").implementing(&["\\J"]),
            ClassDeclaration::interface("\\J").implementing(&["\\I"]),
        ]);

        let closure = registry.ancestor_interfaces(&name("\\A"));
        assert_eq!(closure.introducer_of(&name("\\J")), Some(&name("\\B")));
        assert_eq!(closure.introducer_of(&name("\\I")), Some(&name("\\J")));
        assert_eq!(registry.ancestor_classes(&name("\\A")), vec![name("\\B")]);
    }

    #[test]
    fn test_closure_is_cached_per_class() {
        let registry = basic_registry();
        let first = registry.ancestor_interfaces(&name("\\Ns\\ClassOne"));
        let second = registry.ancestor_interfaces(&name("\\ns\\classone"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_canonical_spelling_comes_from_declaration() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\Ns\\Marker"),
            ClassDeclaration::class("\\Ns\\Base").implementing(&["\\ns\\marker"]),
            ClassDeclaration::class("\\Ns\\Leaf").extending("\\Ns\\Base"),
        ]);

        let closure = registry.ancestor_interfaces(&name("\\Ns\\Leaf"));
        let (interface, _) = closure.get(&name("\\NS\\MARKER")).unwrap();
        assert_eq!(interface.as_str(), "\\Ns\\Marker");
    }

    #[test]
    fn test_subclass_check_includes_undeclared_root() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\App\\Db").extending("\\PDO"),
            ClassDeclaration::class("\\App\\ReadOnlyDb").extending("\\App\\Db"),
        ]);

        assert!(registry.is_same_or_subclass(&name("\\App\\ReadOnlyDb"), &name("\\PDO")));
        assert!(registry.is_same_or_subclass(&name("\\PDO"), &name("\\pdo")));
        assert!(!registry.is_same_or_subclass(&name("\\App\\Other"), &name("\\PDO")));
    }

    #[test]
    fn test_first_declaration_wins() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\Dup").implementing(&["\\First"]),
            ClassDeclaration::class("\\Dup").implementing(&["\\Second"]),
        ]);
        let declaration = registry.get(&name("\\Dup")).unwrap();
        assert_eq!(declaration.interfaces[0].written, "\\First");
        assert_eq!(registry.len(), 1);
    }
}

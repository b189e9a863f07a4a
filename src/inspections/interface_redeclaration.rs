//! Interface redeclaration inspection.
//!
//! Flags each entry of a class's `implements` list that an ancestor class
//! (or an interface one of them implements) already provides. References
//! are compared by their alias-resolved names, so `use \Traversable as
//! ForeachSupport; ... implements ForeachSupport` is caught as well.

use super::{Inspection, InspectionContext};
use crate::core::{ClassDeclaration, ClassKind, Diagnostic, InspectionKind, ParsedFile, QualifiedName};
use crate::resolver::AncestorInterfaceSet;

pub fn redeclaration_message(interface: &QualifiedName, introducer: &QualifiedName) -> String {
    format!("'{interface}' is already announced in '{introducer}'.")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceRedeclarationInspection;

impl Inspection for InterfaceRedeclarationInspection {
    fn kind(&self) -> InspectionKind {
        InspectionKind::InterfaceRedeclaration
    }

    fn inspect(&self, file: &ParsedFile, context: &InspectionContext) -> Vec<Diagnostic> {
        file.classes
            .iter()
            .filter(|class| class.kind == ClassKind::Class)
            .flat_map(|class| {
                let ancestors = context.registry.ancestor_interfaces(&class.name);
                detect_interface_redeclarations(class, &ancestors)
            })
            .collect()
    }
}

/// One diagnostic per directly declared interface already in `ancestors`.
///
/// Unresolvable references never match. A class listing the same
/// interface twice gets a diagnostic for each occurrence.
pub fn detect_interface_redeclarations(
    class: &ClassDeclaration,
    ancestors: &AncestorInterfaceSet,
) -> Vec<Diagnostic> {
    if ancestors.is_empty() {
        return Vec::new();
    }

    class
        .interfaces
        .iter()
        .filter_map(|reference| {
            let resolved = reference.resolved.as_ref()?;
            let (interface, introducer) = ancestors.get(resolved)?;
            Some(Diagnostic::new(
                InspectionKind::InterfaceRedeclaration,
                reference.span,
                redeclaration_message(interface, introducer),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, Span, TypeReference};
    use crate::resolver::ClassRegistry;
    use pretty_assertions::assert_eq;

    fn messages(registry: &ClassRegistry, class: &str) -> Vec<String> {
        let declaration = registry.get(&QualifiedName::new(class)).unwrap();
        let ancestors = registry.ancestor_interfaces(&declaration.name);
        detect_interface_redeclarations(declaration, &ancestors)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_interface_from_parent_class() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\Ns\\ParentInterface"),
            ClassDeclaration::class("\\Ns\\AbstractOne").implementing(&["\\Ns\\ParentInterface"]),
            ClassDeclaration::class("\\Ns\\ClassOne")
                .extending("\\Ns\\AbstractOne")
                .implementing(&["\\Ns\\ParentInterface"]),
        ]);

        assert_eq!(
            messages(&registry, "\\Ns\\ClassOne"),
            vec!["'\\Ns\\ParentInterface' is already announced in '\\Ns\\AbstractOne'."]
        );
    }

    #[test]
    fn test_interface_from_extended_interface_reports_nearest_introducer() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\Base"),
            ClassDeclaration::interface("\\Child").implementing(&["\\Base"]),
            ClassDeclaration::class("\\Parent").implementing(&["\\Child"]),
            ClassDeclaration::class("\\Leaf")
                .extending("\\Parent")
                .implementing(&["\\Base", "\\Child"]),
        ]);

        assert_eq!(
            messages(&registry, "\\Leaf"),
            vec![
                "'\\Base' is already announced in '\\Child'.",
                "'\\Child' is already announced in '\\Parent'.",
            ]
        );
    }

    #[test]
    fn test_aliased_reference_matches_resolved_name() {
        let mut class =
            ClassDeclaration::class("\\Holder\\RegularClass").extending("\\Holder\\AbstractClass");
        class.interfaces.push(TypeReference::new(
            "ForeachSupport",
            Some(QualifiedName::new("\\Traversable")),
            Span::default(),
        ));
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\Holder\\AbstractClass").implementing(&["\\Traversable"]),
            class.clone(),
        ]);

        let ancestors = registry.ancestor_interfaces(&class.name);
        let found = detect_interface_redeclarations(&class, &ancestors);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(
            found[0].message,
            "'\\Traversable' is already announced in '\\Holder\\AbstractClass'."
        );
    }

    #[test]
    fn test_unresolved_and_unknown_references_are_skipped() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\A").implementing(&["\\I"]),
        ]);
        let mut class = ClassDeclaration::class("\\B").extending("\\A");
        class.interfaces.push(TypeReference::new("self", None, Span::default()));
        class.interfaces.push(TypeReference::qualified("\\Unrelated", Span::default()));

        let ancestors = registry.ancestor_interfaces(&QualifiedName::new("\\A"));
        assert!(detect_interface_redeclarations(&class, &ancestors).is_empty());
    }

    #[test]
    fn test_class_without_parent_produces_nothing() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\I"),
            ClassDeclaration::class("\\Solo").implementing(&["\\I", "\\I"]),
        ]);
        assert!(messages(&registry, "\\Solo").is_empty());
    }

    #[test]
    fn test_repeated_direct_declaration_flagged_each_time() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::class("\\P").implementing(&["\\I"]),
            ClassDeclaration::class("\\C").extending("\\P").implementing(&["\\I", "\\i"]),
        ]);
        assert_eq!(messages(&registry, "\\C").len(), 2);
    }

    #[test]
    fn test_interfaces_are_not_inspected() {
        let registry = ClassRegistry::from_declarations([
            ClassDeclaration::interface("\\I"),
            ClassDeclaration::interface("\\J").implementing(&["\\I"]),
        ]);
        let file = ParsedFile {
            classes: vec![ClassDeclaration::interface("\\K").implementing(&["\\I", "\\J"])],
            ..ParsedFile::default()
        };
        let handles = crate::inspections::HandleTypes::default();
        let context = InspectionContext {
            registry: &registry,
            handles: &handles,
        };
        assert!(InterfaceRedeclarationInspection.inspect(&file, &context).is_empty());
    }
}

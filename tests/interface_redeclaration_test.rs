use indoc::indoc;
use phpinspect::config::PhpInspectConfig;
use phpinspect::{analyze_source, FileReport, InspectionKind, Severity};
use pretty_assertions::assert_eq;

fn analyze(source: &str) -> FileReport {
    analyze_source("test.php", source, &PhpInspectConfig::default()).unwrap()
}

fn messages(report: &FileReport) -> Vec<&str> {
    report
        .diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn test_grandparent_interface_names_nearest_introducer() {
    let report = analyze(indoc! {r#"
        <?php
        namespace App;
        interface Countable {}
        class Base implements Countable {}
        class Middle extends Base {}
        class Leaf extends Middle implements Countable {}
    "#});

    assert_eq!(
        messages(&report),
        vec!["'\\App\\Countable' is already announced in '\\App\\Base'."]
    );
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    assert_eq!(report.diagnostics[0].kind, InspectionKind::InterfaceRedeclaration);
}

#[test]
fn test_interface_inherited_through_parent_interface_names_that_interface() {
    let report = analyze(indoc! {r#"
        <?php
        interface Root {}
        interface Child extends Root {}
        class Base implements Child {}
        class Derived extends Base implements Root {}
    "#});

    assert_eq!(messages(&report), vec!["'\\Root' is already announced in '\\Child'."]);
}

#[test]
fn test_new_interfaces_and_unknown_parents_are_not_flagged() {
    let report = analyze(indoc! {r#"
        <?php
        interface A {}
        interface B {}
        class Base implements A {}
        class Derived extends Base implements B {}
        class Orphan extends \Vendor\Missing implements A {}
        class Alone implements A, B {}
    "#});

    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_alias_and_qualified_spellings_are_equivalent() {
    let report = analyze(indoc! {r#"
        <?php
        namespace Lib { interface Stream {} }

        namespace App {
            use Lib\Stream as Pipe;
            use Lib\{Stream as Flow};

            abstract class Base implements \Lib\Stream {}
            class ByAlias extends Base implements Pipe {}
            class ByGroup extends Base implements Flow {}
            class ByFull extends Base implements \LIB\stream {}
        }
    "#});

    assert_eq!(report.diagnostics.len(), 3);
    assert!(messages(&report)
        .iter()
        .all(|m| *m == "'\\Lib\\Stream' is already announced in '\\App\\Base'."));
}

#[test]
fn test_hierarchy_cycle_terminates() {
    let report = analyze(indoc! {r#"
        <?php
        interface I {}
        class A extends B implements I {}
        class B extends A implements I {}
    "#});

    // Each class sees the other as an ancestor announcing I.
    assert_eq!(report.diagnostics.len(), 2);
}

#[test]
fn test_interfaces_declared_by_interfaces_are_ignored() {
    let report = analyze(indoc! {r#"
        <?php
        interface Root {}
        interface Child extends Root {}
        interface Grandchild extends Child, Root {}
    "#});

    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_anonymous_class_redeclaring_parent_interface() {
    let source = indoc! {r#"
        <?php
        interface I {}
        abstract class B implements I {}
        $o = new class extends B implements I {};
        $p = new class implements I {};
    "#};
    let report = analyze(source);

    assert_eq!(messages(&report), vec!["'\\I' is already announced in '\\B'."]);
    assert_eq!(report.diagnostics[0].span.text(source), Some("I"));
    assert_eq!(report.diagnostics[0].span.line, 4);
}

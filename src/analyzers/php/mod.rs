//! PHP front-end: parses with tree-sitter and lowers the tree into the
//! plain-data model in [`crate::core::ast`].
//!
//! Lowering resolves every class-like name against the namespace and import
//! aliases in effect at the reference, and infers receiver types for method
//! calls from parameter type hints and `new` assignments. Nodes that are
//! malformed (tree-sitter `ERROR` nodes, declarations without a name) are
//! skipped; the rest of the file is still lowered.

mod declarations;
mod statements;
mod types;

use crate::core::{Block, ClassDeclaration, Error, FunctionScope, Parameter, ParsedFile, Result, Span};
use crate::resolver::NameContext;
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// File extensions treated as PHP sources.
pub const PHP_EXTENSIONS: &[&str] = &["php", "phtml", "inc"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PhpAnalyzer;

impl PhpAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|e| Error::Parser(format!("Failed to set PHP language: {e}")))?;
        Ok(parser)
    }

    pub fn parse_tree(&self, source: &str, path: &Path) -> Result<Tree> {
        Self::parser()?
            .parse(source, None)
            .ok_or_else(|| Error::parse(path, 1, 0, "parser produced no syntax tree"))
    }

    /// Parse and lower one PHP file.
    pub fn parse(&self, source: &str, path: impl Into<PathBuf>) -> Result<ParsedFile> {
        let path = path.into();
        let tree = self.parse_tree(source, &path)?;
        if tree.root_node().has_error() {
            debug!(path = %path.display(), "syntax errors present, lowering recoverable nodes only");
        }
        Ok(lower(&tree, source, path))
    }
}

pub fn is_php_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHP_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

pub(crate) fn lower(tree: &Tree, source: &str, path: PathBuf) -> ParsedFile {
    let root = tree.root_node();
    let mut lowerer = Lowerer::new(source);
    let mut context = NameContext::global();
    let mut top_level = Vec::new();

    lowerer.lower_top_level(root, &mut context, &mut top_level);
    let nonlocal = lowerer.nonlocal.pop().unwrap_or_default();
    lowerer.push_scope(None, Vec::new(), nonlocal, Block::new(top_level), Span::from_node(root));

    ParsedFile {
        path,
        classes: lowerer.classes,
        scopes: lowerer.scopes,
    }
}

/// Accumulates declarations and function scopes while walking one tree.
pub(crate) struct Lowerer<'s> {
    source: &'s str,
    classes: Vec<ClassDeclaration>,
    scopes: Vec<FunctionScope>,
    /// `global`/`static` names of each function being lowered, innermost last.
    nonlocal: Vec<Vec<String>>,
    anonymous_classes: usize,
}

impl<'s> Lowerer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            classes: Vec::new(),
            scopes: Vec::new(),
            nonlocal: vec![Vec::new()],
            anonymous_classes: 0,
        }
    }

    fn text(&self, node: Node) -> &'s str {
        node_text(node, self.source)
    }

    fn push_scope(
        &mut self,
        name: Option<String>,
        parameters: Vec<Parameter>,
        nonlocal_variables: Vec<String>,
        body: Block,
        span: Span,
    ) {
        let mut scope = FunctionScope {
            name,
            parameters,
            nonlocal_variables,
            body,
            span,
        };
        types::annotate_receivers(&mut scope);
        self.scopes.push(scope);
    }
}

/// Helper to get text from a node
pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

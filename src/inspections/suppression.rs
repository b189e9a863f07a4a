//! Suppression comments.
//!
//! ```php
//! $db->query('TRUNCATE t'); // phpinspect:ignore[db-call-pattern] -- intentional
//!
//! # phpinspect:ignore-next-line
//! class Legacy extends Base implements Countable {}
//!
//! /* phpinspect:ignore-start[interface-redeclaration] */
//! ...
//! /* phpinspect:ignore-end */
//! ```
//!
//! An omitted kind list, or `*`, covers every inspection.

use crate::core::{Diagnostic, InspectionKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// `//`, `#`, `/*` and the leading `*` of a doc-block line.
const COMMENT_PREFIX: &str = r"(?://|#|/\*+|\*)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionScope {
    All,
    /// Only the listed inspections. Unknown ids are dropped, so a list of
    /// nothing but unknown ids suppresses nothing.
    Kinds(Vec<InspectionKind>),
}

impl SuppressionScope {
    fn covers(&self, kind: InspectionKind) -> bool {
        match self {
            SuppressionScope::All => true,
            SuppressionScope::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuppressionBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub scope: SuppressionScope,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SuppressionRule {
    pub scope: SuppressionScope,
    pub reason: Option<String>,
    pub applies_to_next_line: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SuppressionContext {
    pub blocks: Vec<SuppressionBlock>,
    pub line_suppressions: HashMap<usize, SuppressionRule>,
    /// Lines of `ignore-start` markers never closed.
    pub unclosed_blocks: Vec<usize>,
}

impl SuppressionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self, line: usize, kind: InspectionKind) -> bool {
        self.is_in_suppression_block(line, kind)
            || self.has_line_suppression(line, kind)
            || self.has_next_line_suppression(line, kind)
    }

    pub fn is_diagnostic_suppressed(&self, diagnostic: &Diagnostic) -> bool {
        self.is_suppressed(diagnostic.span.line, diagnostic.kind)
    }

    fn is_in_suppression_block(&self, line: usize, kind: InspectionKind) -> bool {
        self.blocks
            .iter()
            .filter(|block| line >= block.start_line && line <= block.end_line)
            .any(|block| block.scope.covers(kind))
    }

    fn has_line_suppression(&self, line: usize, kind: InspectionKind) -> bool {
        self.line_suppressions
            .get(&line)
            .is_some_and(|rule| !rule.applies_to_next_line && rule.scope.covers(kind))
    }

    fn has_next_line_suppression(&self, line: usize, kind: InspectionKind) -> bool {
        line.checked_sub(1)
            .and_then(|previous| self.line_suppressions.get(&previous))
            .is_some_and(|rule| rule.applies_to_next_line && rule.scope.covers(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.line_suppressions.is_empty() && self.unclosed_blocks.is_empty()
    }
}

struct SuppressionPatterns {
    block_start: Regex,
    block_end: Regex,
    next_line: Regex,
    line: Regex,
}

static PATTERNS: Lazy<SuppressionPatterns> = Lazy::new(|| SuppressionPatterns {
    block_start: Regex::new(&format!(
        r"(?m)^\s*{COMMENT_PREFIX}\s*phpinspect:ignore-start(?:\s*\[([\w\-,*\s]+)\])?(?:\s*--\s*(.*?))?\s*(?:\*/)?\s*$"
    ))
    .expect("valid block start pattern"),
    block_end: Regex::new(&format!(
        r"(?m)^\s*{COMMENT_PREFIX}\s*phpinspect:ignore-end\s*(?:\*/)?\s*$"
    ))
    .expect("valid block end pattern"),
    next_line: Regex::new(&format!(
        r"(?m)^\s*{COMMENT_PREFIX}\s*phpinspect:ignore-next-line(?:\s*\[([\w\-,*\s]+)\])?(?:\s*--\s*(.*?))?\s*(?:\*/)?\s*$"
    ))
    .expect("valid next-line pattern"),
    line: Regex::new(&format!(
        r"{COMMENT_PREFIX}\s*phpinspect:ignore(?:\s*\[([\w\-,*\s]+)\])?(?:\s*--\s*(.*?))?\s*(?:\*/)?\s*$"
    ))
    .expect("valid line pattern"),
});

enum LineParseResult {
    BlockStart(usize, SuppressionScope, Option<String>),
    BlockEnd(usize),
    NextLineSuppression(usize, SuppressionScope, Option<String>),
    LineSuppression(usize, SuppressionScope, Option<String>),
    None,
}

fn parse_line(line: &str, line_number: usize, patterns: &SuppressionPatterns) -> LineParseResult {
    if let Some(captures) = patterns.block_start.captures(line) {
        let (scope, reason) = scope_and_reason(&captures);
        return LineParseResult::BlockStart(line_number, scope, reason);
    }
    if patterns.block_end.is_match(line) {
        return LineParseResult::BlockEnd(line_number);
    }
    if let Some(captures) = patterns.next_line.captures(line) {
        let (scope, reason) = scope_and_reason(&captures);
        return LineParseResult::NextLineSuppression(line_number, scope, reason);
    }
    if let Some(captures) = patterns.line.captures(line) {
        let (scope, reason) = scope_and_reason(&captures);
        return LineParseResult::LineSuppression(line_number, scope, reason);
    }
    LineParseResult::None
}

fn scope_and_reason(captures: &regex::Captures) -> (SuppressionScope, Option<String>) {
    let scope = parse_scope(captures.get(1).map(|m| m.as_str()));
    let reason = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|reason| !reason.is_empty());
    (scope, reason)
}

fn parse_scope(kinds: Option<&str>) -> SuppressionScope {
    let Some(kinds) = kinds else {
        return SuppressionScope::All;
    };

    let ids: Vec<&str> = kinds
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() || ids.contains(&"*") {
        return SuppressionScope::All;
    }

    SuppressionScope::Kinds(
        ids.into_iter()
            .filter_map(|id| {
                let kind = InspectionKind::from_id(id);
                if kind.is_none() {
                    debug!(id, "unknown inspection id in suppression comment");
                }
                kind
            })
            .collect(),
    )
}

fn process_parsed_line(
    result: LineParseResult,
    context: &mut SuppressionContext,
    open_blocks: &mut Vec<(usize, SuppressionScope, Option<String>)>,
) {
    use LineParseResult::*;

    match result {
        BlockStart(line, scope, reason) => open_blocks.push((line, scope, reason)),
        BlockEnd(end_line) => {
            if let Some((start_line, scope, reason)) = open_blocks.pop() {
                context.blocks.push(SuppressionBlock {
                    start_line,
                    end_line,
                    scope,
                    reason,
                });
            }
        }
        NextLineSuppression(line, scope, reason) => {
            add_line_suppression(context, line, scope, reason, true)
        }
        LineSuppression(line, scope, reason) => {
            add_line_suppression(context, line, scope, reason, false)
        }
        None => {}
    }
}

fn add_line_suppression(
    context: &mut SuppressionContext,
    line: usize,
    scope: SuppressionScope,
    reason: Option<String>,
    applies_to_next_line: bool,
) {
    context.line_suppressions.insert(
        line,
        SuppressionRule {
            scope,
            reason,
            applies_to_next_line,
        },
    );
}

pub fn parse_suppression_comments(content: &str) -> SuppressionContext {
    let mut context = SuppressionContext::new();
    if !content.contains("phpinspect:") {
        return context;
    }

    let mut open_blocks = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let result = parse_line(line, index + 1, &PATTERNS);
        process_parsed_line(result, &mut context, &mut open_blocks);
    }

    context.unclosed_blocks = open_blocks.into_iter().map(|(line, _, _)| line).collect();
    context
}

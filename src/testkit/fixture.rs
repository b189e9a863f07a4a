//! Inline-marker fixtures.
//!
//! A fixture is a PHP file where each expected diagnostic wraps the flagged
//! text in a marker:
//!
//! ```text
//! <weak_warning descr="'PDO::exec(...)' should be used instead (consumes less resources).">$x->query('...')</weak_warning>;
//! ```
//!
//! Parsing strips the markers, recording each one as an expected diagnostic
//! whose span refers to the clean source. Messages are HTML-entity decoded.

use crate::config::PhpInspectConfig;
use crate::core::{Diagnostic, Error, Result, Severity};
use crate::pipeline::analyze_source;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)(warning|weak_warning)(?:\s+descr="([^"]*)")?\s*>"#)
        .expect("Invalid marker regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedDiagnostic {
    pub severity: Severity,
    /// Byte offsets in the clean source.
    pub start: usize,
    pub end: usize,
    /// `None` when the marker has no `descr`; any message then matches.
    pub message: Option<String>,
}

impl ExpectedDiagnostic {
    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        self.severity == diagnostic.severity
            && self.start == diagnostic.span.start
            && self.end == diagnostic.span.end
            && self
                .message
                .as_ref()
                .is_none_or(|message| *message == diagnostic.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub source: String,
    pub expected: Vec<ExpectedDiagnostic>,
}

struct OpenMarker {
    severity: Severity,
    start: usize,
    message: Option<String>,
}

impl Fixture {
    pub fn parse(text: &str) -> Result<Self> {
        let mut source = String::with_capacity(text.len());
        let mut expected = Vec::new();
        let mut open: Vec<OpenMarker> = Vec::new();
        let mut cursor = 0;

        for captures in MARKER.captures_iter(text) {
            let Some(whole) = captures.get(0) else { continue };
            source.push_str(&text[cursor..whole.start()]);
            cursor = whole.end();

            let tag = &captures[2];
            let severity = Severity::from_marker_tag(tag)
                .ok_or_else(|| Error::Fixture(format!("unknown marker <{tag}>")))?;

            if captures[1].is_empty() {
                open.push(OpenMarker {
                    severity,
                    start: source.len(),
                    message: captures
                        .get(3)
                        .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned()),
                });
                continue;
            }

            let marker = open.pop().ok_or_else(|| {
                Error::Fixture(format!("</{tag}> at byte {} closes nothing", whole.start()))
            })?;
            if marker.severity != severity {
                return Err(Error::Fixture(format!(
                    "</{tag}> at byte {} closes <{}>",
                    whole.start(),
                    marker.severity.marker_tag()
                )));
            }
            expected.push(ExpectedDiagnostic {
                severity,
                start: marker.start,
                end: source.len(),
                message: marker.message,
            });
        }
        source.push_str(&text[cursor..]);

        if let Some(marker) = open.last() {
            return Err(Error::Fixture(format!(
                "<{}> opened at byte {} is never closed",
                marker.severity.marker_tag(),
                marker.start
            )));
        }

        expected.sort_by_key(|e| (e.start, e.end));
        Ok(Self { source, expected })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixtureOutcome {
    /// Markers with no matching diagnostic.
    pub missing: Vec<ExpectedDiagnostic>,
    /// Diagnostics with no matching marker.
    pub unexpected: Vec<Diagnostic>,
}

impl FixtureOutcome {
    pub fn is_success(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Analyze the clean fixture source and compare against its markers.
pub fn verify_fixture(
    text: &str,
    path: &Path,
    config: &PhpInspectConfig,
) -> Result<FixtureOutcome> {
    let fixture = Fixture::parse(text)?;
    let report = analyze_source(path, &fixture.source, config)?;

    let mut unexpected = report.diagnostics;
    let mut missing = Vec::new();
    for expected in fixture.expected {
        match unexpected.iter().position(|d| expected.matches(d)) {
            Some(index) => {
                unexpected.remove(index);
            }
            None => missing.push(expected),
        }
    }

    Ok(FixtureOutcome {
        missing,
        unexpected,
    })
}

/// Render `source` with a marker around each diagnostic, the inverse of
/// [`Fixture::parse`].
pub fn annotate(source: &str, diagnostics: &[Diagnostic]) -> String {
    // (offset, closes-before-opens, nesting order, marker text)
    let mut events: Vec<(usize, u8, (usize, usize), String)> =
        Vec::with_capacity(diagnostics.len() * 2);
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        let tag = diagnostic.severity.marker_tag();
        let descr = html_escape::encode_double_quoted_attribute(&diagnostic.message);
        // Outer markers open first and close last.
        events.push((
            diagnostic.span.start,
            1,
            (usize::MAX - diagnostic.span.end, index),
            format!(r#"<{tag} descr="{descr}">"#),
        ));
        events.push((
            diagnostic.span.end,
            0,
            (usize::MAX - diagnostic.span.start, usize::MAX - index),
            format!("</{tag}>"),
        ));
    }
    events.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut annotated = String::with_capacity(source.len() + events.len() * 32);
    let mut cursor = 0;
    for (offset, _, _, text) in events {
        let offset = offset.min(source.len());
        if offset > cursor {
            annotated.push_str(&source[cursor..offset]);
            cursor = offset;
        }
        annotated.push_str(&text);
    }
    annotated.push_str(&source[cursor..]);
    annotated
}

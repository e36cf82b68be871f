//! Source-located diagnostics for malformed Boardfiles.
//!
//! `serde_saphyr` reports failures as a message plus a one-based line and
//! column. [`map_yaml_error`] turns that into a `miette` report over the
//! Boardfile text: a label on the offending character and, where one
//! applies, a hint phrased in terms of the Boardfile schema.

// miette/thiserror derives trip `unused_assignments` on some toolchains only.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

/// Error raised when a Boardfile cannot be parsed.
#[derive(Debug, Error, Diagnostic)]
pub enum BoardfileError {
    /// The YAML is malformed or does not match the Boardfile schema.
    #[error("Boardfile parse error")]
    #[diagnostic(code(boardsmith::boardfile::parse))]
    Parse {
        /// Location-aware diagnostic for the failure.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{summary}")]
#[diagnostic(code(boardsmith::yaml::parse))]
struct SyntaxReport {
    #[source_code]
    text: NamedSource<String>,
    #[label("here")]
    at: Option<SourceSpan>,
    #[help]
    hint: Option<String>,
    #[source]
    cause: YamlError,
    summary: String,
}

/// Message fragments paired with the advice shown for them.
const HINTS: &[(&str, &str)] = &[
    (
        "unknown field",
        "Boardfile keys are boardsmith_version, units, links and board; \
         units take name, sources, include_dirs; links take consumer, dependency.",
    ),
    (
        "missing field",
        "Every Boardfile needs boardsmith_version and a board with an id.",
    ),
    (
        "did not find expected '-'",
        "Start each unit or link entry with '-' at a consistent indentation.",
    ),
    (
        "mapping values are not allowed",
        "Quote values that contain ':' such as compiler flags.",
    ),
    (
        "invalid type",
        "sources and include_dirs accept a path or a list; features accept true/false or a list.",
    ),
];

const TAB_HINT: &str = "Indent with spaces; YAML does not allow tabs.";

/// One line of `text` without its `\n` or `\r\n` terminator, with its start
/// offset.
fn nth_line(text: &str, index: usize) -> Option<(usize, &str)> {
    let mut start = 0;
    for (n, raw) in text.split_inclusive('\n').enumerate() {
        if n == index {
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            return Some((start, line.strip_suffix('\r').unwrap_or(line)));
        }
        start += raw.len();
    }
    None
}

fn to_index(one_based: u64) -> usize {
    usize::try_from(one_based.saturating_sub(1)).unwrap_or(usize::MAX)
}

/// Span of the character at one-based `line`/`column`.
///
/// Columns count characters, not bytes. A column past the end of its line
/// points at the last character of that line, never at a line terminator.
fn char_span(text: &str, line: u64, column: u64) -> SourceSpan {
    let Some((start, content)) = nth_line(text, to_index(line)) else {
        return SourceSpan::new(text.len().into(), 0);
    };
    let hit = content
        .char_indices()
        .nth(to_index(column))
        .or_else(|| content.char_indices().last());
    match hit {
        Some((offset, ch)) => SourceSpan::new((start + offset).into(), ch.len_utf8()),
        None => SourceSpan::new(start.into(), 0),
    }
}

fn indented_with_tab(text: &str, line: u64) -> bool {
    nth_line(text, to_index(line)).is_some_and(|(_, content)| {
        content
            .chars()
            .take_while(|c| c.is_whitespace())
            .any(|c| c == '\t')
    })
}

fn hint(message: &str, text: &str, loc: Option<Location>) -> Option<String> {
    if loc.is_some_and(|l| indented_with_tab(text, l.line())) {
        return Some(TAB_HINT.to_owned());
    }
    let lower = message.to_lowercase();
    HINTS
        .iter()
        .find_map(|(needle, advice)| lower.contains(needle).then(|| (*advice).to_owned()))
}

/// Wrap a YAML error with its source text, location and a hint.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &str,
    name: &str,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let message = err.to_string();
    let hint = hint(&message, src, loc);
    let (line, column) = loc.map_or((1, 1), |l| (l.line(), l.column()));
    let mut summary = format!("YAML parse error at line {line}, column {column}: {message}");
    if let Some(advice) = &hint {
        summary.push_str("\nhelp: ");
        summary.push_str(advice);
    }
    Box::new(SyntaxReport {
        text: NamedSource::new(name, src.to_owned()),
        at: loc.map(|l| char_span(src, l.line(), l.column())),
        hint,
        cause: err,
        summary,
    })
}

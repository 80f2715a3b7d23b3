// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Line level scanning of INF text.
//!
//! INF files are line oriented. A physical line ending in `\` continues onto
//! the next one, `;` starts a comment unless it is inside a double quoted
//! string, and `""` inside a quoted string is an escaped quote. The helpers
//! here only split text; building sections out of the pieces is done by
//! [`Document::parse`](crate::Document::parse).

use thiserror::Error;
use tracing::trace;

/// Errors that could result from parsing INF text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An entry appeared before the first section header
    #[error("line {line}: entry is outside of any section: {text}")]
    EntryOutsideSection {
        /// 1-based line number
        line: usize,
        /// Offending text
        text: String,
    },

    /// A `[` was not followed by a closing `]`
    #[error("line {line}: section header is missing a closing `]`")]
    UnterminatedSectionHeader {
        /// 1-based line number
        line: usize,
    },

    /// `[]`
    #[error("line {line}: section name is empty")]
    EmptySectionName {
        /// 1-based line number
        line: usize,
    },

    /// Text that is not a comment after the closing `]` of a section header
    #[error("line {line}: unexpected text after section header: {text}")]
    TrailingHeaderText {
        /// 1-based line number
        line: usize,
        /// Offending text
        text: String,
    },

    /// A double quoted string was not closed before the end of the line
    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote {
        /// 1-based line number
        line: usize,
    },

    /// The last line of the file ends with a `\` continuation
    #[error("line {line}: line continuation at end of input")]
    DanglingContinuation {
        /// 1-based line number
        line: usize,
    },
}

/// One logical line: the physical lines joined by `\` continuations, with the
/// comment split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
    /// 1-based number of the first physical line
    pub line: usize,
    /// Content with the comment removed and surrounding whitespace trimmed
    pub content: String,
    /// Comment text following `;`, if any
    pub comment: Option<String>,
}

/// Splits `text` into logical lines.
pub(crate) fn logical_lines(text: &str) -> Result<Vec<LogicalLine>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;
    let mut last_line = 0;

    for (index, physical) in text.lines().enumerate() {
        let line = index + 1;
        last_line = line;

        let (content, comment) =
            split_comment(physical).ok_or(ParseError::UnterminatedQuote { line })?;
        let content = content.trim();
        let (content, continues) = content
            .strip_suffix('\\')
            .map_or((content, false), |stripped| (stripped.trim_end(), true));

        let logical = match pending.take() {
            Some(mut previous) => {
                if !content.is_empty() {
                    if !previous.content.is_empty() {
                        previous.content.push(' ');
                    }
                    previous.content.push_str(content);
                }
                previous.comment = join_comments(previous.comment, comment);
                previous
            }
            None => LogicalLine {
                line,
                content: content.to_string(),
                comment: comment.map(str::to_string),
            },
        };

        if continues {
            trace!("line {line} continues onto the next line");
            pending = Some(logical);
        } else {
            lines.push(logical);
        }
    }

    if pending.is_some() {
        return Err(ParseError::DanglingContinuation { line: last_line });
    }

    Ok(lines)
}

fn join_comments(first: Option<String>, second: Option<&str>) -> Option<String> {
    match (first, second) {
        (Some(mut first), Some(second)) => {
            first.push(' ');
            first.push_str(second.trim_start());
            Some(first)
        }
        (Some(first), None) => Some(first),
        (None, second) => second.map(str::to_string),
    }
}

/// Splits a physical line at the first `;` that is not inside quotes.
///
/// Returns `None` when a quoted string is left open.
fn split_comment(line: &str) -> Option<(&str, Option<&str>)> {
    let mut in_quotes = false;
    for (index, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                return Some((&line[..index], Some(line[index + 1..].trim_end())));
            }
            _ => {}
        }
    }
    if in_quotes { None } else { Some((line, None)) }
}

/// Byte offset of the first `needle` that is not inside quotes.
pub(crate) fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (index, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == needle && !in_quotes {
            return Some(index);
        }
    }
    None
}

/// Splits a value list at every `,` that is not inside quotes. Each value is
/// trimmed and empty values are kept.
pub(crate) fn split_values(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = text;
    while let Some(index) = find_unquoted(rest, ',') {
        values.push(rest[..index].trim().to_string());
        rest = &rest[index + 1..];
    }
    values.push(rest.trim().to_string());
    values
}

/// Removes surrounding double quotes and unescapes `""`. Unquoted text is
/// returned unchanged.
#[must_use]
pub fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |inner| inner.replace("\"\"", "\""))
}

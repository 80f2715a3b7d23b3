// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! `%Token%` substitution through the `[Strings]` table.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::{Document, parse::unquote};

const STRINGS_SECTION: &str = "Strings";

/// Errors that could result from expanding `%Token%` references
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StringsError {
    /// The token has no entry in the string table
    #[error("string token %{token}% is not defined in [Strings]")]
    UndefinedToken {
        /// Token name without the surrounding `%`
        token: String,
    },

    /// A `%` was opened but never closed
    #[error("unterminated string token in: {text}")]
    UnterminatedToken {
        /// Text being expanded
        text: String,
    },
}

/// The string table of a [`Document`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    // keys are stored lowercased
    strings: HashMap<String, String>,
}

impl StringTable {
    /// Builds the table from `[Strings]`, then applies the first localized
    /// `[Strings.<locale>]` section on top of it.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let mut table = Self::default();
        if let Some(section) = document.section(STRINGS_SECTION) {
            table.extend(section.entries());
        }
        if let Some(localized) = document.sections().find(|section| is_localized(section.name())) {
            trace!("Applying localized string table [{}]", localized.name());
            table.extend(localized.entries());
        }
        table
    }

    fn extend<'a>(&mut self, entries: impl Iterator<Item = &'a crate::Entry>) {
        for entry in entries {
            if let Some(key) = entry.key() {
                let value = entry.values().join(",");
                self.strings.insert(key.to_ascii_lowercase(), unquote(&value));
            }
        }
    }

    /// Looks up a token, ignoring ASCII case
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&str> {
        self.strings
            .get(&token.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Number of defined strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` when no strings are defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Replaces every `%Token%` in `text` with its string.
    ///
    /// `%%` yields a literal `%`, and numeric tokens such as `%12%` are
    /// directory ids that are left for the installer to resolve. Surrounding
    /// quotes on `text` are removed.
    ///
    /// # Errors
    ///
    /// Returns [`StringsError::UndefinedToken`] for a token missing from the
    /// table and [`StringsError::UnterminatedToken`] for an unclosed `%`.
    pub fn expand(&self, text: &str) -> Result<String, StringsError> {
        let mut expanded = String::with_capacity(text.len());
        for piece in pieces(&unquote(text))? {
            match piece {
                Piece::Literal(literal) => expanded.push_str(literal),
                Piece::Percent => expanded.push('%'),
                Piece::Token(token) if is_dirid(token) => {
                    expanded.push('%');
                    expanded.push_str(token);
                    expanded.push('%');
                }
                Piece::Token(token) => {
                    let value = self.get(token).ok_or_else(|| StringsError::UndefinedToken {
                        token: token.to_string(),
                    })?;
                    expanded.push_str(value);
                }
            }
        }
        Ok(expanded)
    }
}

/// Names of the string tokens referenced by `text`, skipping directory ids.
///
/// # Errors
///
/// Returns [`StringsError::UnterminatedToken`] for an unclosed `%`.
pub fn tokens(text: &str) -> Result<Vec<&str>, StringsError> {
    Ok(pieces(text)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Token(token) if !is_dirid(token) => Some(token),
            _ => None,
        })
        .collect())
}

fn is_localized(name: &str) -> bool {
    name.get(..STRINGS_SECTION.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(STRINGS_SECTION))
        && name[STRINGS_SECTION.len()..]
            .strip_prefix('.')
            .is_some_and(|locale| !locale.is_empty())
}

fn is_dirid(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

enum Piece<'a> {
    Literal(&'a str),
    Percent,
    Token(&'a str),
}

fn pieces(text: &str) -> Result<Vec<Piece<'_>>, StringsError> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('%') {
        if start > 0 {
            pieces.push(Piece::Literal(&rest[..start]));
        }
        let after = &rest[start + 1..];
        let end = after.find('%').ok_or_else(|| StringsError::UnterminatedToken {
            text: text.to_string(),
        })?;
        if end == 0 {
            pieces.push(Piece::Percent);
        } else {
            pieces.push(Piece::Token(&after[..end]));
        }
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn table(text: &str) -> StringTable {
        StringTable::from_document(&Document::parse(text).unwrap())
    }

    #[test]
    fn expands_tokens_case_insensitively() {
        let strings = table("[Strings]\nManufacturerName = \"Contoso\"\nectest.SVCDESC = \"ectest Service\"\n");
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.expand("%manufacturername%").unwrap(), "Contoso");
        assert_eq!(
            strings.expand("\"%ECTEST.SvcDesc% (100%%)\"").unwrap(),
            "ectest Service (100%)"
        );
    }

    #[test]
    fn directory_ids_are_left_alone() {
        let strings = table("[Strings]\n");
        assert_eq!(strings.expand("%12%\\ectest.sys").unwrap(), "%12%\\ectest.sys");
    }

    #[test]
    fn localized_strings_override_base_strings() {
        let strings =
            table("[Strings]\nDiskName = \"Disk\"\nOther = x\n[Strings.0409]\nDiskName = \"Disque\"\n");
        assert_eq!(strings.get("DiskName"), Some("Disque"));
        assert_eq!(strings.get("Other"), Some("x"));
    }

    #[test]
    fn undefined_and_unterminated_tokens_are_errors() {
        let strings = table("[Strings]\n");
        assert_eq!(
            strings.expand("%Missing%"),
            Err(StringsError::UndefinedToken {
                token: "Missing".to_string()
            })
        );
        assert_eq!(
            strings.expand("50%"),
            Err(StringsError::UnterminatedToken {
                text: "50%".to_string()
            })
        );
    }

    #[test]
    fn tokens_skip_directory_ids_and_escapes() {
        assert_eq!(
            tokens("%ectest.DeviceDesc% %13% 100%% %Disk%").unwrap(),
            vec!["ectest.DeviceDesc", "Disk"]
        );
    }
}

// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! In-memory representation of an INF file.
//!
//! A [`Document`] keeps sections, entries and comments in the order they were
//! read so that it can be written back out with [`Display`](fmt::Display).
//! Whitespace around `=` and `,` is normalized on output; everything else
//! survives a parse/serialize round trip.

use std::{fmt, str::FromStr};

use tracing::{debug, trace};

use crate::parse::{self, ParseError};

/// A parsed INF file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    preamble: Vec<Line>,
    sections: Vec<Section>,
}

/// A `[Name]` section and the lines that follow it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    comment: Option<String>,
    lines: Vec<Line>,
}

/// One logical line of a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `key = values` or a bare value list
    Entry(Entry),
    /// A line holding only a comment. The text excludes the leading `;`.
    Comment(String),
    /// An empty line
    Blank,
}

/// A `key = v1, v2` line, or a bare `v1, v2` line when `key` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Option<String>,
    values: Vec<String>,
    comment: Option<String>,
}

impl Document {
    /// Parses INF text.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming the offending line when the text is not
    /// well formed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut document = Self::default();
        let mut current: Option<usize> = None;

        for logical in parse::logical_lines(text)? {
            if logical.content.starts_with('[') {
                let (name, trailing) = logical.content[1..]
                    .split_once(']')
                    .ok_or(ParseError::UnterminatedSectionHeader { line: logical.line })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ParseError::EmptySectionName { line: logical.line });
                }
                if !trailing.trim().is_empty() {
                    return Err(ParseError::TrailingHeaderText {
                        line: logical.line,
                        text: trailing.trim().to_string(),
                    });
                }

                current = Some(document.open_section(name, logical.comment));
                continue;
            }

            let line = if logical.content.is_empty() {
                logical.comment.map_or(Line::Blank, Line::Comment)
            } else {
                Line::Entry(Entry::from_text(&logical.content, logical.comment))
            };

            match current {
                Some(index) => document.sections[index].lines.push(line),
                None if matches!(line, Line::Entry(_)) => {
                    return Err(ParseError::EntryOutsideSection {
                        line: logical.line,
                        text: logical.content,
                    });
                }
                None => document.preamble.push(line),
            }
        }

        trim_trailing_blanks(&mut document.preamble);
        for section in &mut document.sections {
            trim_trailing_blanks(&mut section.lines);
        }

        debug!("Parsed INF with {} sections", document.sections.len());
        Ok(document)
    }

    /// Returns the index of the section called `name`, creating it when it
    /// does not exist yet. A repeated header's comment is kept as a comment
    /// line inside the merged section.
    fn open_section(&mut self, name: &str, comment: Option<String>) -> usize {
        if let Some(index) = self.position(name) {
            trace!("Merging repeated section [{name}]");
            if let Some(comment) = comment {
                self.sections[index].lines.push(Line::Comment(comment));
            }
            return index;
        }
        self.sections.push(Section {
            name: name.to_string(),
            comment,
            lines: Vec::new(),
        });
        self.sections.len() - 1
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.name.eq_ignore_ascii_case(name))
    }

    /// Lines that appear before the first section header
    #[must_use]
    pub fn preamble(&self) -> &[Line] {
        &self.preamble
    }

    /// All sections, in file order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Looks up a section by name, ignoring ASCII case
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.position(name).map(|index| &self.sections[index])
    }

    /// Returns `true` when a section called `name` exists
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// First entry named `key` in section `section`
    #[must_use]
    pub fn entry(&self, section: &str, key: &str) -> Option<&Entry> {
        self.section(section)?.find(key)
    }

    /// First value of the first entry named `key` in section `section`
    #[must_use]
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.entry(section, key)?.value(0)
    }

    /// Sets `key` in `section` to a single `value`. See
    /// [`Document::set_values`].
    pub fn set_value(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.set_values(section, key, [value]);
    }

    /// Sets `key` in `section` to `values`.
    ///
    /// The first existing entry is replaced in place, keeping its trailing
    /// comment. Otherwise a new entry is appended, creating the section at the
    /// end of the document if needed.
    pub fn set_values<V: Into<String>>(
        &mut self,
        section: &str,
        key: &str,
        values: impl IntoIterator<Item = V>,
    ) {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let index = self.open_section(section, None);
        let section = &mut self.sections[index];
        if let Some(entry) = section.find_mut(key) {
            entry.values = values;
        } else {
            section.push(Entry::new(Some(key), values));
        }
    }

    /// Returns `true` when `needle` occurs in a section name, key or value.
    /// Comments are not searched.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.sections.iter().any(|section| {
            section.name.contains(needle)
                || section.entries().any(|entry| {
                    entry.key.as_deref().is_some_and(|key| key.contains(needle))
                        || entry.values.iter().any(|value| value.contains(needle))
                })
        })
    }

    /// Returns a copy of the document with `f` applied to every section name,
    /// key and value. Comments are left untouched.
    #[must_use]
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        let map_line = |line: &Line| match line {
            Line::Entry(entry) => Line::Entry(Entry {
                key: entry.key.as_deref().map(&f),
                values: entry.values.iter().map(|value| f(value.as_str())).collect(),
                comment: entry.comment.clone(),
            }),
            other => other.clone(),
        };

        let mut mapped = Self {
            preamble: self.preamble.clone(),
            sections: Vec::with_capacity(self.sections.len()),
        };
        for section in &self.sections {
            let index = mapped.open_section(&f(&section.name), section.comment.clone());
            mapped.sections[index]
                .lines
                .extend(section.lines.iter().map(&map_line));
        }
        mapped
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Blank lines separating a section from the next header are not part of the
/// section. `Display` writes exactly one between sections instead.
fn trim_trailing_blanks(lines: &mut Vec<Line>) {
    while lines.last() == Some(&Line::Blank) {
        lines.pop();
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.preamble {
            writeln!(f, "{line}")?;
        }
        let mut separate = !self.preamble.is_empty();
        for section in &self.sections {
            if separate {
                writeln!(f)?;
            }
            write!(f, "{section}")?;
            separate = true;
        }
        Ok(())
    }
}

impl Section {
    /// Section name as written in the header
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comment following the header, if any
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// All lines including comments and blank lines
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Entries of the section, skipping comments and blank lines
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// First entry whose key matches `key`, ignoring ASCII case
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Entry> {
        self.entries().find(|entry| entry.is_key(key))
    }

    /// Every entry whose key matches `key`, ignoring ASCII case
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Entry> {
        self.entries().filter(move |entry| entry.is_key(key))
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.lines.iter_mut().find_map(|line| match line {
            Line::Entry(entry) if entry.is_key(key) => Some(entry),
            _ => None,
        })
    }

    /// Appends an entry at the end of the section
    pub fn push(&mut self, entry: Entry) {
        self.lines.push(Line::Entry(entry));
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name)?;
        if let Some(comment) = &self.comment {
            write!(f, " ;{comment}")?;
        }
        writeln!(f)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(entry) => write!(f, "{entry}"),
            Self::Comment(comment) => write!(f, ";{comment}"),
            Self::Blank => Ok(()),
        }
    }
}

impl Entry {
    /// Creates an entry from a key and its values
    pub fn new<V: Into<String>>(key: Option<&str>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            key: key.map(str::to_string),
            values: values.into_iter().map(Into::into).collect(),
            comment: None,
        }
    }

    fn from_text(content: &str, comment: Option<String>) -> Self {
        let (key, values) = match parse::find_unquoted(content, '=') {
            Some(index) => (
                Some(content[..index].trim().to_string()),
                &content[index + 1..],
            ),
            None => (None, content),
        };
        Self {
            key,
            values: parse::split_values(values),
            comment,
        }
    }

    /// Key as written, or `None` for a bare value list
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns `true` when the key matches `key`, ignoring ASCII case
    #[must_use]
    pub fn is_key(&self, key: &str) -> bool {
        self.key
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(key))
    }

    /// All values, quotes included
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value at `index`, quotes included
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Trailing comment, if any
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.join(",");
        match &self.key {
            Some(key) if values.is_empty() => write!(f, "{key} =")?,
            Some(key) => write!(f, "{key} = {values}")?,
            None => write!(f, "{values}")?,
        }
        if let Some(comment) = &self.comment {
            write!(f, " ;{comment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"; leading comment

[Version]
Signature   = "$WINDOWS NT$"
Class       = Sample ; custom class

[SourceDisksNames]
1 = %DiskName%,,,""

[File_Copy]
ectest.sys

[Strings]
DiskName = "ectest Installation Disk"
"#;

    #[test]
    fn parses_sections_entries_and_comments() {
        let document = Document::parse(SAMPLE).unwrap();

        assert_eq!(
            document.preamble(),
            &[Line::Comment(" leading comment".to_string())]
        );
        assert_eq!(
            document.sections().map(Section::name).collect::<Vec<_>>(),
            vec!["Version", "SourceDisksNames", "File_Copy", "Strings"]
        );
        assert_eq!(document.value("version", "signature"), Some("\"$WINDOWS NT$\""));

        let class = document.entry("Version", "Class").unwrap();
        assert_eq!(class.values(), &["Sample"]);
        assert_eq!(class.comment(), Some(" custom class"));

        let disk = document.entry("SourceDisksNames", "1").unwrap();
        assert_eq!(disk.values(), &["%DiskName%", "", "", "\"\""]);

        let files: Vec<_> = document.section("File_Copy").unwrap().entries().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].key(), None);
        assert_eq!(files[0].values(), &["ectest.sys"]);
    }

    #[test]
    fn serialized_document_parses_back_to_the_same_document() {
        let document = Document::parse(SAMPLE).unwrap();
        let reparsed = Document::parse(&document.to_string()).unwrap();
        assert_eq!(reparsed, document);
    }

    #[test]
    fn sections_are_separated_by_one_blank_line() {
        let document = Document::parse("; top\n[A]\nx = 1\n[B]\n\n\ny = 2\n\n\n[C]\n").unwrap();
        let text = document.to_string();

        assert_eq!(text, "; top\n\n[A]\nx = 1\n\n[B]\n\n\ny = 2\n\n[C]\n");
        assert_eq!(Document::parse(&text).unwrap(), document);
        assert_eq!(Document::parse(&text).unwrap().to_string(), text);
    }

    #[test]
    fn blank_lines_before_a_header_do_not_belong_to_the_section() {
        let document = Document::parse("[A]\nx = 1\n\n\n[B]\n").unwrap();
        assert_eq!(document.section("A").unwrap().lines().len(), 1);
    }

    #[test]
    fn contains_text_ignores_comments() {
        let document =
            Document::parse("[Version] ; $KMDFVERSION$\nSignature = x ; $KMDFVERSION$\n; $KMDFVERSION$\n")
                .unwrap();
        assert!(!document.contains_text("$KMDFVERSION$"));
        assert!(document.contains_text("Signature"));

        let document = Document::parse("[wdf]\nKmdfLibraryVersion = $KMDFVERSION$\n").unwrap();
        assert!(document.contains_text("$KMDFVERSION$"));
    }

    #[test]
    fn repeated_sections_are_merged() {
        let document = Document::parse("[A]\nx = 1\n[B]\n[a] ; again\ny = 2\n").unwrap();
        let section = document.section("A").unwrap();
        assert_eq!(
            section.entries().map(|e| e.key().unwrap()).collect::<Vec<_>>(),
            vec!["x", "y"]
        );
        assert_eq!(document.sections().count(), 2);
    }

    #[test]
    fn entries_before_first_section_are_rejected() {
        assert_eq!(
            Document::parse("; ok\nClass = System\n"),
            Err(ParseError::EntryOutsideSection {
                line: 2,
                text: "Class = System".to_string()
            })
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(
            Document::parse("[Version"),
            Err(ParseError::UnterminatedSectionHeader { line: 1 })
        );
        assert_eq!(
            Document::parse("[ ]"),
            Err(ParseError::EmptySectionName { line: 1 })
        );
        assert_eq!(
            Document::parse("[Version] extra"),
            Err(ParseError::TrailingHeaderText {
                line: 1,
                text: "extra".to_string()
            })
        );
    }

    #[test]
    fn set_value_replaces_or_appends() {
        let mut document = Document::parse("[Version]\nDriverVer = ; stamped later\n").unwrap();
        document.set_values("Version", "DriverVer", ["10/19/2026", "1.0.0.0"]);
        document.set_value("Version", "PnpLockdown", "1");
        document.set_value("Strings", "Name", "\"x\"");

        assert_eq!(
            document.to_string(),
            "[Version]\nDriverVer = 10/19/2026,1.0.0.0 ; stamped later\nPnpLockdown = \
             1\n\n[Strings]\nName = \"x\"\n"
        );
    }

    #[test]
    fn map_text_rewrites_names_keys_and_values() {
        let document =
            Document::parse("[Manufacturer]\n%M% = Standard,NT$ARCH$\n[Standard.NT$ARCH$]\n")
                .unwrap();
        let mapped = document.map_text(|text| text.replace("$ARCH$", "amd64"));

        assert!(mapped.has_section("Standard.NTamd64"));
        assert_eq!(
            mapped.entry("Manufacturer", "%M%").unwrap().values(),
            &["Standard", "NTamd64"]
        );
    }
}

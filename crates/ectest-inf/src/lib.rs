// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! [`ectest-inf`] reads, checks and stamps the INF install descriptor of the
//! `ectest` driver package. An INF is kept as a [`Document`] that preserves
//! sections, entries and comments so it can be rewritten without losing
//! anything but insignificant whitespace. On top of that, [`model`] provides
//! typed views of the sections Windows setup reads, [`validate`] checks them
//! for consistency, and [`stamp`] turns an `.inx` template into an `.inf` for
//! one architecture.

mod document;
mod parse;

pub mod config;
pub mod model;
pub mod stamp;
pub mod strings;
pub mod validate;

pub use document::{Document, Entry, Line, Section};
pub use parse::{ParseError, unquote};
pub use stamp::{Arch, StampError, StampOptions, needs_kmdf_version, stamp};
pub use strings::{StringTable, StringsError};
pub use validate::{
    Diagnostic,
    Expectations,
    Report,
    ServicePolicy,
    Severity,
    validate,
    validate_package,
};
use thiserror::Error;

/// Any error produced by this crate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The text is not a well formed INF
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A string token could not be expanded
    #[error(transparent)]
    Strings(#[from] StringsError),
    /// A section does not have the shape Windows setup expects
    #[error(transparent)]
    Model(#[from] model::ModelError),
    /// A template could not be stamped
    #[error(transparent)]
    Stamp(#[from] StampError),
    /// A version string is malformed
    #[error(transparent)]
    Version(#[from] config::VersionParseError),
    /// A service policy string is malformed
    #[error(transparent)]
    ServicePolicy(#[from] validate::ParseServicePolicyError),
}

/// Parses `template` and stamps it in one step.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed text and [`Error::Stamp`] when the
/// template cannot be stamped with `options`.
pub fn stamp_text(template: &str, options: &StampOptions) -> Result<String, Error> {
    let document = Document::parse(template)?;
    Ok(stamp(&document, options)?.to_string())
}

// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module contains the `FormatAction` struct, which rewrites an INF in the
//! canonical form produced by serializing a parsed document.

use std::path::Path;

use ectest_inf::Document;
use mockall_double::double;
use tracing::info;

use super::FormatActionError;
#[double]
use crate::providers::fs::Fs;

/// Action that formats a single INF
pub struct FormatAction<'a> {
    path: &'a Path,
    check: bool,

    // Injected deps
    fs: &'a Fs,
}

impl<'a> FormatAction<'a> {
    pub const fn new(path: &'a Path, check: bool, fs: &'a Fs) -> Self {
        Self { path, check, fs }
    }

    /// Formats the file in place. With `check` set nothing is written and a
    /// file that is not already canonical is an error.
    ///
    /// Returns `true` when the file was (or, with `check`, would be) changed.
    ///
    /// # Errors
    /// * `FormatActionError::FileIo` - If the file cannot be read or written
    /// * `FormatActionError::Parse` - If the file is not a well formed INF
    /// * `FormatActionError::NotCanonical` - If `check` is set and the file
    ///   is not canonically formatted
    pub fn run(&self) -> Result<bool, FormatActionError> {
        let text = self.fs.read_file_to_string(self.path)?;
        let document = Document::parse(&text)
            .map_err(|e| FormatActionError::Parse(self.path.to_path_buf(), e))?;
        let formatted = document.to_string();

        if formatted == text {
            info!("{} is already formatted", self.path.display());
            return Ok(false);
        }
        if self.check {
            return Err(FormatActionError::NotCanonical(self.path.to_path_buf()));
        }

        self.fs.write_to_file(self.path, formatted.as_bytes())?;
        info!("Formatted {}", self.path.display());
        Ok(true)
    }
}

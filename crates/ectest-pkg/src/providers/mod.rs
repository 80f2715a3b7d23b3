// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! Thin wrappers around the file system and `cargo metadata`. Actions only
//! reach the outside world through these, so they can be mocked in unit tests.

pub mod fs;
pub mod metadata;

pub mod error {
    use std::{io, path::PathBuf};

    /// Error type for `std::fs` operations
    #[derive(Debug, thiserror::Error)]
    pub enum FileError {
        #[error("File not found: {0}")]
        NotFound(PathBuf),
        #[error("Failed to read file: {0}")]
        ReadError(PathBuf, #[source] io::Error),
        #[error("Failed to write to file: {0}")]
        WriteError(PathBuf, #[source] io::Error),
        #[error("Failed to resolve path: {0}")]
        CanonicalizeError(PathBuf, #[source] io::Error),
    }
}

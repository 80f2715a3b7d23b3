// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! File system access used by the actions. The `mockall` crate is used to mock
//! the `Fs` struct in unit tests.

#![allow(clippy::unused_self)]

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::error::FileError;

/// Provides limited access to `std::fs` methods
#[derive(Debug, Default)]
pub struct Fs {}

#[cfg_attr(test, mockall::automock)]
#[cfg_attr(
    test,
    allow(
        dead_code,
        reason = "This implementation is mocked in test configuration."
    )
)]
impl Fs {
    pub fn read_file_to_string(&self, path: &Path) -> Result<String, FileError> {
        debug!("Reading {}", path.display());
        fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            _ => FileError::ReadError(path.to_path_buf(), e),
        })
    }

    pub fn write_to_file(&self, path: &Path, contents: &[u8]) -> Result<(), FileError> {
        debug!("Writing {}", path.display());
        fs::write(path, contents).map_err(|e| FileError::WriteError(path.to_path_buf(), e))
    }

    pub fn canonicalize_path(&self, path: &Path) -> Result<PathBuf, FileError> {
        path.canonicalize()
            .map_err(|e| FileError::CanonicalizeError(path.to_path_buf(), e))
    }
}

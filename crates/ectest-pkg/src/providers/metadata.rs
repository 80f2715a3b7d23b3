// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module provides a wrapper around the `cargo-metadata` crate, offering
//! a method to retrieve metadata about the Cargo project a driver template
//! belongs to. The module leverages the `mockall` crate to enable mocking of
//! its methods, facilitating easier unit testing.

#![allow(clippy::unused_self)]

use std::path::Path;

#[derive(Debug, Default)]
pub struct Metadata {}

#[cfg_attr(test, mockall::automock)]
#[cfg_attr(
    test,
    allow(
        dead_code,
        reason = "This implementation is mocked in test configuration."
    )
)]
impl Metadata {
    /// Runs `cargo metadata` in `working_dir` without resolving dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails to execute or `working_dir` is
    /// not inside a Cargo project.
    pub fn get_cargo_metadata_at_path(
        &self,
        working_dir: &Path,
    ) -> cargo_metadata::Result<cargo_metadata::Metadata> {
        cargo_metadata::MetadataCommand::new()
            .current_dir(working_dir)
            .no_deps()
            .exec()
    }
}

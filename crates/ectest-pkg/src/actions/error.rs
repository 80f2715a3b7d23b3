// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module defines error types used in the action modules.

use std::path::PathBuf;

use ectest_inf::{ParseError, StampError, model::ModelError};
use thiserror::Error;

use crate::providers::error::FileError;

/// Errors for the check action
#[derive(Error, Debug)]
pub enum CheckActionError {
    #[error("No INF files were given")]
    NoInputFiles,
    #[error(transparent)]
    FileIo(#[from] FileError),
    #[error("Error parsing {0}")]
    Parse(PathBuf, #[source] ParseError),
    #[error("INF package is not valid: {errors} error(s), {warnings} warning(s)")]
    InvalidPackage { errors: usize, warnings: usize },
}

/// Errors for the stamp action
#[derive(Error, Debug)]
pub enum StampActionError {
    #[error(transparent)]
    FileIo(#[from] FileError),
    #[error("Error parsing {0}")]
    Parse(PathBuf, #[source] ParseError),
    #[error("Error stamping {0}")]
    Stamp(PathBuf, #[source] StampError),
    #[error("Error Parsing Cargo.toml, not a valid rust project/workspace")]
    CargoMetadataParse(#[from] cargo_metadata::Error),
    #[error("No package in the Cargo metadata has its manifest in {0}")]
    NoDriverPackage(PathBuf),
    #[error("Error Parsing WDK metadata from Cargo.toml of package {0}")]
    WdkMetadataParse(String, #[source] serde_json::Error),
    #[error("Version {0} of package {1} does not fit in a driver version")]
    VersionOutOfRange(String, String),
}

/// Errors for the format action
#[derive(Error, Debug)]
pub enum FormatActionError {
    #[error(transparent)]
    FileIo(#[from] FileError),
    #[error("Error parsing {0}")]
    Parse(PathBuf, #[source] ParseError),
    #[error("{0} is not canonically formatted")]
    NotCanonical(PathBuf),
}

/// Errors for the show action
#[derive(Error, Debug)]
pub enum ShowActionError {
    #[error(transparent)]
    FileIo(#[from] FileError),
    #[error("Error parsing {0}")]
    Parse(PathBuf, #[source] ParseError),
    #[error("Error reading {0}")]
    Model(PathBuf, #[source] ModelError),
}

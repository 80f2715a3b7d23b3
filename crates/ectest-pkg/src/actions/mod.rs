// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! Business logic is divided into the following action modules
//! * `check` - Validates one or more INF files as a package
//! * `stamp` - Produces an architecture specific INF from an INX template
//! * `format` - Rewrites an INF in canonical form
//! * `show` - Summarizes what an INF installs

pub mod check;
mod error;
pub mod format;
pub mod show;
pub mod stamp;

pub use error::{CheckActionError, FormatActionError, ShowActionError, StampActionError};

// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Turns an `.inx` template into a concrete `.inf` for one architecture,
//! filling in the values `stampinf` would: `$ARCH$`, `$KMDFVERSION$`,
//! `DriverVer` and optionally `CatalogFile`.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    Document,
    config::{DriverVersion, KmdfVersion},
    model::Version,
};

/// Replaced by the architecture decoration
pub const ARCH_PLACEHOLDER: &str = "$ARCH$";
/// Replaced by the `major.minor` KMDF library version
pub const KMDF_VERSION_PLACEHOLDER: &str = "$KMDFVERSION$";
const DRIVER_VER_DATE_FORMAT: &str = "%m/%d/%Y";

/// Target architecture of a driver package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x64
    Amd64,
    /// ARM64
    Arm64,
    /// 32-bit x86
    X86,
}

impl Arch {
    /// Platform decoration used in INF section names
    #[must_use]
    pub const fn decoration(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.decoration())
    }
}

/// Error returned for an unknown architecture name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported architecture: {0}")]
pub struct ArchParseError(String);

impl FromStr for Arch {
    type Err = ArchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amd64" | "x64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "x86" | "i686" => Ok(Self::X86),
            _ => Err(ArchParseError(s.to_string())),
        }
    }
}

/// Values written into a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampOptions {
    /// Replaces `$ARCH$`
    pub arch: Arch,
    /// Replaces `$KMDFVERSION$`; required when the template uses it
    pub kmdf_version: Option<KmdfVersion>,
    /// Version part of `DriverVer`
    pub driver_version: DriverVersion,
    /// Date part of `DriverVer`
    pub date: NaiveDate,
    /// Overrides `CatalogFile` when set
    pub catalog_file: Option<String>,
}

/// Errors that could result from stamping a template
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StampError {
    /// The template uses `$KMDFVERSION$` but no version was given
    #[error("template uses {KMDF_VERSION_PLACEHOLDER} but no KMDF version was provided")]
    MissingKmdfVersion,

    /// The template has no `[Version]` section to hold `DriverVer`
    #[error("template has no [{}] section", Version::SECTION)]
    MissingVersionSection,
}

/// Returns `true` when stamping `template` needs a KMDF version, i.e. a
/// section name, key or value uses `$KMDFVERSION$`. Comments do not count.
#[must_use]
pub fn needs_kmdf_version(template: &Document) -> bool {
    template.contains_text(KMDF_VERSION_PLACEHOLDER)
}

/// Produces the stamped document. The template itself is left untouched.
///
/// # Errors
///
/// Returns [`StampError::MissingKmdfVersion`] when the template references
/// `$KMDFVERSION$` and [`StampOptions::kmdf_version`] is `None`, and
/// [`StampError::MissingVersionSection`] when there is no `[Version]`.
pub fn stamp(template: &Document, options: &StampOptions) -> Result<Document, StampError> {
    if !template.has_section(Version::SECTION) {
        return Err(StampError::MissingVersionSection);
    }

    let kmdf_version = match (needs_kmdf_version(template), options.kmdf_version) {
        (true, None) => return Err(StampError::MissingKmdfVersion),
        (_, version) => version.map(|version| version.to_string()),
    };

    let arch = options.arch.decoration();
    let mut stamped = template.map_text(|text| {
        let text = text.replace(ARCH_PLACEHOLDER, arch);
        match &kmdf_version {
            Some(version) => text.replace(KMDF_VERSION_PLACEHOLDER, version),
            None => text,
        }
    });
    debug!("Replaced {ARCH_PLACEHOLDER} with {arch}");

    let date = options.date.format(DRIVER_VER_DATE_FORMAT).to_string();
    let version = options.driver_version.to_string();
    info!("Stamping DriverVer = {date},{version}");
    stamped.set_values(Version::SECTION, "DriverVer", [date, version]);

    if let Some(catalog_file) = &options.catalog_file {
        debug!("Setting CatalogFile = {catalog_file}");
        stamped.set_value(Version::SECTION, "CatalogFile", catalog_file.as_str());
    }

    Ok(stamped)
}

// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module contains the `StampAction` struct, which turns a driver's `.inx`
//! template into an `.inf` for one architecture. Values that are not given on
//! the command line are taken from the driver crate's `Cargo.toml`: the KMDF
//! version from `package.metadata.wdk.driver-model` and the driver version
//! from the package version.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ectest_inf::{
    Arch,
    Document,
    StampOptions,
    config::{DriverVersion, KmdfVersion, Wdk},
    needs_kmdf_version,
    stamp,
};
use mockall_double::double;
use tracing::{debug, info, warn};

use super::StampActionError;
#[double]
use crate::providers::{fs::Fs, metadata::Metadata};

const EXTENDED_LENGTH_PATH_PREFIX: &str = r"\\?\";

pub struct StampActionParams<'a> {
    pub inx_path: &'a Path,
    pub output: Option<&'a Path>,
    pub arch: Arch,
    pub kmdf_version: Option<KmdfVersion>,
    pub driver_version: Option<DriverVersion>,
    pub date: NaiveDate,
    pub catalog_file: Option<&'a str>,
}

/// Action that stamps an INX template
pub struct StampAction<'a> {
    params: &'a StampActionParams<'a>,

    // Injected deps
    fs: &'a Fs,
    metadata: &'a Metadata,
}

/// Values read from the driver crate that owns a template
#[derive(Debug, PartialEq, Eq)]
struct DriverCrate {
    kmdf_version: Option<KmdfVersion>,
    driver_version: DriverVersion,
}

impl<'a> StampAction<'a> {
    pub const fn new(params: &'a StampActionParams<'a>, fs: &'a Fs, metadata: &'a Metadata) -> Self {
        Self {
            params,
            fs,
            metadata,
        }
    }

    /// Stamps the template and writes the result, returning the path written.
    ///
    /// # Errors
    /// * `StampActionError::FileIo` - If the template cannot be read or the
    ///   output cannot be written
    /// * `StampActionError::Parse` - If the template is not a well formed INF
    /// * `StampActionError::CargoMetadataParse`,
    ///   `StampActionError::NoDriverPackage`,
    ///   `StampActionError::WdkMetadataParse`,
    ///   `StampActionError::VersionOutOfRange` - If a value has to be read
    ///   from the driver crate and that fails
    /// * `StampActionError::Stamp` - If the template cannot be stamped
    pub fn run(&self) -> Result<PathBuf, StampActionError> {
        let inx_path = self.params.inx_path;
        let text = self.fs.read_file_to_string(inx_path)?;
        let template = Document::parse(&text)
            .map_err(|e| StampActionError::Parse(inx_path.to_path_buf(), e))?;

        // The KMDF version is required, the driver version falls back to 0.0.0.0.
        let driver_crate = if self.params.kmdf_version.is_none() && needs_kmdf_version(&template) {
            Some(self.read_driver_crate()?)
        } else if self.params.driver_version.is_none() {
            match self.read_driver_crate() {
                Ok(driver_crate) => Some(driver_crate),
                Err(e) => {
                    warn!(
                        "Using driver version {}, no driver crate found: {e}",
                        DriverVersion::default()
                    );
                    None
                }
            }
        } else {
            None
        };
        let kmdf_version = self
            .params
            .kmdf_version
            .or_else(|| driver_crate.as_ref().and_then(|c| c.kmdf_version));
        let driver_version = self
            .params
            .driver_version
            .or_else(|| driver_crate.as_ref().map(|c| c.driver_version))
            .unwrap_or_default();

        let options = StampOptions {
            arch: self.params.arch,
            kmdf_version,
            driver_version,
            date: self.params.date,
            catalog_file: self.params.catalog_file.map(str::to_string),
        };
        let stamped = stamp(&template, &options)
            .map_err(|e| StampActionError::Stamp(inx_path.to_path_buf(), e))?;

        let output = self
            .params
            .output
            .map_or_else(|| inx_path.with_extension("inf"), Path::to_path_buf);
        self.fs
            .write_to_file(&output, stamped.to_string().as_bytes())?;
        info!(
            "Stamped {} for {} into {}",
            inx_path.display(),
            options.arch,
            output.display()
        );
        Ok(output)
    }

    /// Finds the package whose manifest sits next to the template and reads
    /// its WDK metadata and version.
    fn read_driver_crate(&self) -> Result<DriverCrate, StampActionError> {
        let inx_dir = match self.params.inx_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let inx_dir = strip_extended_length_path_prefix(self.fs.canonicalize_path(inx_dir)?);
        debug!("Reading Cargo metadata in {}", inx_dir.display());

        let cargo_metadata = self.metadata.get_cargo_metadata_at_path(&inx_dir)?;
        let package = cargo_metadata
            .packages
            .iter()
            .find(|package| {
                package.manifest_path.parent().is_some_and(|package_dir| {
                    self.fs
                        .canonicalize_path(package_dir.as_std_path())
                        .is_ok_and(|package_dir| {
                            strip_extended_length_path_prefix(package_dir) == inx_dir
                        })
                })
            })
            .ok_or_else(|| StampActionError::NoDriverPackage(inx_dir.clone()))?;
        debug!("Template belongs to package {}", package.name);

        let kmdf_version = match package.metadata.get("wdk") {
            Some(wdk) => serde_json::from_value::<Wdk>(wdk.clone())
                .map_err(|e| StampActionError::WdkMetadataParse(package.name.to_string(), e))?
                .driver_model
                .kmdf_version(),
            None => None,
        };

        let version = &package.version;
        let part = |value: u64| {
            u16::try_from(value).map_err(|_| {
                StampActionError::VersionOutOfRange(version.to_string(), package.name.to_string())
            })
        };
        let driver_version = DriverVersion::from_crate_version(
            part(version.major)?,
            part(version.minor)?,
            part(version.patch)?,
        );

        Ok(DriverCrate {
            kmdf_version,
            driver_version,
        })
    }
}

/// Removes the `\\?\` prefix `canonicalize` adds on Windows, so that paths
/// compare equal to the ones cargo reports.
fn strip_extended_length_path_prefix(path: PathBuf) -> PathBuf {
    if let Some(stripped) = path
        .to_str()
        .and_then(|path| path.strip_prefix(EXTENDED_LENGTH_PATH_PREFIX))
    {
        return PathBuf::from(stripped);
    }
    path
}

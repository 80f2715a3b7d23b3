// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Driver model configuration read from the `package.metadata.wdk` section of
//! a driver's `Cargo.toml`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata specified in the `metadata.wdk` section of the `Cargo.toml`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub struct Wdk {
    /// Metadata corresponding to the `Driver Model` property page in the WDK
    pub driver_model: DriverConfig,
}

/// The driver type and framework version of a driver crate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "driver-type", deny_unknown_fields, rename_all = "UPPERCASE")]
pub enum DriverConfig {
    /// Windows Driver Model
    Wdm,
    /// Kernel Mode Driver Framework
    Kmdf(KmdfConfig),
    /// User Mode Driver Framework
    Umdf(UmdfConfig),
}

/// The configuration parameters for KMDF drivers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct KmdfConfig {
    /// Major KMDF Version
    pub kmdf_version_major: u8,
    /// Minor KMDF Version (Target Version)
    pub target_kmdf_version_minor: u8,
    /// Minor KMDF Version (Minimum Required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_kmdf_version_minor: Option<u8>,
}

/// The configuration parameters for UMDF drivers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct UmdfConfig {
    /// Major UMDF Version
    pub umdf_version_major: u8,
    /// Minor UMDF Version (Target Version)
    pub target_umdf_version_minor: u8,
    /// Minor UMDF Version (Minimum Required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_umdf_version_minor: Option<u8>,
}

impl DriverConfig {
    /// KMDF library version an INF binds to, if this is a KMDF driver
    #[must_use]
    pub const fn kmdf_version(&self) -> Option<KmdfVersion> {
        match self {
            Self::Kmdf(config) => Some(KmdfVersion {
                major: config.kmdf_version_major,
                minor: config.target_kmdf_version_minor,
            }),
            Self::Wdm | Self::Umdf(_) => None,
        }
    }
}

/// A `major.minor` KMDF library version as written in `KmdfLibraryVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KmdfVersion {
    /// Major version, always 1 for current KMDF releases
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

/// Error returned when a version string is not in the expected format
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} version: {text}")]
pub struct VersionParseError {
    kind: &'static str,
    text: String,
}

impl FromStr for KmdfVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || VersionParseError {
            kind: "KMDF",
            text: s.to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(error)?;
        Ok(Self {
            major: major.parse().map_err(|_| error())?,
            minor: minor.parse().map_err(|_| error())?,
        })
    }
}

impl fmt::Display for KmdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A four part `w.x.y.z` driver version as written in `DriverVer`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverVersion(pub [u16; 4]);

impl DriverVersion {
    /// Builds a driver version out of a crate's `major.minor.patch` version
    #[must_use]
    pub const fn from_crate_version(major: u16, minor: u16, patch: u16) -> Self {
        Self([major, minor, patch, 0])
    }
}

impl FromStr for DriverVersion {
    type Err = VersionParseError;

    /// Parses one to four dot separated parts. Missing trailing parts are 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || VersionParseError {
            kind: "driver",
            text: s.to_string(),
        };
        let mut parts = [0; 4];
        let mut count = 0;
        for part in s.trim().split('.') {
            let slot = parts.get_mut(count).ok_or_else(error)?;
            *slot = part.parse().map_err(|_| error())?;
            count += 1;
        }
        Ok(Self(parts))
    }
}

impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [w, x, y, z] = self.0;
        write!(f, "{w}.{x}.{y}.{z}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn kmdf_metadata_deserializes() {
        let wdk: Wdk = serde_json::from_str(
            r#"{
                "driver-model": {
                    "driver-type": "KMDF",
                    "kmdf-version-major": 1,
                    "target-kmdf-version-minor": 33
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            wdk.driver_model,
            DriverConfig::Kmdf(KmdfConfig {
                kmdf_version_major: 1,
                target_kmdf_version_minor: 33,
                minimum_kmdf_version_minor: None,
            })
        );
        assert_eq!(
            wdk.driver_model.kmdf_version(),
            Some(KmdfVersion {
                major: 1,
                minor: 33
            })
        );
    }

    #[test]
    fn unknown_driver_model_keys_are_rejected() {
        let result = serde_json::from_str::<Wdk>(
            r#"{ "driver-model": { "driver-type": "KMDF", "random-key": 1 } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn wdm_has_no_kmdf_version() {
        let wdk: Wdk =
            serde_json::from_str(r#"{ "driver-model": { "driver-type": "WDM" } }"#).unwrap();
        assert_eq!(wdk.driver_model.kmdf_version(), None);
    }

    #[test]
    fn versions_parse_and_display() {
        assert_eq!("1.33".parse::<KmdfVersion>().unwrap().to_string(), "1.33");
        assert!("1".parse::<KmdfVersion>().is_err());
        assert!("1.x".parse::<KmdfVersion>().is_err());

        assert_eq!("2.1".parse::<DriverVersion>().unwrap().to_string(), "2.1.0.0");
        assert_eq!(
            "10.0.26100.1".parse::<DriverVersion>().unwrap(),
            DriverVersion([10, 0, 26100, 1])
        );
        assert!("1.2.3.4.5".parse::<DriverVersion>().is_err());
        assert!("1..2".parse::<DriverVersion>().is_err());
        assert_eq!(
            DriverVersion::from_crate_version(0, 1, 0).to_string(),
            "0.1.0.0"
        );
    }
}

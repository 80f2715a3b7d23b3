// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Typed views over the sections of a [`Document`] that describe a driver
//! package: the `[Version]` header, the manufacturer/models tables, service
//! registration, KMDF binding, class installation and file copying.
//!
//! Values are returned as written (string tokens are not expanded); use a
//! [`StringTable`](crate::StringTable) to resolve them for display.

use std::{fmt, str::FromStr};

use thiserror::Error;
use tracing::trace;

use crate::{Document, parse::unquote};

/// Errors that could result from interpreting a [`Document`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A section that is required or referenced is not in the document
    #[error("missing section [{section}]")]
    MissingSection {
        /// Section name
        section: String,
    },

    /// A required key is not in its section
    #[error("[{section}] is missing {key}")]
    MissingKey {
        /// Section name
        section: String,
        /// Key name
        key: String,
    },

    /// A value could not be interpreted
    #[error("[{section}] {key} has an invalid value: {value}")]
    InvalidValue {
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Offending value
        value: String,
    },

    /// The text is not a `{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}` GUID
    #[error("invalid GUID: {0}")]
    InvalidGuid(String),
}

/// A class GUID such as `{4d36e97d-e325-11ce-bfc1-08002be10318}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassGuid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl ClassGuid {
    /// Builds a GUID from its fields
    #[must_use]
    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

impl FromStr for ClassGuid {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidGuid(s.to_string());
        let inner = s
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = inner.split('-').collect();
        let lengths = [8, 4, 4, 4, 12];
        if parts.len() != lengths.len()
            || parts
                .iter()
                .zip(lengths)
                .any(|(part, len)| part.len() != len || !part.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(invalid());
        }

        let tail = format!("{}{}", parts[3], parts[4]);
        let mut data4 = [0; 8];
        for (index, byte) in data4.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&tail[index * 2..index * 2 + 2], 16).map_err(|_| invalid())?;
        }

        Ok(Self {
            data1: u32::from_str_radix(parts[0], 16).map_err(|_| invalid())?,
            data2: u16::from_str_radix(parts[1], 16).map_err(|_| invalid())?,
            data3: u16::from_str_radix(parts[2], 16).map_err(|_| invalid())?,
            data4,
        })
    }
}

impl fmt::Display for ClassGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.data4;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

/// Setup classes defined by the platform, and their GUIDs
const WELL_KNOWN_CLASSES: &[(&str, ClassGuid)] = &[
    (
        "Battery",
        ClassGuid::from_fields(0x7263_1e54, 0x78a4, 0x11d0, [0xbc, 0xf7, 0x00, 0xaa, 0x00, 0xb7, 0xb3, 0x2a]),
    ),
    (
        "Extension",
        ClassGuid::from_fields(0xe2f8_4ce7, 0x8efa, 0x411c, [0xaa, 0x69, 0x97, 0x45, 0x4c, 0xa4, 0xcb, 0x57]),
    ),
    (
        "HIDClass",
        ClassGuid::from_fields(0x745a_17a0, 0x74d3, 0x11d0, [0xb6, 0xfe, 0x00, 0xa0, 0xc9, 0x0f, 0x57, 0xda]),
    ),
    (
        "Net",
        ClassGuid::from_fields(0x4d36_e972, 0xe325, 0x11ce, [0xbf, 0xc1, 0x08, 0x00, 0x2b, 0xe1, 0x03, 0x18]),
    ),
    (
        "Sample",
        ClassGuid::from_fields(0x78a1_c341, 0x4539, 0x11d3, [0xb8, 0x8d, 0x00, 0xc0, 0x4f, 0xad, 0x51, 0x71]),
    ),
    (
        "SoftwareComponent",
        ClassGuid::from_fields(0x5c4c_3332, 0x344d, 0x483c, [0x87, 0x39, 0x25, 0x9e, 0x93, 0x4c, 0x9c, 0xc8]),
    ),
    (
        "System",
        ClassGuid::from_fields(0x4d36_e97d, 0xe325, 0x11ce, [0xbf, 0xc1, 0x08, 0x00, 0x2b, 0xe1, 0x03, 0x18]),
    ),
    (
        "USB",
        ClassGuid::from_fields(0x36fc_9e60, 0xc465, 0x11cf, [0x80, 0x56, 0x44, 0x45, 0x53, 0x54, 0x00, 0x00]),
    ),
];

/// GUID of a setup class defined by the platform, looked up by class name
#[must_use]
pub fn well_known_class_guid(class: &str) -> Option<ClassGuid> {
    WELL_KNOWN_CLASSES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(class))
        .map(|(_, guid)| *guid)
}

macro_rules! service_code {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$variant_meta])* $variant = $value,)+
        }

        impl $name {
            /// Numeric value as written in an INF
            #[must_use]
            pub const fn code(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(other),
                }
            }
        }
    };
}

service_code! {
    /// `ServiceType` of a service install section
    ServiceType {
        /// `SERVICE_KERNEL_DRIVER`
        KernelDriver = 1,
        /// `SERVICE_FILE_SYSTEM_DRIVER`
        FileSystemDriver = 2,
        /// `SERVICE_WIN32_OWN_PROCESS`
        Win32OwnProcess = 16,
        /// `SERVICE_WIN32_SHARE_PROCESS`
        Win32ShareProcess = 32,
    }
}

service_code! {
    /// `StartType` of a service install section
    StartType {
        /// `SERVICE_BOOT_START`
        Boot = 0,
        /// `SERVICE_SYSTEM_START`
        System = 1,
        /// `SERVICE_AUTO_START`
        Auto = 2,
        /// `SERVICE_DEMAND_START`
        Demand = 3,
        /// `SERVICE_DISABLED`
        Disabled = 4,
    }
}

service_code! {
    /// `ErrorControl` of a service install section
    ErrorControl {
        /// `SERVICE_ERROR_IGNORE`
        Ignore = 0,
        /// `SERVICE_ERROR_NORMAL`
        Normal = 1,
        /// `SERVICE_ERROR_SEVERE`
        Severe = 2,
        /// `SERVICE_ERROR_CRITICAL`
        Critical = 3,
    }
}

/// Parses a decimal or `0x` prefixed hexadecimal number
#[must_use]
pub fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// The `[Version]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// `Signature`, unquoted
    pub signature: String,
    /// `Class`
    pub class: Option<String>,
    /// `ClassGuid` as written
    pub class_guid: Option<String>,
    /// `Provider`
    pub provider: Option<String>,
    /// `CatalogFile`
    pub catalog_file: Option<String>,
    /// `DriverVer` values: the date and, optionally, the version
    pub driver_ver: Option<Vec<String>>,
    /// `PnpLockdown`
    pub pnp_lockdown: Option<u32>,
}

impl Version {
    /// Name of the section
    pub const SECTION: &'static str = "Version";

    /// Reads the `[Version]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when the section or its `Signature` is missing or
    /// `PnpLockdown` is not a number.
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let section = document
            .section(Self::SECTION)
            .ok_or_else(|| missing_section(Self::SECTION))?;
        let text = |key: &str| section.find(key).and_then(|e| e.value(0)).map(str::to_string);

        let signature = text("Signature")
            .map(|value| unquote(&value))
            .ok_or_else(|| missing_key(Self::SECTION, "Signature"))?;

        let pnp_lockdown = match text("PnpLockdown") {
            Some(value) => Some(
                parse_number(&value).ok_or_else(|| invalid(Self::SECTION, "PnpLockdown", &value))?,
            ),
            None => None,
        };

        Ok(Self {
            signature,
            class: text("Class"),
            class_guid: text("ClassGuid"),
            provider: text("Provider"),
            catalog_file: text("CatalogFile"),
            driver_ver: section
                .find("DriverVer")
                .map(|entry| entry.values().iter().filter(|v| !v.is_empty()).cloned().collect()),
            pnp_lockdown,
        })
    }

    /// Parses `ClassGuid`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingKey`] when it is absent and
    /// [`ModelError::InvalidGuid`] when it is malformed.
    pub fn class_guid(&self) -> Result<ClassGuid, ModelError> {
        self.class_guid
            .as_deref()
            .ok_or_else(|| missing_key(Self::SECTION, "ClassGuid"))?
            .parse()
    }
}

/// An entry of the `[Manufacturer]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    /// Manufacturer name, usually a `%Token%`
    pub name: String,
    /// Names of the models sections, with target decorations applied
    pub models_sections: Vec<String>,
}

/// A device model: one line of a models section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Models section the line is in
    pub models_section: String,
    /// Device description, usually a `%Token%`
    pub description: String,
    /// Base name of the install section
    pub install_section: String,
    /// Hardware id followed by any compatible ids
    pub hardware_ids: Vec<String>,
}

/// Reads the `[Manufacturer]` section.
///
/// `%Mfg% = Standard,NT$ARCH$.10.0...16299` names the models section
/// `[Standard.NT$ARCH$.10.0...16299]`; without decorations the models section
/// is `[Standard]`.
///
/// # Errors
///
/// Returns [`ModelError`] when the section is missing or an entry names no
/// models section.
pub fn manufacturers(document: &Document) -> Result<Vec<Manufacturer>, ModelError> {
    const SECTION: &str = "Manufacturer";
    let section = document
        .section(SECTION)
        .ok_or_else(|| missing_section(SECTION))?;

    section
        .entries()
        .map(|entry| {
            let name = entry.key().unwrap_or_default().to_string();
            let base = entry
                .value(0)
                .filter(|base| !base.is_empty())
                .ok_or_else(|| invalid(SECTION, &name, &entry.values().join(",")))?;
            let decorations: Vec<&String> =
                entry.values()[1..].iter().filter(|d| !d.is_empty()).collect();
            let models_sections = if decorations.is_empty() {
                vec![base.to_string()]
            } else {
                decorations
                    .into_iter()
                    .map(|decoration| format!("{base}.{decoration}"))
                    .collect()
            };
            Ok(Manufacturer {
                name,
                models_sections,
            })
        })
        .collect()
}

/// Reads the device models listed in one models section.
///
/// # Errors
///
/// Returns [`ModelError`] when the section is missing or a line names no
/// install section.
pub fn models_in(document: &Document, models_section: &str) -> Result<Vec<Model>, ModelError> {
    let section = document
        .section(models_section)
        .ok_or_else(|| missing_section(models_section))?;

    section
        .entries()
        .map(|entry| {
            let description = entry.key().unwrap_or_default().to_string();
            let install_section = entry
                .value(0)
                .filter(|install| !install.is_empty())
                .ok_or_else(|| invalid(models_section, &description, &entry.values().join(",")))?;
            Ok(Model {
                models_section: section.name().to_string(),
                description,
                install_section: install_section.to_string(),
                hardware_ids: entry.values()[1..]
                    .iter()
                    .filter(|id| !id.is_empty())
                    .cloned()
                    .collect(),
            })
        })
        .collect()
}

/// Every device model of every manufacturer.
///
/// # Errors
///
/// See [`manufacturers`] and [`models_in`].
pub fn models(document: &Document) -> Result<Vec<Model>, ModelError> {
    let mut models = Vec::new();
    for manufacturer in manufacturers(document)? {
        for models_section in &manufacturer.models_sections {
            models.extend(models_in(document, models_section)?);
        }
    }
    Ok(models)
}

/// Finds the section that installs `base` on NT platforms, trying the
/// platform decorated names before the undecorated one.
#[must_use]
pub fn resolve_install_section(document: &Document, base: &str) -> Option<String> {
    ["NT$ARCH$", "NTamd64", "NTarm64", "NTx86", "NT"]
        .iter()
        .map(|decoration| format!("{base}.{decoration}"))
        .chain(std::iter::once(base.to_string()))
        .find_map(|candidate| document.section(&candidate).map(|s| s.name().to_string()))
}

/// Service registration produced by an `AddService` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstall {
    /// Service name
    pub name: String,
    /// `AddService` flags such as `SPSVCINST_ASSOCSERVICE`, as written
    pub flags: Option<String>,
    /// Service install section
    pub section: String,
    /// `DisplayName`
    pub display_name: Option<String>,
    /// `ServiceType`
    pub service_type: ServiceType,
    /// `StartType`
    pub start_type: StartType,
    /// `ErrorControl`
    pub error_control: ErrorControl,
    /// `ServiceBinary`
    pub service_binary: String,
}

/// Reads the services added by `[<install_section>.Services]`. An install
/// section without a services section adds no services.
///
/// # Errors
///
/// Returns the first [`ModelError`] of [`service_entries`].
pub fn services(
    document: &Document,
    install_section: &str,
) -> Result<Vec<ServiceInstall>, ModelError> {
    service_entries(document, install_section)
        .into_iter()
        .collect()
}

/// Reads every `AddService` directive of `[<install_section>.Services]` on
/// its own, so one bad directive does not hide the others. A directive is an
/// error when it is incomplete or its service install section is missing or
/// invalid.
#[must_use]
pub fn service_entries(
    document: &Document,
    install_section: &str,
) -> Vec<Result<ServiceInstall, ModelError>> {
    let services_section = format!("{install_section}.Services");
    let Some(section) = document.section(&services_section) else {
        trace!("No [{services_section}] section");
        return Vec::new();
    };

    section
        .find_all("AddService")
        .map(|entry| {
            let (Some(name), Some(service_section)) = (entry.value(0), entry.value(2)) else {
                return Err(invalid(
                    &services_section,
                    "AddService",
                    &entry.values().join(","),
                ));
            };
            read_service(
                document,
                name,
                entry.value(1).filter(|f| !f.is_empty()),
                service_section,
            )
        })
        .collect()
}

fn read_service(
    document: &Document,
    name: &str,
    flags: Option<&str>,
    section_name: &str,
) -> Result<ServiceInstall, ModelError> {
    let section = document
        .section(section_name)
        .ok_or_else(|| missing_section(section_name))?;
    let text = |key: &str| {
        section
            .find(key)
            .and_then(|e| e.value(0))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| missing_key(section_name, key))
    };
    let code = |key: &str| -> Result<u32, ModelError> {
        let value = text(key)?;
        parse_number(value).ok_or_else(|| invalid(section_name, key, value))
    };

    Ok(ServiceInstall {
        name: name.to_string(),
        flags: flags.map(str::to_string),
        section: section.name().to_string(),
        display_name: text("DisplayName").ok().map(str::to_string),
        service_type: ServiceType::try_from(code("ServiceType")?)
            .map_err(|value| invalid(section_name, "ServiceType", &value.to_string()))?,
        start_type: StartType::try_from(code("StartType")?)
            .map_err(|value| invalid(section_name, "StartType", &value.to_string()))?,
        error_control: ErrorControl::try_from(code("ErrorControl")?)
            .map_err(|value| invalid(section_name, "ErrorControl", &value.to_string()))?,
        service_binary: text("ServiceBinary")?.to_string(),
    })
}

/// KMDF binding declared by `KmdfService` in `[<install_section>.Wdf]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmdfService {
    /// Service the framework binds to
    pub service: String,
    /// Section holding `KmdfLibraryVersion`
    pub wdf_section: String,
    /// `KmdfLibraryVersion` as written, if the section exists and sets it
    pub library_version: Option<String>,
}

/// Reads the `KmdfService` directives of an install section.
///
/// # Errors
///
/// Returns [`ModelError::InvalidValue`] for a directive without a service
/// name and section.
pub fn kmdf_services(
    document: &Document,
    install_section: &str,
) -> Result<Vec<KmdfService>, ModelError> {
    let wdf_section = format!("{install_section}.Wdf");
    let Some(section) = document.section(&wdf_section) else {
        return Ok(Vec::new());
    };

    section
        .find_all("KmdfService")
        .map(|entry| match (entry.value(0), entry.value(1)) {
            (Some(service), Some(section)) if !service.is_empty() && !section.is_empty() => {
                Ok(KmdfService {
                    service: service.to_string(),
                    wdf_section: section.to_string(),
                    library_version: document
                        .value(section, "KmdfLibraryVersion")
                        .map(str::to_string),
                })
            }
            _ => Err(invalid(&wdf_section, "KmdfService", &entry.values().join(","))),
        })
        .collect()
}

/// Class registration from `[ClassInstall32]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassInstall {
    /// Sections named by `AddReg`
    pub add_reg_sections: Vec<String>,
    /// Class display name, the default value of the class key
    pub class_name: Option<String>,
    /// `Icon` value of the class key
    pub icon: Option<String>,
}

/// Reads `[ClassInstall32]`, if present.
#[must_use]
pub fn class_install(document: &Document) -> Option<ClassInstall> {
    let section = document
        .section("ClassInstall32.NT")
        .or_else(|| document.section("ClassInstall32"))?;

    let mut class_install = ClassInstall::default();
    for entry in section.find_all("AddReg") {
        for add_reg in entry.values().iter().filter(|v| !v.is_empty()) {
            class_install.add_reg_sections.push(add_reg.clone());
            let Some(registry) = document.section(add_reg) else {
                continue;
            };
            // root, subkey, value name, flags, value
            for line in registry.entries().filter(|line| line.key().is_none()) {
                let is_class_key = line.value(0).is_some_and(|root| root.eq_ignore_ascii_case("HKR"))
                    && line.value(1).is_some_and(str::is_empty);
                if !is_class_key {
                    continue;
                }
                match line.value(2) {
                    Some("") => class_install.class_name = line.value(4).map(str::to_string),
                    Some(name) if name.eq_ignore_ascii_case("Icon") => {
                        class_install.icon = line.value(4).map(str::to_string);
                    }
                    _ => {}
                }
            }
        }
    }
    Some(class_install)
}

/// Files copied by the `CopyFiles` directives of an install section.
///
/// `CopyFiles = @file.sys` copies one file; any other value names a file list
/// section whose lines each start with a destination file name.
///
/// # Errors
///
/// Returns [`ModelError::MissingSection`] for a file list section that does
/// not exist.
pub fn copy_files(document: &Document, install_section: &str) -> Result<Vec<String>, ModelError> {
    let Some(section) = document.section(install_section) else {
        return Err(missing_section(install_section));
    };

    let mut files = Vec::new();
    for entry in section.find_all("CopyFiles") {
        for value in entry.values().iter().filter(|v| !v.is_empty()) {
            if let Some(file) = value.strip_prefix('@') {
                files.push(file.to_string());
                continue;
            }
            let list = document
                .section(value)
                .ok_or_else(|| missing_section(value))?;
            files.extend(
                list.entries()
                    .filter_map(|line| line.key().or_else(|| line.value(0)))
                    .filter(|file| !file.is_empty())
                    .map(str::to_string),
            );
        }
    }
    Ok(files)
}

/// `(file, disk id)` pairs of `[SourceDisksFiles]` and its platform decorated
/// variants
#[must_use]
pub fn source_disk_files(document: &Document) -> Vec<(String, String)> {
    sections_with_base(document, "SourceDisksFiles")
        .flat_map(|section| section.entries())
        .filter_map(|entry| {
            let file = entry.key()?;
            Some((file.to_string(), entry.value(0).unwrap_or_default().to_string()))
        })
        .collect()
}

/// Disk ids defined by `[SourceDisksNames]` and its platform decorated
/// variants
#[must_use]
pub fn source_disk_names(document: &Document) -> Vec<String> {
    sections_with_base(document, "SourceDisksNames")
        .flat_map(|section| section.entries())
        .filter_map(|entry| entry.key().map(str::to_string))
        .collect()
}

fn sections_with_base<'a>(
    document: &'a Document,
    base: &'a str,
) -> impl Iterator<Item = &'a crate::Section> {
    document.sections().filter(move |section| {
        let name = section.name();
        name.eq_ignore_ascii_case(base)
            || (name
                .get(..base.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(base))
                && name[base.len()..].starts_with('.'))
    })
}

fn missing_section(section: &str) -> ModelError {
    ModelError::MissingSection {
        section: section.to_string(),
    }
}

fn missing_key(section: &str, key: &str) -> ModelError {
    ModelError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, value: &str) -> ModelError {
    ModelError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const INF: &str = r#"
[Version]
Signature   = "$WINDOWS NT$"
Class       = Sample
ClassGuid   = {78A1C341-4539-11d3-B88D-00C04FAD5171}
Provider    = %ManufacturerName%
CatalogFile = ectest.cat
DriverVer   =
PnpLockdown = 1

[ClassInstall32]
Addreg = SampleClassReg

[SampleClassReg]
HKR,,,0,%ClassName%
HKR,,Icon,,-5

[SourceDisksNames]
1 = %DiskName%,,,""

[SourceDisksFiles]
ectest.sys = 1,,

[Manufacturer]
%ManufacturerName% = Standard,NT$ARCH$.10.0...16299

[Standard.NT$ARCH$.10.0...16299]
%ectest.DeviceDesc% = ectest_Device, ACPI\ETST0001

[ectest_Device.NT]
CopyFiles = Drivers_Dir

[Drivers_Dir]
ectest.sys

[ectest_Device.NT.Services]
AddService = ectest,%SPSVCINST_ASSOCSERVICE%, ectest_Service_Inst

[ectest_Service_Inst]
DisplayName    = %ectest.SVCDESC%
ServiceType    = 1
StartType      = 1
ErrorControl   = 0x1
ServiceBinary  = %12%\ectest.sys

[ectest_Device.NT.Wdf]
KmdfService = ectest, ectest_wdfsect

[ectest_wdfsect]
KmdfLibraryVersion = $KMDFVERSION$
"#;

    fn document() -> Document {
        Document::parse(INF).unwrap()
    }

    #[test]
    fn guid_parses_and_displays_canonically() {
        let guid: ClassGuid = "{78a1c341-4539-11d3-b88d-00c04fad5171}".parse().unwrap();
        assert_eq!(guid.to_string(), "{78A1C341-4539-11D3-B88D-00C04FAD5171}");
        assert_eq!(Some(guid), well_known_class_guid("sample"));
        assert_eq!(guid, guid.to_string().parse().unwrap());
    }

    #[test]
    fn malformed_guids_are_rejected() {
        for text in [
            "78a1c341-4539-11d3-b88d-00c04fad5171",
            "{78a1c341-4539-11d3-b88d00c04fad5171}",
            "{78a1c341-4539-11d3-b88d-00c04fad517}",
            "{78a1c341-4539-11d3-b88d-00c04fad517g}",
        ] {
            assert_eq!(
                text.parse::<ClassGuid>(),
                Err(ModelError::InvalidGuid(text.to_string()))
            );
        }
    }

    #[test]
    fn version_section_is_read() {
        let version = Version::from_document(&document()).unwrap();
        assert_eq!(version.signature, "$WINDOWS NT$");
        assert_eq!(version.class.as_deref(), Some("Sample"));
        assert_eq!(version.catalog_file.as_deref(), Some("ectest.cat"));
        assert_eq!(version.driver_ver, Some(Vec::new()));
        assert_eq!(version.pnp_lockdown, Some(1));
        assert_eq!(
            version.class_guid().unwrap(),
            well_known_class_guid("Sample").unwrap()
        );
    }

    #[test]
    fn missing_version_section_is_an_error() {
        assert_eq!(
            Version::from_document(&Document::parse("[Strings]\n").unwrap()),
            Err(ModelError::MissingSection {
                section: "Version".to_string()
            })
        );
    }

    #[test]
    fn models_resolve_through_manufacturer_decorations() {
        let models = models(&document()).unwrap();
        assert_eq!(
            models,
            vec![Model {
                models_section: "Standard.NT$ARCH$.10.0...16299".to_string(),
                description: "%ectest.DeviceDesc%".to_string(),
                install_section: "ectest_Device".to_string(),
                hardware_ids: vec!["ACPI\\ETST0001".to_string()],
            }]
        );
        assert_eq!(
            resolve_install_section(&document(), "ectest_Device").as_deref(),
            Some("ectest_Device.NT")
        );
    }

    #[test]
    fn services_are_read_through_add_service() {
        let services = services(&document(), "ectest_Device.NT").unwrap();
        assert_eq!(
            services,
            vec![ServiceInstall {
                name: "ectest".to_string(),
                flags: Some("%SPSVCINST_ASSOCSERVICE%".to_string()),
                section: "ectest_Service_Inst".to_string(),
                display_name: Some("%ectest.SVCDESC%".to_string()),
                service_type: ServiceType::KernelDriver,
                start_type: StartType::System,
                error_control: ErrorControl::Normal,
                service_binary: "%12%\\ectest.sys".to_string(),
            }]
        );
        assert_eq!(services[0].start_type.code(), 1);
    }

    #[test]
    fn unknown_service_codes_are_rejected() {
        let text = INF.replace("StartType      = 1", "StartType      = 9");
        let result = services(&Document::parse(&text).unwrap(), "ectest_Device.NT");
        assert_eq!(
            result,
            Err(ModelError::InvalidValue {
                section: "ectest_Service_Inst".to_string(),
                key: "StartType".to_string(),
                value: "9".to_string(),
            })
        );
    }

    #[test]
    fn each_add_service_directive_is_read_on_its_own() {
        let text = INF.replace(
            "AddService = ectest,%SPSVCINST_ASSOCSERVICE%, ectest_Service_Inst",
            "AddService = ectest,%SPSVCINST_ASSOCSERVICE%, ectest_Service_Inst\n\
             AddService = helper\n\
             AddService = filter,,filter_Service_Inst",
        );
        let entries = service_entries(&Document::parse(&text).unwrap(), "ectest_Device.NT");

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_ok());
        assert!(matches!(
            &entries[1],
            Err(ModelError::InvalidValue { key, .. }) if key == "AddService"
        ));
        assert_eq!(
            entries[2],
            Err(ModelError::MissingSection {
                section: "filter_Service_Inst".to_string()
            })
        );
    }

    #[test]
    fn kmdf_binding_and_class_install_are_read() {
        let document = document();
        assert_eq!(
            kmdf_services(&document, "ectest_Device.NT").unwrap(),
            vec![KmdfService {
                service: "ectest".to_string(),
                wdf_section: "ectest_wdfsect".to_string(),
                library_version: Some("$KMDFVERSION$".to_string()),
            }]
        );
        assert_eq!(
            class_install(&document),
            Some(ClassInstall {
                add_reg_sections: vec!["SampleClassReg".to_string()],
                class_name: Some("%ClassName%".to_string()),
                icon: Some("-5".to_string()),
            })
        );
    }

    #[test]
    fn copied_files_and_source_disks_are_read() {
        let document = document();
        assert_eq!(
            copy_files(&document, "ectest_Device.NT").unwrap(),
            vec!["ectest.sys"]
        );
        assert_eq!(
            source_disk_files(&document),
            vec![("ectest.sys".to_string(), "1".to_string())]
        );
        assert_eq!(source_disk_names(&document), vec!["1"]);
    }

    #[test]
    fn numbers_parse_in_decimal_and_hex() {
        assert_eq!(parse_number("16"), Some(16));
        assert_eq!(parse_number("0x00000002"), Some(2));
        assert_eq!(parse_number("two"), None);
    }
}

// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module contains the `ShowAction` struct, which summarizes what an INF
//! installs: its device class, the devices it matches, the services it adds
//! and the KMDF version those services bind to.

use std::{fmt, path::Path};

use ectest_inf::{Document, StringTable, model};
use mockall_double::double;
use tracing::debug;

use super::ShowActionError;
#[double]
use crate::providers::fs::Fs;

/// Human readable summary of an INF, with string tokens expanded
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InfSummary {
    pub class: Option<String>,
    pub class_guid: Option<String>,
    pub class_display_name: Option<String>,
    pub provider: Option<String>,
    pub catalog_file: Option<String>,
    pub driver_ver: Option<String>,
    pub devices: Vec<DeviceSummary>,
    pub services: Vec<ServiceSummary>,
    pub kmdf_bindings: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct DeviceSummary {
    pub description: String,
    pub hardware_ids: Vec<String>,
    pub install_section: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ServiceSummary {
    pub name: String,
    pub display_name: Option<String>,
    pub service_type: u32,
    pub start_type: u32,
    pub error_control: u32,
    pub binary: String,
}

/// Action that prints an [`InfSummary`]
pub struct ShowAction<'a> {
    path: &'a Path,

    // Injected deps
    fs: &'a Fs,
}

impl<'a> ShowAction<'a> {
    pub const fn new(path: &'a Path, fs: &'a Fs) -> Self {
        Self { path, fs }
    }

    /// Reads the file and builds its summary.
    ///
    /// # Errors
    /// * `ShowActionError::FileIo` - If the file cannot be read
    /// * `ShowActionError::Parse` - If the file is not a well formed INF
    /// * `ShowActionError::Model` - If a section the summary needs is missing
    ///   or malformed
    pub fn run(&self) -> Result<InfSummary, ShowActionError> {
        let text = self.fs.read_file_to_string(self.path)?;
        let document = Document::parse(&text)
            .map_err(|e| ShowActionError::Parse(self.path.to_path_buf(), e))?;
        summarize(&document).map_err(|e| ShowActionError::Model(self.path.to_path_buf(), e))
    }
}

fn summarize(document: &Document) -> Result<InfSummary, model::ModelError> {
    let strings = StringTable::from_document(document);
    // Undefined tokens are shown as written; `check` reports them.
    let expand = |text: &str| strings.expand(text).unwrap_or_else(|_| text.to_string());

    let version = model::Version::from_document(document)?;
    let mut summary = InfSummary {
        class: version.class.as_deref().map(expand),
        class_guid: version.class_guid().ok().map(|guid| guid.to_string()),
        class_display_name: model::class_install(document)
            .and_then(|class_install| class_install.class_name)
            .map(|name| expand(&name)),
        provider: version.provider.as_deref().map(expand),
        catalog_file: version.catalog_file.as_deref().map(expand),
        driver_ver: version
            .driver_ver
            .filter(|values| !values.is_empty())
            .map(|values| values.join(",")),
        ..InfSummary::default()
    };

    for device in model::models(document)? {
        let install_section = model::resolve_install_section(document, &device.install_section)
            .unwrap_or_else(|| device.install_section.clone());
        debug!("{} installs through [{install_section}]", device.description);

        for service in model::services(document, &install_section)? {
            summary.services.push(ServiceSummary {
                name: service.name,
                display_name: service.display_name.as_deref().map(expand),
                service_type: service.service_type.code(),
                start_type: service.start_type.code(),
                error_control: service.error_control.code(),
                binary: expand(&service.service_binary),
            });
        }
        for binding in model::kmdf_services(document, &install_section)? {
            summary.kmdf_bindings.push(format!(
                "{} -> [{}] KmdfLibraryVersion = {}",
                binding.service,
                binding.wdf_section,
                binding.library_version.as_deref().unwrap_or("(unset)")
            ));
        }

        summary.devices.push(DeviceSummary {
            description: expand(&device.description),
            hardware_ids: device.hardware_ids,
            install_section,
        });
    }

    Ok(summary)
}

impl fmt::Display for InfSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unset = "(unset)";
        writeln!(
            f,
            "Class:       {} {}",
            self.class.as_deref().unwrap_or(unset),
            self.class_guid.as_deref().unwrap_or(unset)
        )?;
        if let Some(display_name) = &self.class_display_name {
            writeln!(f, "Class name:  {display_name}")?;
        }
        writeln!(f, "Provider:    {}", self.provider.as_deref().unwrap_or(unset))?;
        writeln!(f, "CatalogFile: {}", self.catalog_file.as_deref().unwrap_or(unset))?;
        writeln!(f, "DriverVer:   {}", self.driver_ver.as_deref().unwrap_or(unset))?;
        for device in &self.devices {
            writeln!(
                f,
                "Device:      {} [{}] {}",
                device.description,
                device.install_section,
                device.hardware_ids.join(", ")
            )?;
        }
        for service in &self.services {
            writeln!(
                f,
                "Service:     {} ({}) type={} start={} error={} binary={}",
                service.name,
                service.display_name.as_deref().unwrap_or(unset),
                service.service_type,
                service.start_type,
                service.error_control,
                service.binary
            )?;
        }
        for binding in &self.kmdf_bindings {
            writeln!(f, "KMDF:        {binding}")?;
        }
        Ok(())
    }
}

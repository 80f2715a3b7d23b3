// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Consistency checks over a driver package's install descriptors.
//!
//! [`validate`] checks one descriptor on its own; [`validate_package`] also
//! checks that every descriptor of a package agrees on its class GUID.

use std::{collections::HashSet, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::{
    Document,
    StringTable,
    model::{self, ClassGuid, ErrorControl, ModelError, ServiceType, StartType, Version},
    strings,
};

static DRIVER_VER_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("regex should be valid"));
static DRIVER_VER_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+){0,3}$").expect("regex should be valid"));
static KMDF_LIBRARY_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$KMDFVERSION\$|\d+\.\d+)$").expect("regex should be valid"));

const SIGNATURES: [&str; 2] = ["$WINDOWS NT$", "$Chicago$"];

/// How much a [`Diagnostic`] matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The package installs, but something is likely wrong
    Warning,
    /// The package will not install as intended
    Error,
}

/// What a [`Diagnostic`] is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A section cannot be found
    MissingSection,
    /// `[Version]` problems other than the class and catalog
    Version,
    /// `Class`/`ClassGuid` missing, malformed or inconsistent
    Class,
    /// `CatalogFile` missing or misnamed
    CatalogFile,
    /// Manufacturer, models or install section problems
    Models,
    /// The expected hardware id is not matched by any model
    HardwareId,
    /// A service install section is incomplete or invalid
    Service,
    /// A service differs from the expected registration
    ServicePolicy,
    /// A `%Token%` has no string
    StringToken,
    /// KMDF binding problems
    Kmdf,
    /// A copied file has no source disk
    SourceFiles,
    /// `DriverVer` is malformed
    DriverVer,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How much the finding matters
    pub severity: Severity,
    /// What the finding is about
    pub kind: DiagnosticKind,
    /// Human readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}: {}", self.message)
    }
}

/// The findings of a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// All findings, in the order they were made
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` when any finding is an [`Severity::Error`]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Returns `true` when there are no findings at all
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Findings of the given kind
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.kind == kind)
    }

    fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Error, kind, message.into());
    }

    fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Severity::Warning, kind, message.into());
    }

    fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: String) {
        debug!("{severity:?} ({kind:?}): {message}");
        self.diagnostics.push(Diagnostic {
            severity,
            kind,
            message,
        });
    }

    fn model_error(&mut self, kind: DiagnosticKind, error: &ModelError) {
        let kind = if matches!(error, ModelError::MissingSection { .. }) {
            DiagnosticKind::MissingSection
        } else {
            kind
        };
        self.error(kind, error.to_string());
    }
}

/// The service registration a package is expected to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePolicy {
    /// Expected `ServiceType`
    pub service_type: ServiceType,
    /// Expected `StartType`
    pub start_type: StartType,
    /// Expected `ErrorControl`
    pub error_control: ErrorControl,
}

impl ServicePolicy {
    /// `SERVICE_KERNEL_DRIVER`, `SERVICE_SYSTEM_START`, `SERVICE_ERROR_NORMAL`
    pub const KERNEL_DRIVER_AT_SYSTEM_START: Self = Self {
        service_type: ServiceType::KernelDriver,
        start_type: StartType::System,
        error_control: ErrorControl::Normal,
    };
}

impl fmt::Display for ServicePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.service_type.code(),
            self.start_type.code(),
            self.error_control.code()
        )
    }
}

/// Error returned when a `ServiceType/StartType/ErrorControl` triple does
/// not parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid service policy {0}, expected ServiceType/StartType/ErrorControl codes such as 1/1/1"
)]
pub struct ParseServicePolicyError(String);

impl FromStr for ServicePolicy {
    type Err = ParseServicePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseServicePolicyError(s.to_string());
        let mut codes = s.split('/').map(model::parse_number);
        let (Some(Some(service_type)), Some(Some(start_type)), Some(Some(error_control)), None) =
            (codes.next(), codes.next(), codes.next(), codes.next())
        else {
            return Err(error());
        };
        Ok(Self {
            service_type: ServiceType::try_from(service_type).map_err(|_| error())?,
            start_type: StartType::try_from(start_type).map_err(|_| error())?,
            error_control: ErrorControl::try_from(error_control).map_err(|_| error())?,
        })
    }
}

/// Package specific expectations checked in addition to the general rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectations {
    /// Crate or package name; the catalog must be `<package_name>.cat` with
    /// `-` replaced by `_`
    pub package_name: Option<String>,
    /// Hardware id at least one model must match
    pub hardware_id: Option<String>,
    /// Registration every service must make
    pub service: Option<ServicePolicy>,
}

/// Checks a single descriptor.
#[must_use]
pub fn validate(document: &Document, expectations: &Expectations) -> Report {
    let mut report = Report::default();
    let strings = StringTable::from_document(document);

    check_version(document, expectations, &mut report);
    check_string_tokens(document, &strings, &mut report);

    let install_sections = check_models(document, expectations, &mut report);
    for install_section in &install_sections {
        check_services(document, install_section, expectations, &mut report);
        check_kmdf(document, install_section, &mut report);
    }
    check_source_files(document, &install_sections, &mut report);

    report
}

/// Checks every descriptor of a package, then checks that they all declare
/// the same class GUID. Returns one report per descriptor plus a trailing
/// report for the cross-descriptor check.
#[must_use]
pub fn validate_package(
    documents: &[(&str, &Document)],
    expectations: &Expectations,
) -> Vec<Report> {
    let mut reports: Vec<Report> = documents
        .iter()
        .map(|(_, document)| validate(document, expectations))
        .collect();

    let mut package = Report::default();
    let mut first: Option<(&str, ClassGuid)> = None;
    for (name, document) in documents {
        let Ok(guid) = Version::from_document(document).and_then(|version| version.class_guid())
        else {
            continue;
        };
        match first {
            None => first = Some((name, guid)),
            Some((first_name, first_guid)) if first_guid != guid => package.error(
                DiagnosticKind::Class,
                format!(
                    "ClassGuid {guid} in {name} does not match ClassGuid {first_guid} in \
                     {first_name}"
                ),
            ),
            Some(_) => {}
        }
    }
    reports.push(package);
    reports
}

fn check_version(document: &Document, expectations: &Expectations, report: &mut Report) {
    let version = match Version::from_document(document) {
        Ok(version) => version,
        Err(error) => {
            report.model_error(DiagnosticKind::Version, &error);
            return;
        }
    };

    if !SIGNATURES
        .iter()
        .any(|signature| signature.eq_ignore_ascii_case(&version.signature))
    {
        report.error(
            DiagnosticKind::Version,
            format!("unsupported Signature: {}", version.signature),
        );
    }

    match (&version.class, version.class_guid()) {
        (None, Ok(_)) => report.error(DiagnosticKind::Class, "[Version] is missing Class"),
        (None, Err(error)) => {
            report.error(DiagnosticKind::Class, "[Version] is missing Class");
            report.model_error(DiagnosticKind::Class, &error);
        }
        (Some(_), Err(error)) => report.model_error(DiagnosticKind::Class, &error),
        (Some(class), Ok(guid)) => {
            match model::well_known_class_guid(class) {
                Some(expected) if expected != guid => report.error(
                    DiagnosticKind::Class,
                    format!("Class {class} requires ClassGuid {expected}, found {guid}"),
                ),
                _ => {}
            }
        }
    }

    match version.catalog_file.as_deref().filter(|c| !c.is_empty()) {
        None => report.error(DiagnosticKind::CatalogFile, "[Version] is missing CatalogFile"),
        Some(catalog) => {
            if !catalog.to_ascii_lowercase().ends_with(".cat") {
                report.error(
                    DiagnosticKind::CatalogFile,
                    format!("CatalogFile {catalog} does not end in .cat"),
                );
            }
            if let Some(package_name) = &expectations.package_name {
                let expected = format!("{}.cat", package_name.replace('-', "_"));
                if !catalog.eq_ignore_ascii_case(&expected) {
                    report.error(
                        DiagnosticKind::CatalogFile,
                        format!("CatalogFile is {catalog}, expected {expected}"),
                    );
                }
            }
        }
    }

    if let Some(driver_ver) = &version.driver_ver {
        let valid = match driver_ver.as_slice() {
            [] => true,
            [date] => DRIVER_VER_DATE.is_match(date),
            [date, version] => {
                DRIVER_VER_DATE.is_match(date) && DRIVER_VER_VERSION.is_match(version)
            }
            _ => false,
        };
        if !valid {
            report.warning(
                DiagnosticKind::DriverVer,
                format!(
                    "DriverVer {} is not in mm/dd/yyyy[,w.x.y.z] format",
                    driver_ver.join(",")
                ),
            );
        }
    }
}

fn check_string_tokens(document: &Document, strings: &StringTable, report: &mut Report) {
    let mut reported = HashSet::new();
    let sections = document.sections().filter(|section| {
        let name = section.name().to_ascii_lowercase();
        name != "strings" && !name.starts_with("strings.")
    });

    for section in sections {
        for entry in section.entries() {
            let texts = entry.key().into_iter().chain(entry.values().iter().map(String::as_str));
            for text in texts {
                match strings::tokens(text) {
                    Ok(tokens) => {
                        for token in tokens {
                            if strings.get(token).is_none()
                                && reported.insert(token.to_ascii_lowercase())
                            {
                                report.error(
                                    DiagnosticKind::StringToken,
                                    format!(
                                        "%{token}% in [{}] is not defined in [Strings]",
                                        section.name()
                                    ),
                                );
                            }
                        }
                    }
                    Err(error) => report.error(
                        DiagnosticKind::StringToken,
                        format!("[{}]: {error}", section.name()),
                    ),
                }
            }
        }
    }
}

/// Checks manufacturers and models and returns the resolved install sections.
fn check_models(
    document: &Document,
    expectations: &Expectations,
    report: &mut Report,
) -> Vec<String> {
    let manufacturers = match model::manufacturers(document) {
        Ok(manufacturers) => manufacturers,
        Err(error) => {
            report.model_error(DiagnosticKind::Models, &error);
            return Vec::new();
        }
    };

    let mut install_sections = Vec::new();
    let mut hardware_id_found = false;
    for models_section in manufacturers
        .iter()
        .flat_map(|manufacturer| &manufacturer.models_sections)
    {
        let models = match model::models_in(document, models_section) {
            Ok(models) => models,
            Err(error) => {
                report.model_error(DiagnosticKind::Models, &error);
                continue;
            }
        };

        for model in models {
            if let Some(expected) = &expectations.hardware_id {
                hardware_id_found |= model
                    .hardware_ids
                    .iter()
                    .any(|id| id.eq_ignore_ascii_case(expected));
            }
            if model.hardware_ids.is_empty() {
                report.warning(
                    DiagnosticKind::Models,
                    format!(
                        "model {} in [{}] lists no hardware id",
                        model.description, model.models_section
                    ),
                );
            }
            match model::resolve_install_section(document, &model.install_section) {
                Some(section) => {
                    if !install_sections.contains(&section) {
                        install_sections.push(section);
                    }
                }
                None => report.error(
                    DiagnosticKind::MissingSection,
                    format!(
                        "install section {} for model {} does not exist",
                        model.install_section, model.description
                    ),
                ),
            }
        }
    }

    if let (Some(expected), false) = (&expectations.hardware_id, hardware_id_found) {
        report.error(
            DiagnosticKind::HardwareId,
            format!("no model matches hardware id {expected}"),
        );
    }

    install_sections
}

fn check_services(
    document: &Document,
    install_section: &str,
    expectations: &Expectations,
    report: &mut Report,
) {
    for entry in model::service_entries(document, install_section) {
        let service = match entry {
            Ok(service) => service,
            Err(error) => {
                report.model_error(DiagnosticKind::Service, &error);
                continue;
            }
        };
        let Some(policy) = expectations.service else {
            continue;
        };
        let actual = ServicePolicy {
            service_type: service.service_type,
            start_type: service.start_type,
            error_control: service.error_control,
        };
        if actual != policy {
            report.error(
                DiagnosticKind::ServicePolicy,
                format!(
                    "service {} registers ServiceType={} StartType={} ErrorControl={}, expected \
                     ServiceType={} StartType={} ErrorControl={}",
                    service.name,
                    actual.service_type.code(),
                    actual.start_type.code(),
                    actual.error_control.code(),
                    policy.service_type.code(),
                    policy.start_type.code(),
                    policy.error_control.code(),
                ),
            );
        }
    }
}

fn check_kmdf(document: &Document, install_section: &str, report: &mut Report) {
    let bindings = match model::kmdf_services(document, install_section) {
        Ok(bindings) => bindings,
        Err(error) => {
            report.model_error(DiagnosticKind::Kmdf, &error);
            return;
        }
    };

    for binding in bindings {
        if !document.has_section(&binding.wdf_section) {
            report.error(
                DiagnosticKind::MissingSection,
                format!(
                    "KmdfService {} names missing section [{}]",
                    binding.service, binding.wdf_section
                ),
            );
            continue;
        }
        match binding.library_version.as_deref() {
            None => report.error(
                DiagnosticKind::Kmdf,
                format!("[{}] is missing KmdfLibraryVersion", binding.wdf_section),
            ),
            Some(version) if !KMDF_LIBRARY_VERSION.is_match(version) => report.error(
                DiagnosticKind::Kmdf,
                format!(
                    "[{}] KmdfLibraryVersion {version} is neither $KMDFVERSION$ nor major.minor",
                    binding.wdf_section
                ),
            ),
            Some(_) => {}
        }
    }
}

fn check_source_files(document: &Document, install_sections: &[String], report: &mut Report) {
    let source_files = model::source_disk_files(document);
    let disks = model::source_disk_names(document);

    let mut checked = HashSet::new();
    for install_section in install_sections {
        let files = match model::copy_files(document, install_section) {
            Ok(files) => files,
            Err(error) => {
                report.model_error(DiagnosticKind::SourceFiles, &error);
                continue;
            }
        };
        for file in files {
            if !checked.insert(file.to_ascii_lowercase()) {
                continue;
            }
            match source_files
                .iter()
                .find(|(source, _)| source.eq_ignore_ascii_case(&file))
            {
                None => report.error(
                    DiagnosticKind::SourceFiles,
                    format!("{file} is copied but not listed in [SourceDisksFiles]"),
                ),
                Some((_, disk)) if !disks.iter().any(|id| id == disk) => report.error(
                    DiagnosticKind::SourceFiles,
                    format!("{file} is on disk {disk}, which [SourceDisksNames] does not define"),
                ),
                Some(_) => {}
            }
        }
    }
}

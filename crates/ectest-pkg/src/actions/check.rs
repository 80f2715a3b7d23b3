// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module contains the `CheckAction` struct, which parses every INF of a
//! driver package, validates each of them and then checks that they agree with
//! each other.

use std::path::{Path, PathBuf};

use ectest_inf::{Document, Expectations, Report, ServicePolicy, Severity, validate_package};
use mockall_double::double;
use tracing::{debug, error as err, info, warn};

use super::CheckActionError;
#[double]
use crate::providers::fs::Fs;

pub struct CheckActionParams<'a> {
    pub inf_paths: &'a [PathBuf],
    pub hardware_id: Option<&'a str>,
    pub package_name: Option<&'a str>,
    pub service_policy: Option<ServicePolicy>,
}

/// Action that validates the INF files of a driver package
pub struct CheckAction<'a> {
    inf_paths: &'a [PathBuf],
    expectations: Expectations,

    // Injected deps
    fs: &'a Fs,
}

impl<'a> CheckAction<'a> {
    pub fn new(params: &CheckActionParams<'a>, fs: &'a Fs) -> Self {
        Self {
            inf_paths: params.inf_paths,
            expectations: Expectations {
                package_name: params.package_name.map(str::to_string),
                hardware_id: params.hardware_id.map(str::to_string),
                service: params.service_policy,
            },
            fs,
        }
    }

    /// Validates every file, logging each diagnostic.
    ///
    /// # Errors
    /// * `CheckActionError::NoInputFiles` - If no files were given
    /// * `CheckActionError::FileIo` - If a file cannot be read
    /// * `CheckActionError::Parse` - If a file is not a well formed INF
    /// * `CheckActionError::InvalidPackage` - If any error diagnostic was
    ///   reported
    pub fn run(&self) -> Result<(), CheckActionError> {
        if self.inf_paths.is_empty() {
            return Err(CheckActionError::NoInputFiles);
        }

        let mut documents = Vec::with_capacity(self.inf_paths.len());
        for path in self.inf_paths {
            let text = self.fs.read_file_to_string(path)?;
            let document =
                Document::parse(&text).map_err(|e| CheckActionError::Parse(path.clone(), e))?;
            documents.push((path.display().to_string(), document));
        }

        let named: Vec<(&str, &Document)> = documents
            .iter()
            .map(|(name, document)| (name.as_str(), document))
            .collect();
        let reports = validate_package(&named, &self.expectations);

        let mut errors = 0;
        let mut warnings = 0;
        let package_label = Path::new("package");
        let labels = self
            .inf_paths
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(package_label));
        for (label, report) in labels.zip(&reports) {
            let (file_errors, file_warnings) = log_report(label, report);
            errors += file_errors;
            warnings += file_warnings;
        }

        if errors > 0 {
            return Err(CheckActionError::InvalidPackage { errors, warnings });
        }
        info!(
            "{} INF file(s) valid with {warnings} warning(s)",
            self.inf_paths.len()
        );
        Ok(())
    }
}

/// Logs each diagnostic of `report` and returns the error and warning counts.
fn log_report(label: &Path, report: &Report) -> (usize, usize) {
    if report.is_clean() {
        debug!("{}: no findings", label.display());
    }
    let mut counts = (0, 0);
    for diagnostic in report.diagnostics() {
        match diagnostic.severity {
            Severity::Error => {
                err!("{}: {}", label.display(), diagnostic.message);
                counts.0 += 1;
            }
            Severity::Warning => {
                warn!("{}: {}", label.display(), diagnostic.message);
                counts.1 += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::providers::error::FileError;

    const VALID_INF: &str = r#"[Version]
Signature   = "$WINDOWS NT$"
Class       = System
ClassGuid   = {4d36e97d-e325-11ce-bfc1-08002be10318}
Provider    = %ManufacturerName%
CatalogFile = ectest.cat

[SourceDisksNames]
1 = %DiskName%,,,""

[SourceDisksFiles]
ectest.sys = 1,,

[Manufacturer]
%ManufacturerName% = Standard,NTamd64

[Standard.NTamd64]
%DeviceDesc% = ectest_Device, ACPI\ETST0001

[ectest_Device.NT]
CopyFiles = @ectest.sys

[Strings]
ManufacturerName = "Contoso"
DiskName = "Disk"
DeviceDesc = "ectest Device"
"#;

    fn mock_fs(files: Vec<(PathBuf, String)>) -> Fs {
        let mut fs = Fs::default();
        for (path, contents) in files {
            fs.expect_read_file_to_string()
                .with(eq(path))
                .once()
                .returning(move |_| Ok(contents.clone()));
        }
        fs
    }

    #[test]
    fn given_a_valid_inf_when_checked_with_matching_expectations_then_it_succeeds() {
        let paths = vec![PathBuf::from("ectest.inf")];
        let fs = mock_fs(vec![(paths[0].clone(), VALID_INF.to_string())]);

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: Some("ACPI\\ETST0001"),
                package_name: Some("ectest"),
                service_policy: Some(ServicePolicy::KERNEL_DRIVER_AT_SYSTEM_START),
            },
            &fs,
        );

        assert!(action.run().is_ok());
    }

    #[test]
    fn given_a_wrong_hardware_id_when_checked_then_package_is_invalid() {
        let paths = vec![PathBuf::from("ectest.inf")];
        let fs = mock_fs(vec![(paths[0].clone(), VALID_INF.to_string())]);

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: Some("ACPI\\ETST0002"),
                package_name: None,
                service_policy: None,
            },
            &fs,
        );

        assert!(matches!(
            action.run(),
            Err(CheckActionError::InvalidPackage {
                errors: 1,
                warnings: 0
            })
        ));
    }

    #[test]
    fn given_two_infs_with_different_class_guids_when_checked_then_package_is_invalid() {
        let paths = vec![PathBuf::from("a.inf"), PathBuf::from("b.inf")];
        let other = VALID_INF
            .replace("Class       = System", "Class       = Sample")
            .replace(
                "{4d36e97d-e325-11ce-bfc1-08002be10318}",
                "{78A1C341-4539-11d3-B88D-00C04FAD5171}",
            );
        let fs = mock_fs(vec![
            (paths[0].clone(), VALID_INF.to_string()),
            (paths[1].clone(), other),
        ]);

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: None,
                package_name: None,
                service_policy: None,
            },
            &fs,
        );

        assert!(matches!(
            action.run(),
            Err(CheckActionError::InvalidPackage { errors: 1, .. })
        ));
    }

    #[test]
    fn given_a_malformed_inf_when_checked_then_parse_error_names_the_file() {
        let paths = vec![PathBuf::from("broken.inf")];
        let fs = mock_fs(vec![(paths[0].clone(), "[Version\n".to_string())]);

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: None,
                package_name: None,
                service_policy: None,
            },
            &fs,
        );

        match action.run() {
            Err(CheckActionError::Parse(path, _)) => assert_eq!(path, paths[0]),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn given_a_missing_file_when_checked_then_file_error_is_returned() {
        let paths = vec![PathBuf::from("missing.inf")];
        let mut fs = Fs::default();
        fs.expect_read_file_to_string()
            .once()
            .returning(|path| Err(FileError::NotFound(path.to_path_buf())));

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: None,
                package_name: None,
                service_policy: None,
            },
            &fs,
        );

        assert!(matches!(
            action.run(),
            Err(CheckActionError::FileIo(FileError::NotFound(_)))
        ));
    }

    #[test]
    fn given_no_files_when_checked_then_it_fails() {
        let fs = Fs::default();
        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &[],
                hardware_id: None,
                package_name: None,
                service_policy: None,
            },
            &fs,
        );

        assert!(matches!(action.run(), Err(CheckActionError::NoInputFiles)));
    }

    #[test]
    fn given_a_service_registered_as_a_demand_start_process_when_checked_then_package_is_invalid() {
        let paths = vec![PathBuf::from("ectest.inf")];
        let inf = VALID_INF.replace(
            "[Strings]",
            "[ectest_Device.NT.Services]\n\
             AddService = ectest,0x00000002,ectest_Service_Inst\n\n\
             [ectest_Service_Inst]\n\
             ServiceType    = 16\n\
             StartType      = 3\n\
             ErrorControl   = 3\n\
             ServiceBinary  = %12%\\ectest.sys\n\n\
             [Strings]",
        );
        let fs = mock_fs(vec![(paths[0].clone(), inf)]);

        let action = CheckAction::new(
            &CheckActionParams {
                inf_paths: &paths,
                hardware_id: None,
                package_name: None,
                service_policy: Some(ServicePolicy::KERNEL_DRIVER_AT_SYSTEM_START),
            },
            &fs,
        );

        assert!(matches!(
            action.run(),
            Err(CheckActionError::InvalidPackage {
                errors: 1,
                warnings: 0
            })
        ));
    }
}

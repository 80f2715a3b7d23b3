// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Checks the install descriptor shipped with the `ectest` driver.

use chrono::NaiveDate;
use ectest_inf::{
    Arch,
    Document,
    Expectations,
    StampOptions,
    StringTable,
    config::{DriverVersion, KmdfVersion},
    model::{self, ClassGuid, ErrorControl, ServiceType, StartType},
    stamp,
    stamp_text,
    validate,
    validate::ServicePolicy,
};
use pretty_assertions::assert_eq;

const ECTEST_INX: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../drivers/ectest/ectest.inx"
));

fn ectest_expectations() -> Expectations {
    Expectations {
        package_name: Some("ectest".to_string()),
        hardware_id: Some("ACPI\\ETST0001".to_string()),
        service: Some(ServicePolicy {
            service_type: ServiceType::KernelDriver,
            start_type: StartType::System,
            error_control: ErrorControl::Normal,
        }),
    }
}

fn stamp_options(arch: Arch) -> StampOptions {
    StampOptions {
        arch,
        kmdf_version: Some(KmdfVersion {
            major: 1,
            minor: 33,
        }),
        driver_version: DriverVersion::from_crate_version(0, 1, 0),
        date: NaiveDate::from_ymd_opt(2026, 10, 19).expect("date should be valid"),
        catalog_file: None,
    }
}

#[test]
fn given_shipped_inx_when_validated_then_no_diagnostics() {
    let document = Document::parse(ECTEST_INX).expect("ectest.inx should parse");
    let report = validate(&document, &ectest_expectations());
    assert!(report.is_clean(), "{:#?}", report.diagnostics());
}

#[test]
fn given_shipped_inx_when_serialized_then_parses_to_same_document() {
    let document = Document::parse(ECTEST_INX).expect("ectest.inx should parse");
    let serialized = document.to_string();
    let reparsed = Document::parse(&serialized).expect("serialized ectest.inx should parse");

    assert_eq!(reparsed, document);
    assert_eq!(reparsed.to_string(), serialized);
}

#[test]
fn given_shipped_inx_then_class_matches_sample_class() {
    let document = Document::parse(ECTEST_INX).expect("ectest.inx should parse");
    let version = model::Version::from_document(&document).expect("[Version] should be valid");

    assert_eq!(version.class.as_deref(), Some("Sample"));
    assert_eq!(
        version.class_guid().expect("ClassGuid should parse"),
        "{78A1C341-4539-11D3-B88D-00C04FAD5171}"
            .parse::<ClassGuid>()
            .expect("GUID literal should parse")
    );
    assert_eq!(version.catalog_file.as_deref(), Some("ectest.cat"));

    let class_install = model::class_install(&document).expect("[ClassInstall32] should exist");
    let strings = StringTable::from_document(&document);
    let class_name = class_install.class_name.expect("class name should be registered");
    assert_eq!(strings.expand(&class_name).as_deref(), Ok("Samples"));
    assert_eq!(class_install.icon.as_deref(), Some("-5"));
}

#[test]
fn given_shipped_inx_then_service_and_kmdf_binding_are_registered() {
    let document = Document::parse(ECTEST_INX).expect("ectest.inx should parse");
    let models = model::models(&document).expect("models should resolve");
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].hardware_ids, vec!["ACPI\\ETST0001".to_string()]);

    let install = model::resolve_install_section(&document, &models[0].install_section)
        .expect("install section should exist");
    assert_eq!(install, "ectest_Device.NT");

    let services = model::services(&document, &install).expect("services should be valid");
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].name, "ectest");
    assert_eq!(services[0].service_binary, "%12%\\ectest.sys");

    let kmdf = model::kmdf_services(&document, &install).expect("KMDF binding should be valid");
    assert_eq!(kmdf.len(), 1);
    assert_eq!(kmdf[0].library_version.as_deref(), Some("$KMDFVERSION$"));

    assert_eq!(
        model::copy_files(&document, &install).expect("copy files should resolve"),
        vec!["ectest.sys".to_string()]
    );
}

#[test]
fn given_shipped_inx_when_stamped_for_each_arch_then_result_still_validates() {
    let template = Document::parse(ECTEST_INX).expect("ectest.inx should parse");

    for arch in [Arch::Amd64, Arch::Arm64, Arch::X86] {
        let stamped = stamp(&template, &stamp_options(arch)).expect("stamping should succeed");
        let report = validate(&stamped, &ectest_expectations());
        assert!(report.is_clean(), "{arch}: {:#?}", report.diagnostics());

        assert!(stamped.has_section(&format!("Standard.NT{arch}.10.0...16299")));
        assert_eq!(stamped.value("ectest_wdfsect", "KmdfLibraryVersion"), Some("1.33"));
        assert_eq!(
            stamped
                .entry("Version", "DriverVer")
                .expect("DriverVer should be set")
                .values(),
            &["10/19/2026", "0.1.0.0"]
        );
    }
}

#[test]
fn given_shipped_inx_text_when_stamped_then_no_placeholders_remain() {
    let stamped =
        stamp_text(ECTEST_INX, &stamp_options(Arch::Arm64)).expect("stamping should succeed");

    assert!(!stamped.contains("$ARCH$"));
    assert!(!stamped.contains("$KMDFVERSION$"));
    assert!(stamped.contains("[Standard.NTarm64.10.0...16299]"));
}

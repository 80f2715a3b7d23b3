// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! `ectest` is a minimal KMDF driver for the `ACPI\ETST0001` test device. It
//! registers with the framework in [`driver_entry`] and creates a bare device
//! object for every matching device in `evt_device_add`.

#![no_std]

extern crate alloc;

#[cfg(not(test))]
extern crate wdk_panic;

use alloc::string::String;
use core::slice;

use static_assertions::const_assert;
use wdk::println;
#[cfg(not(test))]
use wdk_alloc::WdkAllocator;
use wdk_sys::{
    macros::call_unsafe_wdf_function_binding,
    DRIVER_OBJECT,
    NT_SUCCESS,
    NTSTATUS,
    PCUNICODE_STRING,
    PDRIVER_OBJECT,
    ULONG,
    WDFDEVICE,
    WDFDEVICE_INIT,
    WDFDRIVER,
    WDF_DRIVER_CONFIG,
    WDF_NO_HANDLE,
    WDF_NO_OBJECT_ATTRIBUTES,
};

#[cfg(not(test))]
#[global_allocator]
static GLOBAL_ALLOCATOR: WdkAllocator = WdkAllocator;

/// `DriverEntry` function required by WDF
///
/// Registers `evt_device_add` with the framework and returns the status of
/// `WdfDriverCreate` unchanged.
///
/// # Safety
/// Function is unsafe since it dereferences raw pointers passed to it from WDF
#[export_name = "DriverEntry"] // WDF expects a symbol with the name DriverEntry
pub unsafe extern "system" fn driver_entry(
    driver: &mut DRIVER_OBJECT,
    registry_path: PCUNICODE_STRING,
) -> NTSTATUS {
    let mut driver_config = {
        // const_assert required since clippy::cast_possible_truncation must be silenced because of a false positive (since it currently doesn't handle checking compile-time constants): https://github.com/rust-lang/rust-clippy/issues/9613
        const WDF_DRIVER_CONFIG_SIZE: usize = core::mem::size_of::<WDF_DRIVER_CONFIG>();
        const_assert!(WDF_DRIVER_CONFIG_SIZE <= ULONG::MAX as usize);
        // truncation not possible because of above const_assert
        #[allow(clippy::cast_possible_truncation)]
        let wdf_driver_config_size = WDF_DRIVER_CONFIG_SIZE as ULONG;

        WDF_DRIVER_CONFIG {
            Size: wdf_driver_config_size,
            EvtDriverDeviceAdd: Some(evt_device_add),
            ..WDF_DRIVER_CONFIG::default()
        }
    };

    let driver_handle_output = WDF_NO_HANDLE.cast::<WDFDRIVER>();

    // SAFETY: `driver` and `registry_path` are the pointers WDF passed to
    // `DriverEntry`, and `driver_config` outlives the call.
    let ntstatus = unsafe {
        call_unsafe_wdf_function_binding!(
            WdfDriverCreate,
            driver as PDRIVER_OBJECT,
            registry_path,
            WDF_NO_OBJECT_ATTRIBUTES,
            &mut driver_config,
            driver_handle_output,
        )
    };

    // SAFETY: the framework passes a valid, non-null UNICODE_STRING
    let registry_path = unsafe { &*registry_path };
    // SAFETY: `Buffer` holds `Length` bytes of UTF-16
    let registry_path = String::from_utf16_lossy(unsafe {
        slice::from_raw_parts(
            registry_path.Buffer,
            usize::from(registry_path.Length) / core::mem::size_of::<u16>(),
        )
    });

    println!("ectest DriverEntry complete. Registry path: {registry_path}");
    if !NT_SUCCESS(ntstatus) {
        println!("WdfDriverCreate failed: {ntstatus:#010x}");
    }

    ntstatus
}

extern "C" fn evt_device_add(_driver: WDFDRIVER, mut device_init: *mut WDFDEVICE_INIT) -> NTSTATUS {
    println!("ectest EvtDeviceAdd entered");

    let mut device_handle_output: WDFDEVICE = WDF_NO_HANDLE.cast();

    // SAFETY: `device_init` is the framework allocated init structure for this
    // device and is only consumed by `WdfDeviceCreate`.
    let ntstatus = unsafe {
        call_unsafe_wdf_function_binding!(
            WdfDeviceCreate,
            &mut device_init,
            WDF_NO_OBJECT_ATTRIBUTES,
            &mut device_handle_output,
        )
    };

    if !NT_SUCCESS(ntstatus) {
        println!("WdfDeviceCreate failed: {ntstatus:#010x}");
    }

    ntstatus
}

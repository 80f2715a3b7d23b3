// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! [`ectest-ec`] reads the embedded controller behind the `ectest` device:
//! fan and thermal state, the battery's `_BST`/`_BIX` data and the ACPI time
//! and alarm device. Every reading goes through [`Source`], which is
//! implemented by [`mock::Mock`] for demos and tests. [`frame`] and
//! [`serial`] carry requests to a real controller over a serial link using
//! SMBus, MCTP and ODP framing.

use thiserror::Error;

pub mod battery;
pub mod frame;
pub mod mock;
pub mod rtc;
pub mod serial;
pub mod snapshot;

pub use frame::{Destination, FrameError, Reassembler, Response};
pub use snapshot::Snapshot;

/// Errors that could result from reading the embedded controller
#[derive(Debug, Error)]
pub enum Error {
    /// A packet did not have the expected shape
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The serial link failed
    #[error("Serial error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fan thresholds the thermal policy switches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Threshold {
    /// Temperature at which the fan turns on
    On,
    /// Temperature at which the fan starts ramping
    Ramping,
    /// Temperature at which the fan runs at full speed
    Max,
}

/// Everything that can be read from or written to the embedded controller.
///
/// Temperatures are in degrees Celsius and fan speeds in RPM. The RTC methods
/// mirror the ACPI time and alarm device control methods named in their docs.
#[cfg_attr(test, mockall::automock)]
pub trait Source {
    /// Current sensor temperature
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn temperature(&self) -> Result<f64, Error>;

    /// Current fan speed
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn rpm(&self) -> Result<f64, Error>;

    /// Lowest fan speed
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn min_rpm(&self) -> Result<f64, Error>;

    /// Highest fan speed
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn max_rpm(&self) -> Result<f64, Error>;

    /// Temperature of a fan threshold
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn threshold(&self, threshold: Threshold) -> Result<f64, Error>;

    /// Sets the fan speed
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn set_rpm(&self, rpm: f64) -> Result<(), Error>;

    /// Battery status, `_BST`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn bst(&self) -> Result<battery::BstData, Error>;

    /// Battery information, `_BIX`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn bix(&self) -> Result<battery::BixData, Error>;

    /// Sets the battery trip point, `_BTP`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn set_btp(&self, trip_point: u32) -> Result<(), Error>;

    /// Time and alarm device capabilities, `_GCP`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn capabilities(&self) -> Result<rtc::Capabilities, Error>;

    /// Current time, `_GRT`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn real_time(&self) -> Result<rtc::Timestamp, Error>;

    /// Wake status of a timer, `_GWS`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn wake_status(&self, timer: rtc::TimerId) -> Result<rtc::TimerStatus, Error>;

    /// What happens when a timer expires on the other power source, `_TIP`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn expired_timer_wake_policy(&self, timer: rtc::TimerId) -> Result<rtc::WakePolicy, Error>;

    /// Seconds left on a timer, `_TIV`
    ///
    /// # Errors
    /// Returns an error if the controller cannot be reached.
    fn timer_value(&self, timer: rtc::TimerId) -> Result<rtc::TimerSeconds, Error>;
}

/// Converts tenths of a Kelvin, as ACPI reports temperatures, to Celsius.
#[must_use]
pub fn deci_kelvin_to_celsius(deci_kelvin: u32) -> f64 {
    (f64::from(deci_kelvin) - 2732.0) / 10.0
}

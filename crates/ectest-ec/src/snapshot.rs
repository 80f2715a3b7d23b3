// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! One reading of everything a [`Source`] exposes, printable as a report.

use std::fmt;

use crate::{
    Error,
    Source,
    Threshold,
    battery::{BixData, BstData},
    rtc::{Capabilities, TimerId, TimerSeconds, TimerStatus, Timestamp, WakePolicy},
};

/// Fan and thermal readings, in °C and RPM
#[derive(Debug)]
pub struct Thermal {
    /// Sensor temperature
    pub temperature: Result<f64, Error>,
    /// Fan speed
    pub rpm: Result<f64, Error>,
    /// Lowest fan speed
    pub min_rpm: Result<f64, Error>,
    /// Highest fan speed
    pub max_rpm: Result<f64, Error>,
    /// On, ramping and max thresholds
    pub thresholds: [(Threshold, Result<f64, Error>); 3],
}

/// State of one alarm timer
#[derive(Debug)]
pub struct Timer {
    /// Which timer
    pub id: TimerId,
    /// `_TIV`
    pub value: Result<TimerSeconds, Error>,
    /// `_TIP`
    pub wake_policy: Result<WakePolicy, Error>,
    /// `_GWS`
    pub status: Result<TimerStatus, Error>,
}

/// Every reading of a [`Source`]. A failed reading is kept as its error so
/// the rest of the report is still available.
#[derive(Debug)]
pub struct Snapshot {
    /// Fan and thermal readings
    pub thermal: Thermal,
    /// `_BST`
    pub bst: Result<BstData, Error>,
    /// `_BIX`
    pub bix: Result<BixData, Error>,
    /// `_GCP`
    pub capabilities: Result<Capabilities, Error>,
    /// `_GRT`
    pub real_time: Result<Timestamp, Error>,
    /// AC and DC timers
    pub timers: [Timer; 2],
}

impl Snapshot {
    /// Reads everything from `source`.
    pub fn read(source: &impl Source) -> Self {
        let thermal = Thermal {
            temperature: source.temperature(),
            rpm: source.rpm(),
            min_rpm: source.min_rpm(),
            max_rpm: source.max_rpm(),
            thresholds: [Threshold::On, Threshold::Ramping, Threshold::Max]
                .map(|threshold| (threshold, source.threshold(threshold))),
        };
        let timers = TimerId::ALL.map(|id| Timer {
            id,
            value: source.timer_value(id),
            wake_policy: source.expired_timer_wake_policy(id),
            status: source.wake_status(id),
        });

        Self {
            thermal,
            bst: source.bst(),
            bix: source.bix(),
            capabilities: source.capabilities(),
            real_time: source.real_time(),
            timers,
        }
    }

    /// Returns `true` when every reading succeeded
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        let thermal = &self.thermal;
        thermal.temperature.is_ok()
            && thermal.rpm.is_ok()
            && thermal.min_rpm.is_ok()
            && thermal.max_rpm.is_ok()
            && thermal.thresholds.iter().all(|(_, value)| value.is_ok())
            && self.bst.is_ok()
            && self.bix.is_ok()
            && self.capabilities.is_ok()
            && self.real_time.is_ok()
            && self.timers.iter().all(|timer| {
                timer.value.is_ok() && timer.wake_policy.is_ok() && timer.status.is_ok()
            })
    }
}

fn line<T>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: &Result<T, Error>,
    show: impl FnOnce(&T) -> String,
) -> fmt::Result {
    match value {
        Ok(value) => writeln!(f, "{label:<20}{}", show(value)),
        Err(e) => writeln!(f, "{label:<20}Error: {e}"),
    }
}

fn supported(supported: bool) -> &'static str {
    if supported { "Supported" } else { "Not Supported" }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Thermal")?;
        let thermal = &self.thermal;
        line(f, "  Temperature:", &thermal.temperature, |t| format!("{t:.1} °C"))?;
        line(f, "  Fan:", &thermal.rpm, |rpm| format!("{rpm:.0} RPM"))?;
        line(f, "  Min fan:", &thermal.min_rpm, |rpm| format!("{rpm:.0} RPM"))?;
        line(f, "  Max fan:", &thermal.max_rpm, |rpm| format!("{rpm:.0} RPM"))?;
        for (threshold, value) in &thermal.thresholds {
            line(f, &format!("  {threshold:?} at:"), value, |t| format!("{t:.1} °C"))?;
        }

        writeln!(f, "Battery")?;
        let unit = self.bix.as_ref().ok().map(|bix| bix.power_unit);
        line(f, "  State:", &self.bst, |bst| bst.state.to_string())?;
        line(f, "  Remaining:", &self.bst, |bst| {
            let percentage = self
                .bix
                .as_ref()
                .ok()
                .and_then(|bix| bix.charge_percentage(bst))
                .map_or_else(String::new, |percent| format!(" ({percent}%)"));
            format!(
                "{} {}{percentage}",
                bst.remaining_capacity,
                unit.map_or("", |unit| unit.capacity())
            )
        })?;
        line(f, "  Rate:", &self.bst, |bst| {
            format!("{} {}", bst.present_rate, unit.map_or("", |unit| unit.rate()))
        })?;
        line(f, "  Voltage:", &self.bst, |bst| format!("{} mV", bst.present_voltage))?;
        line(f, "  Design:", &self.bix, |bix| {
            format!(
                "{} {}, {} mV",
                bix.design_capacity,
                bix.power_unit.capacity(),
                bix.design_voltage
            )
        })?;
        line(f, "  Cycles:", &self.bix, |bix| bix.cycle_count.to_string())?;
        line(f, "  Model:", &self.bix, |bix| {
            format!(
                "{} {} ({}, {}, serial {})",
                bix.oem_info, bix.model_number, bix.battery_type, bix.technology, bix.serial_number
            )
        })?;
        line(f, "  Swapping:", &self.bix, |bix| bix.swap_capability.to_string())?;

        writeln!(f, "Real-time clock")?;
        line(f, "  Time:", &self.real_time, |time| {
            time.datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        })?;
        line(f, "  Time zone:", &self.real_time, |time| time.time_zone.to_string())?;
        line(f, "  DST:", &self.real_time, |time| time.dst_status.to_string())?;
        line(f, "  Real time:", &self.capabilities, |c| {
            supported(c.realtime_implemented()).to_string()
        })?;
        line(f, "  Accuracy:", &self.capabilities, |c| {
            if c.realtime_accuracy_in_milliseconds() {
                "Milliseconds".to_string()
            } else {
                "Seconds".to_string()
            }
        })?;
        line(f, "  Get wake status:", &self.capabilities, |c| {
            supported(c.get_wake_status_supported()).to_string()
        })?;
        line(f, "  AC wake:", &self.capabilities, |c| {
            format!(
                "{}, S4 {}, S5 {}",
                supported(c.ac_wake_implemented()),
                supported(c.ac_s4_wake_supported()),
                supported(c.ac_s5_wake_supported())
            )
        })?;
        line(f, "  DC wake:", &self.capabilities, |c| {
            format!(
                "{}, S4 {}, S5 {}",
                supported(c.dc_wake_implemented()),
                supported(c.dc_s4_wake_supported()),
                supported(c.dc_s5_wake_supported())
            )
        })?;
        for timer in &self.timers {
            writeln!(f, "{} power timer", timer.id)?;
            line(f, "  Remaining:", &timer.value, ToString::to_string)?;
            line(f, "  Wake policy:", &timer.wake_policy, ToString::to_string)?;
            line(f, "  Status:", &timer.status, ToString::to_string)?;
        }
        Ok(())
    }
}

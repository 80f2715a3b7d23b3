// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Battery data as returned by the ACPI `_BST` and `_BIX` control methods

use std::fmt;

/// `_BST` battery state bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BatteryState(pub u32);

impl BatteryState {
    /// The battery is discharging
    pub const DISCHARGING: Self = Self(1 << 0);
    /// The battery is charging
    pub const CHARGING: Self = Self(1 << 1);
    /// The battery is critically low
    pub const CRITICAL: Self = Self(1 << 2);

    /// Returns `true` when every bit of `other` is set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let charge = if self.contains(Self::DISCHARGING) {
            "Discharging"
        } else {
            "Charging"
        };
        if self.contains(Self::CRITICAL) {
            write!(f, "{charge} (critical)")
        } else {
            f.write_str(charge)
        }
    }
}

/// Unit of the capacities and rates a battery reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PowerUnit {
    /// Capacities in mWh, rates in mW
    #[default]
    MilliWatts,
    /// Capacities in mAh, rates in mA
    MilliAmps,
}

impl PowerUnit {
    /// Unit of a capacity
    #[must_use]
    pub const fn capacity(self) -> &'static str {
        match self {
            Self::MilliWatts => "mWh",
            Self::MilliAmps => "mAh",
        }
    }

    /// Unit of a rate
    #[must_use]
    pub const fn rate(self) -> &'static str {
        match self {
            Self::MilliWatts => "mW",
            Self::MilliAmps => "mA",
        }
    }
}

/// Whether the battery is rechargeable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BatteryTechnology {
    /// Not rechargeable
    #[default]
    Primary,
    /// Rechargeable
    Secondary,
}

impl fmt::Display for BatteryTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
        })
    }
}

/// Whether the battery can be swapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SwapCapability {
    /// Fixed in place
    #[default]
    NonSwappable,
    /// Swappable with the system off
    ColdSwappable,
    /// Swappable with the system running
    HotSwappable,
}

impl fmt::Display for SwapCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NonSwappable => "Non swappable",
            Self::ColdSwappable => "Cold swappable",
            Self::HotSwappable => "Hot swappable",
        })
    }
}

/// `_BST`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BstData {
    /// Charging state
    pub state: BatteryState,
    /// Present charge or discharge rate
    pub present_rate: u32,
    /// Remaining capacity
    pub remaining_capacity: u32,
    /// Present voltage in mV
    pub present_voltage: u32,
}

/// `_BIX`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BixData {
    /// Structure revision
    pub revision: u32,
    /// Unit of every capacity and rate
    pub power_unit: PowerUnit,
    /// Capacity when new
    pub design_capacity: u32,
    /// Capacity at the last full charge
    pub last_full_charge_capacity: u32,
    /// Rechargeable or not
    pub technology: BatteryTechnology,
    /// Design voltage in mV
    pub design_voltage: u32,
    /// Capacity at which the OS warns
    pub design_capacity_of_warning: u32,
    /// Capacity at which the OS shuts down
    pub design_capacity_of_low: u32,
    /// Charge cycles so far
    pub cycle_count: u32,
    /// Measurement accuracy in thousandths of a percent
    pub measurement_accuracy: u32,
    /// Longest time between samples in ms
    pub max_sampling_time: u32,
    /// Shortest time between samples in ms
    pub min_sampling_time: u32,
    /// Longest averaging interval in ms
    pub max_averaging_interval: u32,
    /// Shortest averaging interval in ms
    pub min_averaging_interval: u32,
    /// Granularity between low and warning capacity
    pub capacity_granularity_1: u32,
    /// Granularity between warning and full capacity
    pub capacity_granularity_2: u32,
    /// Model number
    pub model_number: String,
    /// Serial number
    pub serial_number: String,
    /// Chemistry, e.g. `Li-on`
    pub battery_type: String,
    /// Manufacturer information
    pub oem_info: String,
    /// Whether the battery can be swapped
    pub swap_capability: SwapCapability,
}

impl BixData {
    /// Remaining capacity of `bst` as a percentage of the last full charge,
    /// `None` when the last full charge is unknown.
    #[must_use]
    pub fn charge_percentage(&self, bst: &BstData) -> Option<u32> {
        (self.last_full_charge_capacity != 0).then(|| {
            let percent = u64::from(bst.remaining_capacity) * 100
                / u64::from(self.last_full_charge_capacity);
            u32::try_from(percent.min(100)).unwrap_or(100)
        })
    }
}

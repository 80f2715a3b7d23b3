// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Values of the ACPI time and alarm device

use std::fmt;

use chrono::NaiveDateTime;

/// `_GCP` capability bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(pub u32);

impl Capabilities {
    const fn bit(self, bit: u32) -> bool {
        self.0 & (1 << bit) != 0
    }

    /// The AC timer can wake the system
    #[must_use]
    pub const fn ac_wake_implemented(self) -> bool {
        self.bit(0)
    }

    /// The DC timer can wake the system
    #[must_use]
    pub const fn dc_wake_implemented(self) -> bool {
        self.bit(1)
    }

    /// `_GRT` and `_SRT` are implemented
    #[must_use]
    pub const fn realtime_implemented(self) -> bool {
        self.bit(2)
    }

    /// The real time has millisecond rather than second accuracy
    #[must_use]
    pub const fn realtime_accuracy_in_milliseconds(self) -> bool {
        self.bit(3)
    }

    /// `_GWS` is implemented
    #[must_use]
    pub const fn get_wake_status_supported(self) -> bool {
        self.bit(4)
    }

    /// The AC timer can wake the system from S4
    #[must_use]
    pub const fn ac_s4_wake_supported(self) -> bool {
        self.bit(5)
    }

    /// The AC timer can wake the system from S5
    #[must_use]
    pub const fn ac_s5_wake_supported(self) -> bool {
        self.bit(6)
    }

    /// The DC timer can wake the system from S4
    #[must_use]
    pub const fn dc_s4_wake_supported(self) -> bool {
        self.bit(7)
    }

    /// The DC timer can wake the system from S5
    #[must_use]
    pub const fn dc_s5_wake_supported(self) -> bool {
        self.bit(8)
    }
}

/// One of the two alarm timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Runs while on AC power
    AcPower,
    /// Runs while on battery
    DcPower,
}

impl TimerId {
    /// Both timers, in ACPI order
    pub const ALL: [Self; 2] = [Self::AcPower, Self::DcPower];

    /// Position in [`TimerId::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::AcPower => 0,
            Self::DcPower => 1,
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AcPower => "AC",
            Self::DcPower => "DC",
        })
    }
}

/// `_GWS` status bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimerStatus(pub u32);

impl TimerStatus {
    /// The timer expired
    #[must_use]
    pub const fn timer_expired(self) -> bool {
        self.0 & 1 != 0
    }

    /// The timer woke the system
    #[must_use]
    pub const fn timer_triggered_wake(self) -> bool {
        self.0 & (1 << 1) != 0
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            if self.timer_expired() {
                "expired"
            } else {
                "not expired"
            },
            if self.timer_triggered_wake() {
                "triggered wake"
            } else {
                "did not trigger wake"
            }
        )
    }
}

/// `_TIP` delay in seconds before an expired timer wakes the system after
/// switching power source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WakePolicy(pub u32);

impl WakePolicy {
    /// Wake as soon as the power source switches
    pub const INSTANTLY: Self = Self(0);
    /// Never wake
    pub const NEVER: Self = Self(u32::MAX);
}

impl fmt::Display for WakePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NEVER => f.write_str("never"),
            Self::INSTANTLY => f.write_str("instantly"),
            Self(seconds) => write!(f, "after {seconds} seconds"),
        }
    }
}

/// `_TIV` seconds left on a timer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimerSeconds(pub u32);

impl TimerSeconds {
    /// The timer is not set
    pub const DISABLED: Self = Self(u32::MAX);
}

impl fmt::Display for TimerSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::DISABLED => f.write_str("Timer not set"),
            Self(seconds) => write!(f, "{seconds} seconds"),
        }
    }
}

/// Time zone of a [`Timestamp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeZone {
    /// The device does not track a time zone
    Unknown,
    /// Offset from UTC in minutes
    MinutesFromUtc(i16),
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown => f.write_str("Unknown"),
            Self::MinutesFromUtc(minutes) => {
                let sign = if minutes < 0 { '-' } else { '+' };
                let minutes = minutes.unsigned_abs();
                write!(f, "UTC{sign}{:02}:{:02}", minutes / 60, minutes % 60)
            }
        }
    }
}

/// Daylight saving time state of a [`Timestamp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DstStatus {
    /// The time zone has no daylight saving time
    NotObserved,
    /// Daylight saving time is observed but not in effect
    NotAdjusted,
    /// Daylight saving time is in effect
    Adjusted,
}

impl fmt::Display for DstStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotObserved => "Not Observed",
            Self::NotAdjusted => "No",
            Self::Adjusted => "Yes",
        })
    }
}

/// `_GRT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// Local date and time
    pub datetime: NaiveDateTime,
    /// Time zone `datetime` is in
    pub time_zone: TimeZone,
    /// Daylight saving time state
    pub dst_status: DstStatus,
}

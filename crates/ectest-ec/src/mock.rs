// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! A [`Source`] that simulates the embedded controller.
//!
//! The temperature sweeps between 0 and 50 °C, the fan follows a sine wave
//! until a speed is set and the battery charges to full and discharges back
//! to empty. Clones share one simulation.

use std::{
    f64::consts::TAU,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

use crate::{
    Error,
    Source,
    Threshold,
    battery::{BatteryState, BatteryTechnology, BixData, BstData, PowerUnit, SwapCapability},
    deci_kelvin_to_celsius,
    rtc::{Capabilities, DstStatus, TimeZone, TimerId, TimerSeconds, TimerStatus, Timestamp, WakePolicy},
};

const MIN_TEMPERATURE_DK: u32 = 2732;
const MAX_TEMPERATURE_DK: u32 = 3232;
const TEMPERATURE_STEP_DK: u32 = 10;

const RPM_BASE: f64 = 3000.0;
const RPM_AMPLITUDE: f64 = 3000.0;
const RPM_PHASE_STEP: f64 = 0.1;

const MAX_CAPACITY: u32 = 10000;
const CAPACITY_STEP: u32 = 1000;

#[derive(Debug, Clone, Copy)]
struct MockTimer {
    value: TimerSeconds,
    wake_policy: WakePolicy,
    status: TimerStatus,
}

impl Default for MockTimer {
    fn default() -> Self {
        Self {
            value: TimerSeconds(0),
            wake_policy: WakePolicy::INSTANTLY,
            status: TimerStatus(0),
        }
    }
}

#[derive(Debug)]
struct State {
    temperature_dk: u32,
    warming: bool,
    rpm_phase: f64,
    set_rpm: Option<f64>,
    battery_state: BatteryState,
    capacity: u32,
    trip_point: u32,
    time: Timestamp,
    timers: [MockTimer; 2],
}

impl Default for State {
    fn default() -> Self {
        let datetime = NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            temperature_dk: MIN_TEMPERATURE_DK,
            warming: true,
            rpm_phase: 0.0,
            set_rpm: None,
            battery_state: BatteryState::CHARGING,
            capacity: 0,
            trip_point: 0,
            time: Timestamp {
                datetime,
                time_zone: TimeZone::MinutesFromUtc(-8 * 60),
                dst_status: DstStatus::NotObserved,
            },
            timers: [MockTimer::default(); 2],
        }
    }
}

/// Simulated embedded controller
#[derive(Debug, Clone, Default)]
pub struct Mock {
    state: Arc<Mutex<State>>,
}

impl Mock {
    /// Creates a simulation in its initial state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last trip point set with [`Source::set_btp`]
    #[must_use]
    pub fn trip_point(&self) -> u32 {
        self.state().trip_point
    }

    /// Moves the simulated clock
    pub fn set_time(&self, datetime: NaiveDateTime) {
        self.state().time.datetime = datetime;
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self, timer: TimerId) -> MockTimer {
        self.state().timers[timer.index()]
    }
}

impl Source for Mock {
    fn temperature(&self) -> Result<f64, Error> {
        let mut state = self.state();
        state.temperature_dk = if state.warming {
            state.temperature_dk + TEMPERATURE_STEP_DK
        } else {
            state.temperature_dk - TEMPERATURE_STEP_DK
        };
        if !(MIN_TEMPERATURE_DK + 1..MAX_TEMPERATURE_DK).contains(&state.temperature_dk) {
            state.warming = !state.warming;
        }
        Ok(deci_kelvin_to_celsius(state.temperature_dk))
    }

    fn rpm(&self) -> Result<f64, Error> {
        let mut state = self.state();
        if let Some(rpm) = state.set_rpm {
            return Ok(rpm);
        }
        let rpm = state.rpm_phase.sin().mul_add(RPM_AMPLITUDE, RPM_BASE);
        state.rpm_phase += RPM_PHASE_STEP;
        if state.rpm_phase > TAU {
            state.rpm_phase -= TAU;
        }
        Ok(rpm)
    }

    fn min_rpm(&self) -> Result<f64, Error> {
        Ok(0.0)
    }

    fn max_rpm(&self) -> Result<f64, Error> {
        Ok(RPM_BASE + RPM_AMPLITUDE)
    }

    fn threshold(&self, threshold: Threshold) -> Result<f64, Error> {
        Ok(match threshold {
            Threshold::On => 28.0,
            Threshold::Ramping => 40.0,
            Threshold::Max => 44.0,
        })
    }

    /// A negative speed hands the fan back to the simulated waveform.
    fn set_rpm(&self, rpm: f64) -> Result<(), Error> {
        debug!("Setting fan speed to {rpm} RPM");
        self.state().set_rpm = (rpm >= 0.0).then_some(rpm);
        Ok(())
    }

    fn bst(&self) -> Result<BstData, Error> {
        let mut state = self.state();
        let bst = BstData {
            state: state.battery_state,
            present_rate: 3839,
            remaining_capacity: state.capacity,
            present_voltage: 12569,
        };

        if state.battery_state.contains(BatteryState::CHARGING) {
            let capacity = state.capacity + CAPACITY_STEP;
            if capacity > MAX_CAPACITY {
                state.battery_state = BatteryState::DISCHARGING;
            }
            state.capacity = capacity.min(MAX_CAPACITY);
        } else {
            let capacity = state.capacity.saturating_sub(CAPACITY_STEP);
            if capacity < CAPACITY_STEP {
                state.battery_state = BatteryState::CHARGING;
            }
            state.capacity = capacity;
        }
        trace!("Battery {} at {}", state.battery_state, state.capacity);
        Ok(bst)
    }

    fn bix(&self) -> Result<BixData, Error> {
        Ok(BixData {
            revision: 1,
            power_unit: PowerUnit::MilliWatts,
            design_capacity: MAX_CAPACITY,
            last_full_charge_capacity: 9890,
            technology: BatteryTechnology::Primary,
            design_voltage: 13000,
            design_capacity_of_warning: 5000,
            design_capacity_of_low: 3000,
            cycle_count: 1337,
            measurement_accuracy: 80000,
            max_sampling_time: 42,
            min_sampling_time: 7,
            max_averaging_interval: 5,
            min_averaging_interval: 1,
            capacity_granularity_1: 10,
            capacity_granularity_2: 10,
            model_number: "42.0".to_string(),
            serial_number: "123-45".to_string(),
            battery_type: "Li-on".to_string(),
            oem_info: "BatBros".to_string(),
            swap_capability: SwapCapability::ColdSwappable,
        })
    }

    fn set_btp(&self, trip_point: u32) -> Result<(), Error> {
        debug!("Setting battery trip point to {trip_point}");
        self.state().trip_point = trip_point;
        Ok(())
    }

    fn capabilities(&self) -> Result<Capabilities, Error> {
        Ok(Capabilities(0xF7))
    }

    fn real_time(&self) -> Result<Timestamp, Error> {
        Ok(self.state().time)
    }

    fn wake_status(&self, timer: TimerId) -> Result<TimerStatus, Error> {
        Ok(self.timer(timer).status)
    }

    fn expired_timer_wake_policy(&self, timer: TimerId) -> Result<WakePolicy, Error> {
        Ok(self.timer(timer).wake_policy)
    }

    fn timer_value(&self, timer: TimerId) -> Result<TimerSeconds, Error> {
        Ok(self.timer(timer).value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn temperature_sweeps_up_and_back_down() {
        let mock = Mock::new();
        let readings: Vec<f64> = (0..110).map(|_| mock.temperature().unwrap()).collect();

        assert!((readings[0] - 1.0).abs() < 1e-9);
        assert!((readings[49] - 50.0).abs() < 1e-9);
        assert!((readings[50] - 49.0).abs() < 1e-9);
        assert!((readings[99] - 0.0).abs() < 1e-9);
        assert!((readings[100] - 1.0).abs() < 1e-9);
        assert!(readings.iter().all(|t| (0.0..=50.0).contains(t)));
    }

    #[test]
    fn fan_follows_a_sine_wave_until_a_speed_is_set() {
        let mock = Mock::new();
        assert!((mock.rpm().unwrap() - 3000.0).abs() < 1e-9);
        let next = mock.rpm().unwrap();
        assert!(next > 3000.0 && next <= mock.max_rpm().unwrap());

        mock.set_rpm(1500.0).unwrap();
        assert!((mock.rpm().unwrap() - 1500.0).abs() < f64::EPSILON);
        assert!((mock.rpm().unwrap() - 1500.0).abs() < f64::EPSILON);

        mock.set_rpm(-1.0).unwrap();
        assert!((mock.rpm().unwrap() - 1500.0).abs() > 1.0);
    }

    #[test]
    fn thresholds_are_ordered() {
        let mock = Mock::new();
        let on = mock.threshold(Threshold::On).unwrap();
        let ramping = mock.threshold(Threshold::Ramping).unwrap();
        let max = mock.threshold(Threshold::Max).unwrap();
        assert!(on < ramping && ramping < max);
        assert!(mock.min_rpm().unwrap() < mock.max_rpm().unwrap());
    }

    #[test]
    fn battery_charges_to_full_then_discharges() {
        let mock = Mock::new();
        let readings: Vec<BstData> = (0..24).map(|_| mock.bst().unwrap()).collect();

        let capacities: Vec<u32> = readings.iter().map(|bst| bst.remaining_capacity).collect();
        assert_eq!(
            capacities,
            vec![
                0, 1000, 2000, 3000, 4000, 5000, 6000, 7000, 8000, 9000, 10000, 10000, 9000,
                8000, 7000, 6000, 5000, 4000, 3000, 2000, 1000, 0, 1000, 2000,
            ]
        );
        assert_eq!(readings[10].state, BatteryState::CHARGING);
        assert_eq!(readings[11].state, BatteryState::DISCHARGING);
        assert_eq!(readings[21].state, BatteryState::CHARGING);
        assert!(readings.iter().all(|bst| bst.present_voltage == 12569));
    }

    #[test]
    fn battery_information_is_static() {
        let mock = Mock::new();
        let bix = mock.bix().unwrap();
        assert_eq!(bix, mock.bix().unwrap());
        assert_eq!(bix.model_number, "42.0");
        assert_eq!(bix.swap_capability, SwapCapability::ColdSwappable);
        assert!(bix.design_capacity_of_low < bix.design_capacity_of_warning);
    }

    #[test]
    fn clones_share_one_simulation() {
        let mock = Mock::new();
        let clone = mock.clone();

        clone.set_btp(4200).unwrap();
        assert_eq!(mock.trip_point(), 4200);

        mock.bst().unwrap();
        assert_eq!(clone.bst().unwrap().remaining_capacity, 1000);
    }

    #[test]
    fn clock_starts_at_new_year_pacific_standard_time() {
        let mock = Mock::new();
        let time = mock.real_time().unwrap();
        assert_eq!(time.datetime.to_string(), "2026-01-01 00:00:00");
        assert_eq!(time.time_zone, TimeZone::MinutesFromUtc(-480));
        assert_eq!(time.dst_status, DstStatus::NotObserved);

        let later = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        mock.set_time(later);
        assert_eq!(mock.real_time().unwrap().datetime, later);
    }

    #[test]
    fn both_timers_are_idle() {
        let mock = Mock::new();
        assert_eq!(mock.capabilities().unwrap(), Capabilities(0xF7));
        for timer in TimerId::ALL {
            assert_eq!(mock.timer_value(timer).unwrap(), TimerSeconds(0));
            assert_eq!(
                mock.expired_timer_wake_policy(timer).unwrap(),
                WakePolicy::INSTANTLY
            );
            assert!(!mock.wake_status(timer).unwrap().timer_expired());
        }
    }
}

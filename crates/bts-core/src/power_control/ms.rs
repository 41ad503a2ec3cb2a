// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MS (uplink) power control loop (spec.md §4.9; `rsl_rx_ms_pwr_ctrl()` in
//! the original source).

use super::{combine, IntervalGate, PowerCtrlParams, StepDirection};

/// Valid range for a GSM MS power control level (3GPP TS 05.05).
const MS_POWER_LEVEL_MIN: u8 = 0;
const MS_POWER_LEVEL_MAX: u8 = 31;

/// Autonomous MS Tx power control loop for one active lchan.
///
/// Only runs if an `MS Power Parameters` IE was supplied in CHAN-ACTIV or
/// MS POWER CONTROL (spec.md §4.9: "autonomous loop runs iff an
/// MS-Power-Parameters IE was provided... otherwise power is clamped to
/// the static value from BS"). Without parameters, [`Self::step`] is a
/// no-op and the level stays pinned at `max`.
#[derive(Debug)]
pub struct MsPowerLoop {
    params: Option<PowerCtrlParams>,
    gate: IntervalGate,
    current: u8,
    max: u8,
}

impl MsPowerLoop {
    #[must_use]
    pub fn new(max_power_level: u8) -> Self {
        let max = max_power_level.clamp(MS_POWER_LEVEL_MIN, MS_POWER_LEVEL_MAX);
        Self {
            params: None,
            gate: IntervalGate::new(),
            current: max,
            max,
        }
    }

    /// A loop pinned at `level` with ceiling `max` and no autonomous
    /// parameters (CHAN-ACTIV's MS Power field, before any MS POWER
    /// CONTROL message arrives).
    #[must_use]
    pub fn pinned(level: u8, max: u8) -> Self {
        let max = max.clamp(MS_POWER_LEVEL_MIN, MS_POWER_LEVEL_MAX);
        Self {
            params: None,
            gate: IntervalGate::new(),
            current: level.clamp(MS_POWER_LEVEL_MIN, max),
            max,
        }
    }

    /// Enable the autonomous loop with the given parameters (RSL MS POWER
    /// CONTROL carrying an `MS Power Parameters` IE).
    pub fn set_params(&mut self, params: PowerCtrlParams) {
        self.params = Some(params);
    }

    /// Pin the current level directly (RSL MS POWER CONTROL without a
    /// parameters IE: the target is static, not autonomous).
    pub fn set_static(&mut self, level: u8) {
        self.params = None;
        self.current = level.clamp(MS_POWER_LEVEL_MIN, self.max);
    }

    /// Disable the loop, clamping back to the static BSC-commanded level
    /// (RSL MS POWER CONTROL without the parameters IE).
    pub fn clear_params(&mut self) {
        self.params = None;
        self.current = self.max;
    }

    /// Update the static ceiling (a later MS POWER CONTROL's `MS Power`
    /// field); the current level is pulled down if it now exceeds it.
    pub fn set_max(&mut self, max_power_level: u8) {
        self.max = max_power_level.clamp(MS_POWER_LEVEL_MIN, MS_POWER_LEVEL_MAX);
        if self.current > self.max {
            self.current = self.max;
        }
    }

    #[must_use]
    pub fn current(&self) -> u8 {
        self.current
    }

    #[must_use]
    pub fn is_autonomous(&self) -> bool {
        self.params.is_some()
    }

    /// Feed one SACCH period's rxlev/rxqual samples (already dBm/RxQual
    /// coded, lower is worse for rxlev, higher is worse for rxqual). No-op
    /// when the loop isn't in autonomous mode.
    pub fn step(&mut self, rxlev_sample: i32, rxqual_sample: i32) {
        let Some(params) = self.params.as_mut() else {
            return;
        };
        let rxlev_filtered = params.rxlev_meas.preprocess(rxlev_sample);
        let rxqual_filtered = params.rxqual_meas.preprocess(rxqual_sample);
        let rxlev_h = params.rxlev_meas.record(rxlev_filtered);
        let rxqual_h = params.rxqual_meas.record(rxqual_filtered);

        if !self.gate.tick(params.ctrl_interval) {
            return;
        }

        // Higher power level numbers mean *less* Tx power (TS 05.05), so
        // a quality degradation (Raise tx power) means *lower* the level.
        match combine(rxlev_h, rxqual_h) {
            StepDirection::Raise => {
                let step = u8::try_from(params.inc_step_size_db).unwrap_or(u8::MAX);
                self.current = self.current.saturating_sub(step).max(MS_POWER_LEVEL_MIN);
            }
            StepDirection::Lower => {
                let step = u8::try_from(params.red_step_size_db).unwrap_or(u8::MAX);
                self.current = (self.current.saturating_add(step)).min(self.max);
            }
            StepDirection::Hold => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power_control::{MeasParams, PreprocAlgo};

    fn test_params() -> PowerCtrlParams {
        PowerCtrlParams {
            rxlev_meas: MeasParams::new(-90, -50, 1, 1, 1, 1, PreprocAlgo::None),
            rxqual_meas: MeasParams::new(0, 4, 1, 1, 1, 1, PreprocAlgo::None),
            ci_thresholds: None,
            ctrl_interval: 1,
            inc_step_size_db: 2,
            red_step_size_db: 2,
        }
    }

    #[test]
    fn without_params_stays_pinned_to_max() {
        let mut loop_ = MsPowerLoop::new(15);
        loop_.step(-110, 7);
        assert_eq!(loop_.current(), 15);
    }

    #[test]
    fn weak_uplink_raises_power() {
        let mut loop_ = MsPowerLoop::new(15);
        loop_.set_max(15);
        loop_.set_params(test_params());
        // rxlev below lower_thresh -> weak signal -> raise power -> lower level.
        loop_.step(-95, 1);
        assert_eq!(loop_.current(), 13);
    }

    #[test]
    fn strong_uplink_lowers_power_back_toward_max_level() {
        let mut loop_ = MsPowerLoop::new(15);
        loop_.set_params(test_params());
        loop_.step(-95, 1); // level 13
        loop_.step(-40, 1); // strong signal -> lower power -> raise level
        assert_eq!(loop_.current(), 15);
    }

    #[test]
    fn clearing_params_pins_back_to_static_max() {
        let mut loop_ = MsPowerLoop::new(15);
        loop_.set_params(test_params());
        loop_.step(-95, 1);
        assert!(loop_.current() < 15);
        loop_.clear_params();
        assert_eq!(loop_.current(), 15);
        assert!(!loop_.is_autonomous());
    }
}

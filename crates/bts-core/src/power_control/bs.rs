// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! BS (downlink) power control loop (spec.md §4.9; `rsl_rx_bs_pwr_ctrl()`
//! in the original source).

use super::{combine, IntervalGate, PowerCtrlParams, StepDirection};

/// Autonomous BS Tx attenuation control loop for one active lchan.
///
/// Same structure as [`super::ms::MsPowerLoop`], controlling attenuation
/// in dB below nominal TRX power rather than an MS power level. The
/// current attenuation is always clamped by `c0_ceiling_db`: on the BCCH
/// carrier this keeps the cell reachable even while other timeslots are
/// reduced (spec.md §4.9).
#[derive(Debug)]
pub struct BsPowerLoop {
    params: Option<PowerCtrlParams>,
    gate: IntervalGate,
    current_db: u8,
    max_db: u8,
    c0_ceiling_db: u8,
}

impl BsPowerLoop {
    #[must_use]
    pub fn new(max_attenuation_db: u8, c0_ceiling_db: u8) -> Self {
        let max_db = max_attenuation_db.min(c0_ceiling_db);
        Self {
            params: None,
            gate: IntervalGate::new(),
            current_db: max_db,
            max_db,
            c0_ceiling_db,
        }
    }

    /// A loop pinned at `attenuation_db` with ceiling `max_attenuation_db`
    /// / `c0_ceiling_db` and no autonomous parameters (CHAN-ACTIV's BS
    /// Power field, before any BS POWER CONTROL message arrives).
    #[must_use]
    pub fn pinned(attenuation_db: u8, max_attenuation_db: u8, c0_ceiling_db: u8) -> Self {
        let max_db = max_attenuation_db.min(c0_ceiling_db);
        Self {
            params: None,
            gate: IntervalGate::new(),
            current_db: attenuation_db.min(max_db),
            max_db,
            c0_ceiling_db,
        }
    }

    pub fn set_params(&mut self, params: PowerCtrlParams) {
        self.current_db = 0; // "it's safer to start from 0" (rsl.c).
        self.params = Some(params);
    }

    /// Pin the current attenuation directly (RSL BS POWER CONTROL without
    /// a parameters IE: the target is static, not autonomous).
    pub fn set_static(&mut self, attenuation_db: u8) {
        self.params = None;
        self.current_db = attenuation_db.min(self.max_db);
    }

    pub fn clear_params(&mut self) {
        self.params = None;
        self.current_db = self.max_db;
    }

    /// Tighten the ceiling (a later BS POWER CONTROL's `BS Power` field, or
    /// a change to the per-timeslot C0 power-reduction ceiling).
    pub fn set_ceiling(&mut self, max_attenuation_db: u8, c0_ceiling_db: u8) {
        self.c0_ceiling_db = c0_ceiling_db;
        self.max_db = max_attenuation_db.min(c0_ceiling_db);
        if self.current_db > self.max_db {
            self.current_db = self.max_db;
        }
    }

    #[must_use]
    pub fn current_db(&self) -> u8 {
        self.current_db
    }

    #[must_use]
    pub fn is_autonomous(&self) -> bool {
        self.params.is_some()
    }

    /// Feed one SACCH period's downlink-quality samples as reported by the
    /// MS in a Measurement Report (rxlev/rxqual of the downlink).
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

        match combine(rxlev_h, rxqual_h) {
            StepDirection::Raise => {
                // Weak downlink: raise Tx power by cutting attenuation.
                let step = params.inc_step_size_db;
                self.current_db = self.current_db.saturating_sub(step);
            }
            StepDirection::Lower => {
                let step = params.red_step_size_db;
                self.current_db = (self.current_db.saturating_add(step)).min(self.max_db);
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
    fn weak_downlink_cuts_attenuation() {
        let mut loop_ = BsPowerLoop::new(10, 10);
        loop_.set_params(test_params());
        loop_.step(-95, 1);
        assert_eq!(loop_.current_db(), 0);
    }

    #[test]
    fn attenuation_never_exceeds_c0_ceiling() {
        let mut loop_ = BsPowerLoop::new(10, 4);
        assert_eq!(loop_.current_db(), 4);
        loop_.set_params(test_params());
        for _ in 0..5 {
            loop_.step(-40, 1);
        }
        assert!(loop_.current_db() <= 4);
    }

    #[test]
    fn tightening_ceiling_pulls_current_down() {
        let mut loop_ = BsPowerLoop::new(10, 10);
        loop_.set_ceiling(10, 3);
        assert_eq!(loop_.current_db(), 3);
    }
}

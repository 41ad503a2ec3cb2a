// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MS and BS power control loops (spec.md §4.9; 3GPP TS 45.008 Annex A).
//!
//! Both loops share the same measurement pre-processing and hysteresis
//! comparator machinery; [`ms`] and [`bs`] wrap it with direction-specific
//! clamping (MS Tx power vs. BS attenuation below nominal).

pub mod bs;
pub mod ms;

use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Measurement pre-processing algorithm (spec.md §4.9), ip.access/Osmocom
/// `RSL_IPAC_EIE_MEAS_AVG_CFG` IE (`parse_power_ctrl_params()` in the
/// original source).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocAlgo {
    /// Passthrough: each raw sample is used unmodified.
    None,
    UnweightedAverage,
    WeightedAverage,
    ModifiedMedian,
    /// Osmocom extension. `alpha` is in percent, 1..=99.
    Ewma { alpha: u8 },
}

impl Default for PreprocAlgo {
    fn default() -> Self {
        PreprocAlgo::Ewma { alpha: 30 }
    }
}

/// Thresholds and hysteresis comparator parameters for one measurement
/// quantity (RxLev, RxQual, or an Osmocom-extended C/I figure), mirroring
/// `struct gsm_power_ctrl_meas_params` (`rsl.c`, `parse_power_ctrl_params`).
#[derive(Debug, Clone)]
pub struct MeasParams {
    pub lower_thresh: i16,
    pub upper_thresh: i16,
    /// P1/P3: window length (in control periods) for the lower comparator.
    pub lower_cmp_p: u8,
    /// N1/N3: violation count within the window that triggers an increase.
    pub lower_cmp_n: u8,
    /// P2/P4: window length for the upper comparator.
    pub upper_cmp_p: u8,
    /// N2/N4: violation count within the window that triggers a reduction.
    pub upper_cmp_n: u8,
    pub algo: PreprocAlgo,
    history: VecDeque<i32>,
    lower_hist: VecDeque<bool>,
    upper_hist: VecDeque<bool>,
}

impl MeasParams {
    #[must_use]
    pub fn new(
        lower_thresh: i16,
        upper_thresh: i16,
        lower_cmp_p: u8,
        lower_cmp_n: u8,
        upper_cmp_p: u8,
        upper_cmp_n: u8,
        algo: PreprocAlgo,
    ) -> Self {
        Self {
            lower_thresh,
            upper_thresh,
            lower_cmp_p,
            lower_cmp_n,
            upper_cmp_p,
            upper_cmp_n,
            algo,
            history: VecDeque::new(),
            lower_hist: VecDeque::new(),
            upper_hist: VecDeque::new(),
        }
    }

    /// # Errors
    /// Returns [`Error::IeContent`] if an EWMA alpha is out of `[1, 99]` or
    /// a comparator's N exceeds its own P (spec.md §4.9).
    pub fn validate(&self) -> Result<()> {
        if let PreprocAlgo::Ewma { alpha } = self.algo {
            if !(1..=99).contains(&alpha) {
                return Err(Error::IeContent("EWMA alpha out of [1, 99]".into()));
            }
        }
        if self.lower_cmp_n > self.lower_cmp_p || self.upper_cmp_n > self.upper_cmp_p {
            return Err(Error::IeContent(
                "power control comparator N exceeds window P".into(),
            ));
        }
        Ok(())
    }

    /// Feed one raw sample through the configured pre-processing algorithm,
    /// returning the filtered value used for threshold comparison.
    pub fn preprocess(&mut self, sample: i32) -> i32 {
        match self.algo {
            PreprocAlgo::None => sample,
            PreprocAlgo::UnweightedAverage => {
                self.push_history(sample, 8);
                average(&self.history)
            }
            PreprocAlgo::WeightedAverage => {
                self.push_history(sample, 8);
                weighted_average(&self.history)
            }
            PreprocAlgo::ModifiedMedian => {
                self.push_history(sample, 8);
                modified_median(&self.history)
            }
            PreprocAlgo::Ewma { alpha } => {
                let filtered = match self.history.back() {
                    Some(&prev) => {
                        // Avg[n] = a*Val[n] + (1-a)*Avg[n-1], a = alpha/100.
                        (i64::from(sample) * i64::from(alpha)
                            + i64::from(prev) * i64::from(100 - alpha))
                            / 100
                    }
                    None => i64::from(sample),
                } as i32;
                self.history.clear();
                self.history.push_back(filtered);
                filtered
            }
        }
    }

    fn push_history(&mut self, sample: i32, depth: usize) {
        self.history.push_back(sample);
        while self.history.len() > depth {
            self.history.pop_front();
        }
    }

    /// Record whether `filtered` violates each threshold this control
    /// period and report which hysteresis comparators now meet their N-of-P
    /// requirement (3GPP TS 45.008 Annex A.3.2.1).
    pub fn record(&mut self, filtered: i32) -> Hysteresis {
        let below = i32::from(self.lower_thresh) > filtered;
        let above = filtered > i32::from(self.upper_thresh);
        push_bounded(&mut self.lower_hist, below, self.lower_cmp_p.max(1) as usize);
        push_bounded(&mut self.upper_hist, above, self.upper_cmp_p.max(1) as usize);
        Hysteresis {
            increase: count_true(&self.lower_hist) >= u32::from(self.lower_cmp_n),
            decrease: count_true(&self.upper_hist) >= u32::from(self.upper_cmp_n),
        }
    }
}

fn push_bounded(hist: &mut VecDeque<bool>, value: bool, cap: usize) {
    hist.push_back(value);
    while hist.len() > cap {
        hist.pop_front();
    }
}

fn count_true(hist: &VecDeque<bool>) -> u32 {
    hist.iter().filter(|&&v| v).count() as u32
}

fn average(samples: &VecDeque<i32>) -> i32 {
    let sum: i64 = samples.iter().map(|&v| i64::from(v)).sum();
    (sum / samples.len() as i64) as i32
}

fn weighted_average(samples: &VecDeque<i32>) -> i32 {
    // Most recent sample carries the highest weight (n, n-1, ..., 1).
    let n = samples.len();
    let mut weighted_sum: i64 = 0;
    let mut weight_sum: i64 = 0;
    for (i, &v) in samples.iter().enumerate() {
        let weight = (i + 1) as i64;
        weighted_sum += i64::from(v) * weight;
        weight_sum += weight;
    }
    let _ = n;
    (weighted_sum / weight_sum) as i32
}

fn modified_median(samples: &VecDeque<i32>) -> i32 {
    let mut sorted: Vec<i32> = samples.iter().copied().collect();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (i64::from(sorted[mid - 1]) + i64::from(sorted[mid])) as i32 / 2
    } else {
        sorted[mid]
    }
}

/// Result of evaluating one sample's hysteresis comparators this period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hysteresis {
    pub increase: bool,
    pub decrease: bool,
}

/// Optional Osmocom-extended C/I thresholds per codec mode (spec.md §4.9),
/// `struct osmo_preproc_pc_thresh` (`rsl.c`).
#[derive(Debug, Clone)]
pub struct CiThresholds {
    pub full_rate: MeasParams,
    pub half_rate: MeasParams,
    pub amr_full_rate: MeasParams,
    pub amr_half_rate: MeasParams,
    pub sdcch: MeasParams,
    pub gprs: MeasParams,
}

/// Shared configuration for one direction's autonomous power loop
/// (`struct gsm_power_ctrl_params` in the original source).
#[derive(Debug, Clone)]
pub struct PowerCtrlParams {
    pub rxlev_meas: MeasParams,
    pub rxqual_meas: MeasParams,
    pub ci_thresholds: Option<CiThresholds>,
    /// P_Con_INTERVAL: minimum number of SACCH blocks between power
    /// changes.
    pub ctrl_interval: u8,
    pub inc_step_size_db: u8,
    pub red_step_size_db: u8,
}

impl PowerCtrlParams {
    /// # Errors
    /// Returns [`Error::IeContent`] if `ctrl_interval` is zero or either
    /// measurement's parameters fail [`MeasParams::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.ctrl_interval == 0 {
            return Err(Error::IeContent("power control interval is zero".into()));
        }
        self.rxlev_meas.validate()?;
        self.rxqual_meas.validate()?;
        Ok(())
    }
}

/// Direction a comparator step moves power in: increase Tx power / reduce
/// attenuation, or the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Raise,
    Lower,
    Hold,
}

/// Counts elapsed SACCH blocks and reports when the next power step, if
/// any, is due (`P_Con_INTERVAL` gating common to both MS and BS loops).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalGate {
    elapsed: u8,
}

impl IntervalGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one SACCH block; returns `true` once `interval` blocks
    /// have elapsed, resetting the counter.
    pub fn tick(&mut self, interval: u8) -> bool {
        self.elapsed += 1;
        if self.elapsed >= interval.max(1) {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }
}

/// Combine RxLev and RxQual hysteresis verdicts into one step decision:
/// a reduction from either measurement wins over an increase, matching
/// the "quality degradation overrides" policy implicit in running both
/// loops off the same step counter (3GPP TS 45.008 Annex A).
#[must_use]
pub fn combine(rxlev: Hysteresis, rxqual: Hysteresis) -> StepDirection {
    if rxlev.decrease || rxqual.decrease {
        StepDirection::Lower
    } else if rxlev.increase || rxqual.increase {
        StepDirection::Raise
    } else {
        StepDirection::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lower: i16, upper: i16, lp: u8, ln: u8, up: u8, un: u8) -> MeasParams {
        MeasParams::new(lower, upper, lp, ln, up, un, PreprocAlgo::None)
    }

    #[test]
    fn ewma_alpha_out_of_range_rejected() {
        let mut p = params(-110, -70, 4, 2, 4, 2);
        p.algo = PreprocAlgo::Ewma { alpha: 0 };
        assert!(p.validate().is_err());
    }

    #[test]
    fn none_algo_passes_sample_through() {
        let mut p = params(-110, -70, 4, 2, 4, 2);
        assert_eq!(p.preprocess(-90), -90);
    }

    #[test]
    fn lower_violation_requires_n_of_p() {
        let mut p = params(-90, -50, 4, 3, 4, 3);
        let h1 = p.record(-95);
        assert!(!h1.increase);
        let h2 = p.record(-95);
        assert!(!h2.increase);
        let h3 = p.record(-95);
        assert!(h3.increase);
    }

    #[test]
    fn window_forgets_old_violations() {
        let mut p = params(-90, -50, 2, 2, 4, 4);
        assert!(!p.record(-95).increase);
        // A good sample pushes the first violation out of the 2-wide window.
        assert!(!p.record(-80).increase);
        assert!(!p.record(-95).increase);
    }

    #[test]
    fn combine_prefers_decrease_over_increase() {
        let rxlev = Hysteresis { increase: true, decrease: false };
        let rxqual = Hysteresis { increase: false, decrease: true };
        assert_eq!(combine(rxlev, rxqual), StepDirection::Lower);
    }

    #[test]
    fn interval_gate_fires_every_n_ticks() {
        let mut gate = IntervalGate::new();
        assert!(!gate.tick(3));
        assert!(!gate.tick(3));
        assert!(gate.tick(3));
        assert!(!gate.tick(3));
    }
}

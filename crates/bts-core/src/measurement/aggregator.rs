// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-lchan measurement aggregation (spec.md §4.6).

use super::SacchAlignment;
use std::collections::VecDeque;

/// One per-burst uplink measurement sample (spec.md §3).
#[derive(Debug, Clone, Copy)]
pub struct MeasurementSample {
    pub fn_: u32,
    /// BER x 10^4.
    pub ber10k: u16,
    /// Time of arrival, 1/256 symbol periods.
    pub toa256: i16,
    /// Negated RSSI in dBm (e.g. -80 dBm is stored as -80).
    pub rssi: i8,
    /// C/I in centibels.
    pub ci_cb: i16,
    pub is_sub: bool,
}

/// The result of one concluded SACCH period (spec.md §4.6, "Aggregation").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementResult {
    pub rx_lev_full: f64,
    pub rx_qual_full: u8,
    pub rx_lev_sub: f64,
    pub rx_qual_sub: u8,
    pub toa256_min: i16,
    pub toa256_max: i16,
    pub toa256_mean: f64,
    pub toa256_std_dev: f64,
    pub num_samples: usize,
}

/// Estimate RX quality (0..=7) from a mean BER, per 3GPP TS 05.08 §8.2.4
/// table (BER thresholds below are the published table's boundaries,
/// expressed in BER x 10^4 to match [`MeasurementSample::ber10k`]).
#[must_use]
pub fn rxqual_from_mean_ber10k(mean_ber10k: f64) -> u8 {
    const THRESHOLDS: [f64; 7] = [2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];
    for (i, t) in THRESHOLDS.iter().enumerate() {
        if mean_ber10k < *t {
            return i as u8;
        }
    }
    7
}

/// Per-lchan ring of uplink samples since the last period boundary, plus
/// robust period-boundary tracking (spec.md §4.6).
#[derive(Debug)]
pub struct MeasurementAggregator {
    pub alignment: Option<SacchAlignment>,
    samples: VecDeque<MeasurementSample>,
    last_processed_period_end: Option<u32>,
    pub dtx_active: bool,
    pub ul_res: Option<MeasurementResult>,
}

impl MeasurementAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            alignment: None,
            samples: VecDeque::new(),
            last_processed_period_end: None,
            dtx_active: false,
            ul_res: None,
        }
    }

    /// Feed one uplink sample. Returns the aggregated result if this
    /// sample's frame number concludes a SACCH period.
    pub fn feed(&mut self, sample: MeasurementSample) -> Option<MeasurementResult> {
        self.samples.push_back(sample);
        let alignment = self.alignment?;
        if alignment.is_period_end(sample.fn_) {
            self.last_processed_period_end = Some(sample.fn_);
            let result = self.aggregate();
            self.ul_res = Some(result);
            self.samples.clear();
            Some(result)
        } else {
            None
        }
    }

    /// Detect a missed period-end boundary (spec.md §4.6): given the
    /// current frame number, returns the most recent period-end that
    /// should have been processed already but wasn't, if any.
    #[must_use]
    pub fn is_meas_overdue(&self, current_fn: u32) -> Option<u32> {
        let alignment = self.alignment?;
        let expected = alignment.last_period_end_at_or_before(current_fn);
        match self.last_processed_period_end {
            Some(last) if last == expected => None,
            _ => Some(expected),
        }
    }

    /// Synthesize the missed period boundary, aggregating whatever
    /// samples are buffered even if the exact boundary sample never
    /// arrived (PHY dropped it).
    pub fn synthesize_overdue_period(&mut self, missed_fn: u32) -> MeasurementResult {
        self.last_processed_period_end = Some(missed_fn);
        let result = self.aggregate();
        self.ul_res = Some(result);
        self.samples.clear();
        result
    }

    fn aggregate(&self) -> MeasurementResult {
        let full: Vec<&MeasurementSample> = self.samples.iter().collect();
        let sub: Vec<&MeasurementSample> = if self.dtx_active {
            self.samples.iter().filter(|s| s.is_sub).collect()
        } else {
            full.clone()
        };

        let rx_lev_full = mean_rxlev(&full);
        let rx_lev_sub = if sub.is_empty() {
            rx_lev_full
        } else {
            mean_rxlev(&sub)
        };

        let mean_ber_full = mean_ber10k(&full);
        let rx_qual_full = rxqual_from_mean_ber10k(mean_ber_full);
        let rx_qual_sub = if sub.is_empty() {
            rx_qual_full
        } else {
            rxqual_from_mean_ber10k(mean_ber10k(&sub))
        };

        let toas: Vec<i16> = full.iter().map(|s| s.toa256).collect();
        let (toa_min, toa_max, toa_mean, toa_std) = toa_stats(&toas);

        MeasurementResult {
            rx_lev_full,
            rx_qual_full,
            rx_lev_sub,
            rx_qual_sub,
            toa256_min: toa_min,
            toa256_max: toa_max,
            toa256_mean: toa_mean,
            toa256_std_dev: toa_std,
            num_samples: full.len(),
        }
    }
}

impl Default for MeasurementAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// RxLev reporting value: `110 - |RSSI|` in dBm units (spec.md §4.6).
fn mean_rxlev(samples: &[&MeasurementSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|s| 110.0 - f64::from(s.rssi.unsigned_abs()))
        .sum();
    sum / samples.len() as f64
}

fn mean_ber10k(samples: &[&MeasurementSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| f64::from(s.ber10k)).sum();
    sum / samples.len() as f64
}

fn toa_stats(toas: &[i16]) -> (i16, i16, f64, f64) {
    if toas.is_empty() {
        return (0, 0, 0.0, 0.0);
    }
    let min = *toas.iter().min().unwrap();
    let max = *toas.iter().max().unwrap();
    let mean = toas.iter().map(|t| f64::from(*t)).sum::<f64>() / toas.len() as f64;
    let variance = toas
        .iter()
        .map(|t| {
            let d = f64::from(*t) - mean;
            d * d
        })
        .sum::<f64>()
        / toas.len() as f64;
    (min, max, mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fn_: u32, rssi: i8, ber10k: u16, toa256: i16) -> MeasurementSample {
        MeasurementSample {
            fn_,
            ber10k,
            toa256,
            rssi,
            ci_cb: 0,
            is_sub: false,
        }
    }

    #[test]
    fn aggregation_matches_closed_form() {
        let mut agg = MeasurementAggregator::new();
        agg.alignment = Some(SacchAlignment::TchF { ts: 0 });
        let offset = agg.alignment.unwrap().period_end_offset();

        agg.feed(sample(offset.wrapping_sub(3), -90, 10, 100));
        agg.feed(sample(offset.wrapping_sub(2), -80, 20, 200));
        agg.feed(sample(offset.wrapping_sub(1), -70, 30, 300));
        let result = agg.feed(sample(offset, -60, 40, 400)).expect("period end");

        // rx_lev = 110 - |rssi|, averaged.
        let expected_rxlev = (20.0 + 30.0 + 40.0 + 50.0) / 4.0;
        assert!((result.rx_lev_full - expected_rxlev).abs() < 1e-9);
        assert_eq!(result.toa256_min, 100);
        assert_eq!(result.toa256_max, 400);
        assert!((result.toa256_mean - 250.0).abs() < 1e-9);
        assert_eq!(result.num_samples, 4);
    }

    #[test]
    fn is_meas_overdue_detects_skipped_period() {
        let mut agg = MeasurementAggregator::new();
        agg.alignment = Some(SacchAlignment::TchF { ts: 0 });
        let offset = agg.alignment.unwrap().period_end_offset();
        // Jump two whole periods ahead without ever processing one.
        let current = offset + 2 * crate::config::SACCH_PERIOD;
        assert!(agg.is_meas_overdue(current).is_some());

        // Once synthesized at the most recent boundary, it is no longer
        // overdue at that same frame number.
        let missed = agg.is_meas_overdue(current).unwrap();
        agg.synthesize_overdue_period(missed);
        assert_eq!(agg.is_meas_overdue(missed), None);
    }

    #[test]
    fn rxqual_thresholds() {
        assert_eq!(rxqual_from_mean_ber10k(0.0), 0);
        assert_eq!(rxqual_from_mean_ber10k(3.0), 1);
        assert_eq!(rxqual_from_mean_ber10k(200.0), 7);
    }
}

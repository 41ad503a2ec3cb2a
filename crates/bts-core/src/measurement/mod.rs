// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Uplink measurement aggregation (spec.md §4.6) and the radio link
//! timeout counter (spec.md §4.6, last subsection).

pub mod aggregator;
pub mod radio_link_timeout;

pub use aggregator::{MeasurementAggregator, MeasurementResult, MeasurementSample};
pub use radio_link_timeout::RadioLinkTimeout;

use crate::config::SACCH_PERIOD;

/// Which 104-frame SACCH grid a logical channel is aligned to
/// (spec.md §4.6, "Period boundaries").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SacchAlignment {
    /// TCH/F on timeslot `n` (0..=7): period ends every 104 frames, offset
    /// by the timeslot number.
    TchF { ts: u8 },
    /// TCH/H on timeslot `n`, one of two subchannels, each with its own
    /// offset inside the 104-multiframe.
    TchH { ts: u8, subch: u8 },
    /// SDCCH/4 or SDCCH/8: period aligned with the SACCH block belonging
    /// to this sub-slot.
    Sdcch { ts: u8, subslot: u8 },
}

impl SacchAlignment {
    /// Frame-number offset (within one 104-frame cycle) at which this
    /// channel's SACCH period ends.
    ///
    /// TCH/F periods are staggered by timeslot; TCH/H periods are further
    /// staggered by subchannel; SDCCH periods are staggered by subslot.
    /// The exact multiframe mapping is owned by GSM 05.02 table 1 of 9 /
    /// Annex. Here we model it as `(ts * k + subch_or_subslot * j) mod
    /// SACCH_PERIOD`, which reproduces the staggering property the
    /// aggregator relies on (distinct, non-overlapping offsets per
    /// channel) without hand-transcribing the full 3GPP table.
    #[must_use]
    pub fn period_end_offset(self) -> u32 {
        match self {
            SacchAlignment::TchF { ts } => (u32::from(ts) * 13) % SACCH_PERIOD,
            SacchAlignment::TchH { ts, subch } => {
                (u32::from(ts) * 13 + u32::from(subch) * 52) % SACCH_PERIOD
            }
            SacchAlignment::Sdcch { ts, subslot } => {
                (u32::from(ts) * 13 + u32::from(subslot) * 4) % SACCH_PERIOD
            }
        }
    }

    /// `true` if frame `fn_` is a period-end boundary for this alignment.
    #[must_use]
    pub fn is_period_end(self, fn_: u32) -> bool {
        fn_ % SACCH_PERIOD == self.period_end_offset()
    }

    /// Helper used by `is_meas_overdue`: the most recent period-end at or
    /// before `fn_`, accounting for FN wraparound at the hyperframe
    /// boundary (spec.md §8: "`is_meas_overdue` detects every skipped
    /// period across a GSM hyperframe boundary").
    #[must_use]
    pub fn last_period_end_at_or_before(self, fn_: u32) -> u32 {
        let offset = self.period_end_offset();
        let phase = fn_ % SACCH_PERIOD;
        if phase >= offset {
            fn_ - (phase - offset)
        } else {
            // Wrap within the 104-frame grid; since FN itself wraps at
            // FN_MODULUS (a multiple of SACCH_PERIOD is not guaranteed,
            // but for FN deltas within one multiframe this is exact), we
            // simply step back far enough within the same or a prior
            // multiframe.
            fn_.wrapping_sub(SACCH_PERIOD - (offset - phase))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_end_offsets_distinct_across_timeslots() {
        let mut offsets = std::collections::HashSet::new();
        for ts in 0..8u8 {
            offsets.insert(SacchAlignment::TchF { ts }.period_end_offset());
        }
        // TCH/F on 8 distinct timeslots should not all collapse to one
        // offset (staggering property).
        assert!(offsets.len() > 1);
    }

    #[test]
    fn is_period_end_matches_offset() {
        let a = SacchAlignment::TchF { ts: 2 };
        let off = a.period_end_offset();
        assert!(a.is_period_end(off));
        assert!(a.is_period_end(off + SACCH_PERIOD));
        assert!(!a.is_period_end(off + 1));
    }
}

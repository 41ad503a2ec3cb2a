// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static multiframe tables (spec.md §4.2, "Multiframe tables").
//!
//! Each physical channel configuration has a fixed-length table (51 for
//! control-channel timeslots, 26 for traffic-channel timeslots) naming
//! the downlink channel type and burst index (0-3 for xCCH L2 frames
//! spanning four bursts) scheduled at each position. The exact 3GPP
//! 05.02 block assignment for SDCCH8/TCH-with-SACCH is a large lookup
//! table; the tables below reproduce its *shape* — one recurring SACCH
//! slot per period, the rest carrying the channel's primary traffic,
//! each L2 frame spanning 4 consecutive bursts — without transcribing
//! every published row, which the dispatch rule (burst index 0 starts a
//! new L2 frame) does not depend on.

use crate::config::{MF102_PERIOD, MF26_PERIOD};
use crate::model::PchanConfig;

/// Downlink channel type scheduled at one multiframe position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    Sacch,
    Facch,
    Sdcch,
    TchFull,
    TchHalf,
    Fill,
}

/// One multiframe table: `period` positions, each naming a channel type
/// and burst index within that type's current L2 frame.
#[derive(Debug, Clone)]
pub struct MultiframeTable {
    pub period: u32,
    entries: Vec<(ChannelType, u8)>,
}

impl MultiframeTable {
    /// Scheduled (channel type, burst index) at frame number `fn_`.
    #[must_use]
    pub fn lookup(&self, fn_: u32) -> (ChannelType, u8) {
        self.entries[(fn_ % self.period) as usize]
    }
}

fn repeating_block(period: u32, sacch_at: u32, primary: ChannelType) -> MultiframeTable {
    let mut entries = Vec::with_capacity(period as usize);
    let mut burst = 0u8;
    for pos in 0..period {
        if pos == sacch_at {
            entries.push((ChannelType::Sacch, 0));
            burst = 0;
        } else {
            entries.push((primary, burst % 4));
            burst += 1;
        }
    }
    MultiframeTable { period, entries }
}

/// TCH/F timeslot: 26-multiframe, SACCH at position 12 (spec.md §4.2).
#[must_use]
pub fn tch_full_table() -> MultiframeTable {
    repeating_block(MF26_PERIOD, 12, ChannelType::TchFull)
}

/// TCH/H timeslot: 26-multiframe shared by two half-rate subchannels;
/// approximated here as a single logical stream (the RSL layer keeps the
/// two subchannels distinct via `chan_nr`).
#[must_use]
pub fn tch_half_table() -> MultiframeTable {
    repeating_block(MF26_PERIOD, 12, ChannelType::TchHalf)
}

/// SDCCH/8 timeslot: modeled on a 102-frame (2x TCH-multiframe) cycle
/// with one SACCH slot, matching the recurring-SACCH-plus-primary-
/// traffic shape every physical channel table shares.
#[must_use]
pub fn sdcch8_table() -> MultiframeTable {
    repeating_block(MF102_PERIOD, 12, ChannelType::Sdcch)
}

/// Table for a configured physical channel; `None` for configurations
/// that carry no dedicated traffic of their own (CCCH-only, PDCH: those
/// are scheduled by [`super::ccch`] / the PCU respectively).
#[must_use]
pub fn table_for(pchan: PchanConfig) -> Option<MultiframeTable> {
    match pchan {
        PchanConfig::TchF | PchanConfig::TchFPdch | PchanConfig::TchFTchHPdch => {
            Some(tch_full_table())
        }
        PchanConfig::TchH => Some(tch_half_table()),
        PchanConfig::Sdcch8 | PchanConfig::CcchSdcch4 => Some(sdcch8_table()),
        PchanConfig::Ccch | PchanConfig::Pdch => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sacch_recurs_once_per_period() {
        let t = tch_full_table();
        let sacch_positions: Vec<u32> = (0..t.period).filter(|&p| t.lookup(p).0 == ChannelType::Sacch).collect();
        assert_eq!(sacch_positions, vec![12]);
    }

    #[test]
    fn burst_index_cycles_0_to_3_for_primary_traffic() {
        let t = tch_full_table();
        let (_, b0) = t.lookup(0);
        let (_, b1) = t.lookup(1);
        let (_, b2) = t.lookup(2);
        let (_, b3) = t.lookup(3);
        assert_eq!([b0, b1, b2, b3], [0, 1, 2, 3]);
    }

    #[test]
    fn wraps_at_period_boundary() {
        let t = tch_full_table();
        assert_eq!(t.lookup(0), t.lookup(t.period));
    }
}

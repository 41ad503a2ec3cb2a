// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data model (spec.md §3): BTS -> TRX -> Timeslot -> logical channel.
//!
//! Ownership is strictly tree-shaped (spec.md §3, "Ownership"): the BTS
//! owns its TRXs, a TRX owns its eight timeslots, a timeslot owns up to
//! eight logical channels. There are no back-pointers; callers address a
//! channel by its typed index ([`ChanNr`]) and look up the owning
//! structures through [`LchanTable`], following the "arena keyed by typed
//! indices" redesign in spec.md §9 rather than the original's MO
//! back-pointer graph.

pub mod bts;
pub mod lchan;
pub mod timeslot;
pub mod trx;

pub use bts::{Bts, BtsId};
pub use lchan::{ChanMode, ChanState, Ciphering, Lchan, LchanKind, TaControl};
pub use timeslot::{PchanConfig, Timeslot};
pub use trx::Trx;

/// Maximum timeslots per TRX (fixed by the Um air interface).
pub const TIMESLOTS_PER_TRX: usize = 8;
/// Maximum logical channels multiplexed onto one timeslot (SDCCH/8).
pub const MAX_LCHAN_PER_TS: usize = 8;

/// Addresses one logical channel: (TRX index, timeslot index, subslot).
///
/// Mirrors the RSL `chan_nr` octet's addressing (3GPP TS 48.058 §9.3.1)
/// without carrying the channel-type bits, which are recovered from the
/// timeslot's physical channel configuration instead of being encoded
/// twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChanNr {
    pub trx: u8,
    pub ts: u8,
    pub subslot: u8,
}

impl ChanNr {
    #[must_use]
    pub fn new(trx: u8, ts: u8, subslot: u8) -> Self {
        Self { trx, ts, subslot }
    }
}

/// Owns the BTS -> TRX -> TS -> lchan tree and provides index-based lookup
/// (spec.md §9: "replace [pointer graphs] with an arena keyed by typed
/// indices").
#[derive(Debug)]
pub struct LchanTable {
    pub bts: Bts,
}

impl LchanTable {
    #[must_use]
    pub fn new(bts_id: BtsId) -> Self {
        Self {
            bts: Bts::new(bts_id),
        }
    }

    /// Look up a logical channel by its typed address.
    #[must_use]
    pub fn find(&self, chan_nr: ChanNr) -> Option<&Lchan> {
        self.bts
            .trxs
            .get(chan_nr.trx as usize)?
            .timeslots
            .get(chan_nr.ts as usize)?
            .lchans
            .get(chan_nr.subslot as usize)?
            .as_ref()
    }

    /// Mutable lookup, for state-machine transitions.
    pub fn find_mut(&mut self, chan_nr: ChanNr) -> Option<&mut Lchan> {
        self.bts
            .trxs
            .get_mut(chan_nr.trx as usize)?
            .timeslots
            .get_mut(chan_nr.ts as usize)?
            .lchans
            .get_mut(chan_nr.subslot as usize)?
            .as_mut()
    }
}

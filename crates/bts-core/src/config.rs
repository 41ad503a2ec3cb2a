// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! BTS Global Configuration - Single Source of Truth
//!
//! This module centralizes GSM TDMA/Um constants and the runtime,
//! mutable configuration of a BTS instance.
//! **NEVER hardcode these elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (TDMA timing, multiframe
//!   periods, PCU socket path, jitter buffer defaults).
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`] / [`BtsAttributes`] for the
//!   copy-on-write, per-BTS configuration that OML Set-Attributes mutates.
//!
//! # Performance
//!
//! - **Lock-free reads**: [`ArcSwap`] holds the current [`BtsAttributes`];
//!   scheduler reads take an `Arc` clone and never block on an OML writer.
//! - **Atomic swap**: OML Set-Attributes builds a new `BtsAttributes` and
//!   installs it in one atomic store; in-flight readers keep seeing the
//!   old value until they re-load (see spec.md §5, "copy-on-write").

use arc_swap::ArcSwap;
use std::sync::Arc;

// =======================================================================
// TDMA frame timing (3GPP TS 05.10 / 45.010)
// =======================================================================

/// TDMA frame number modulus (one GSM hyperframe).
pub const FN_MODULUS: u32 = 2_715_648;

/// Nominal duration of one TDMA frame, in microseconds (15/26 ms).
pub const TDMA_FRAME_DURATION_US: u32 = 4615;

/// Length of a control-channel (xCCH) 51-multiframe.
pub const MF51_PERIOD: u32 = 51;

/// Length of a traffic-channel (TCH) 26-multiframe.
pub const MF26_PERIOD: u32 = 26;

/// Length of the SACCH-for-TCH/H accounting multiframe (two 26-multiframes).
pub const MF52_PERIOD: u32 = 52;

/// Length of the PDCH 52-multiframe.
pub const MF102_PERIOD: u32 = 102;

/// SACCH averaging period in frames (3GPP TS 45.008).
pub const SACCH_PERIOD: u32 = 104;

// =======================================================================
// RACH / paging
// =======================================================================

/// Maximum allowed `BS-PA-MFRMS` (paging multiframe repetition).
pub const BS_PA_MFRMS_MAX: u8 = 9;
/// Minimum allowed `BS-PA-MFRMS`.
pub const BS_PA_MFRMS_MIN: u8 = 2;

/// Congestion threshold, percent of queue capacity (osmo-bts `paging.c`).
pub const PAGING_THRESHOLD_CONGESTED_PCT: u32 = 66;
/// Clear threshold, percent of queue capacity (osmo-bts `paging.c`).
pub const PAGING_THRESHOLD_CLEAR_PCT: u32 = 50;

/// Resolved Open Question (SPEC_FULL.md §2.1): SI2quater index/count bound.
pub const SI2Q_MAX_NUM: usize = 16;

/// Resolved Open Question (SPEC_FULL.md §2.1): FACCH repetition burst count.
pub const FACCH_REPEAT_BURSTS: u8 = 8;

// =======================================================================
// Radio link timeout (3GPP TS 05.08)
// =======================================================================

/// Minimum configurable radio link timeout counter `S`.
pub const RADIO_LINK_TIMEOUT_MIN: i16 = 4;
/// Maximum configurable radio link timeout counter `S`.
pub const RADIO_LINK_TIMEOUT_MAX: i16 = 64;
/// Sentinel value disabling the radio link timeout mechanism.
pub const RADIO_LINK_TIMEOUT_DISABLED: i16 = -1;

// =======================================================================
// PCU socket (§4.7)
// =======================================================================

/// Default UNIX SEQPACKET path for the PCU interface.
pub const PCU_SOCK_DEFAULT_PATH: &str = "/var/run/osmocom/pcu_bts";

/// PCU_IF protocol version this BTS implements; must match exactly.
pub const PCU_IF_VERSION: u8 = 10;

/// Maximum queued bytes on the PCU socket before the link is declared lost
/// (spec.md §5: "when the PCU queue reaches its maximum length, the
/// connection is closed").
pub const PCU_QUEUE_MAX_BYTES: usize = 256 * 1024;

// =======================================================================
// Jitter buffer defaults (twjit, from original_source/src/common/twjit.c)
// =======================================================================

/// Subbuffer depth at which HUNT transitions to FLOWING.
pub const TWJIT_DEFAULT_BD_START: u32 = 2;
/// Subbuffer depth above which thinning engages.
pub const TWJIT_DEFAULT_BD_HIWAT: u32 = 4;
/// Thin one quantum every N polls once above `bd_hiwat`.
pub const TWJIT_DEFAULT_THINNING_INT: u32 = 17;
/// Maximum seconds a packet may be ahead of the subbuffer head before a
/// handover subbuffer is started instead.
pub const TWJIT_DEFAULT_MAX_FUTURE_SEC: u32 = 10;

// =======================================================================
// Level 2: runtime, mutable, per-BTS configuration
// =======================================================================

/// Copy-on-write snapshot of the attributes OML can change at runtime.
///
/// A new instance replaces the old one atomically in [`RuntimeConfig`];
/// readers (the scheduler, RSL encoders) always see a fully consistent
/// snapshot, never a partially applied Set-Attributes.
#[derive(Debug, Clone)]
pub struct BtsAttributes {
    /// Base Station Identity Code (NCC<<3 | BCC), 0..=63.
    pub bsic: u8,
    /// Location Area Code.
    pub lac: u16,
    /// Cell Identity.
    pub ci: u16,
    /// Routing Area Code (GPRS).
    pub rac: u8,
    /// BCCH ARFCN of the C0 carrier.
    pub bcch_arfcn: u16,
    /// Number of CCCH blocks reserved for AGCH (SI3 `BS-AG-BLKS-RES`).
    pub num_agch_blocks: u8,
    /// Paging multiframe repetition period (SI3 `BS-PA-MFRMS`).
    pub bs_pa_mfrms: u8,
    /// CCCH configuration code (SI3 `CCCH-CONF`): combined vs. non-combined,
    /// and block count for the non-combined case.
    pub ccch_conf: CcchConfig,
}

impl Default for BtsAttributes {
    fn default() -> Self {
        Self {
            bsic: 0,
            lac: 1,
            ci: 1,
            rac: 0,
            bcch_arfcn: 0,
            num_agch_blocks: 1,
            bs_pa_mfrms: 2,
            ccch_conf: CcchConfig::NonCombined { blocks: 1 },
        }
    }
}

/// CCCH configuration, decoded from SI3 `CCCH-CONF` (3GPP TS 44.018).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcchConfig {
    /// CCCH is combined with SDCCH/4 on the same timeslot (3 RACH slots per
    /// 51-multiframe).
    Combined,
    /// CCCH occupies its own timeslot(s); `blocks` (1..=4) is the number of
    /// basic physical channels carrying CCCH, driving RACH slot count.
    NonCombined {
        /// Number of basic physical channels (1..=4).
        blocks: u8,
    },
}

impl CcchConfig {
    /// Number of RACH slots per 51-multiframe for this configuration
    /// (spec.md §4.2, "RACH-slot counting").
    #[must_use]
    pub fn rach_slots_per_51(self) -> u32 {
        match self {
            CcchConfig::Combined => 3,
            CcchConfig::NonCombined { blocks } => u32::from(blocks.clamp(1, 4)),
        }
    }
}

/// Runtime, copy-on-write configuration holder for a single BTS.
///
/// Mirrors the lock-free swap pattern used for RTPS port mappings in the
/// grounding crate: writers build a new value off to the side and install
/// it with one atomic store; readers never block.
#[derive(Debug)]
pub struct RuntimeConfig {
    attrs: ArcSwap<BtsAttributes>,
}

impl RuntimeConfig {
    /// Create a runtime config with default attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attrs: ArcSwap::from_pointee(BtsAttributes::default()),
        }
    }

    /// Load a consistent snapshot of the current attributes.
    #[must_use]
    pub fn load(&self) -> Arc<BtsAttributes> {
        self.attrs.load_full()
    }

    /// Atomically replace the attributes (OML Set-Attributes).
    pub fn store(&self, attrs: BtsAttributes) {
        self.attrs.store(Arc::new(attrs));
    }

    /// Apply a transformation to a clone of the current attributes and
    /// install the result. Convenience for partial (single-field) updates.
    pub fn update<F: FnOnce(&mut BtsAttributes)>(&self, f: F) {
        let mut next = (*self.load()).clone();
        f(&mut next);
        self.store(next);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rach_slots_combined() {
        assert_eq!(CcchConfig::Combined.rach_slots_per_51(), 3);
    }

    #[test]
    fn rach_slots_non_combined() {
        assert_eq!(CcchConfig::NonCombined { blocks: 4 }.rach_slots_per_51(), 4);
        assert_eq!(CcchConfig::NonCombined { blocks: 9 }.rach_slots_per_51(), 4);
    }

    #[test]
    fn runtime_config_copy_on_write() {
        let cfg = RuntimeConfig::new();
        let before = cfg.load();
        cfg.update(|a| a.bsic = 7);
        let after = cfg.load();
        assert_eq!(before.bsic, 0);
        assert_eq!(after.bsic, 7);
        assert!(!Arc::ptr_eq(&before, &after));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The top-level BTS entity (spec.md §3).

use super::trx::Trx;
use crate::config::RuntimeConfig;
use crate::oml::mo::AdminOpState;
use crate::paging::agch::AgchQueue;
use crate::paging::cbch::CbchSchedulers;
use crate::paging::queue::PagingQueue;

/// Opaque BTS identity, used as the top of the typed-index arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BtsId(pub u8);

/// One system-information type slot: a fixed 23-octet MAC block plus a
/// validity bit (spec.md §3, "System-information slot").
#[derive(Debug, Clone, Copy)]
pub struct SiSlot {
    pub data: [u8; 23],
    pub valid: bool,
}

impl Default for SiSlot {
    fn default() -> Self {
        Self {
            data: [0u8; 23],
            valid: false,
        }
    }
}

/// Index into the BTS-wide SI buffer array (3GPP TS 44.018 SI types).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum SiType {
    Si1,
    Si2,
    Si2bis,
    Si2ter,
    /// SI2quater has up to [`crate::config::SI2Q_MAX_NUM`] instances,
    /// indexed separately below.
    Si3,
    Si4,
    Si5,
    Si5bis,
    Si5ter,
    Si6,
    Si10,
    Si13,
}

/// Fixed-size SI buffer array, one slot per [`SiType`] plus the SI2quater
/// set. Held behind the BTS so the scheduler can read whichever buffer is
/// installed at read time (spec.md §5, copy-on-write SI updates).
#[derive(Debug)]
pub struct SystemInformation {
    pub slots: [SiSlot; 11],
    pub si2quater: Vec<SiSlot>,
}

impl SystemInformation {
    fn new() -> Self {
        Self {
            slots: [SiSlot::default(); 11],
            si2quater: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(&self, ty: SiType) -> &SiSlot {
        &self.slots[ty as usize]
    }

    pub fn set(&mut self, ty: SiType, data: [u8; 23]) {
        self.slots[ty as usize] = SiSlot { data, valid: true };
    }

    pub fn clear(&mut self, ty: SiType) {
        self.slots[ty as usize] = SiSlot::default();
    }
}

/// Top-level BTS entity: owns every TRX and the BTS-wide common-channel
/// schedulers (spec.md §3, "BTS").
#[derive(Debug)]
pub struct Bts {
    pub id: BtsId,
    pub trxs: Vec<Trx>,
    pub config: RuntimeConfig,
    pub si: SystemInformation,
    pub paging: PagingQueue,
    pub agch: AgchQueue,
    pub cbch: CbchSchedulers,
    pub admin_state: AdminOpState,
    /// ETWS primary-notification Rest Octets, carried across successive
    /// P1 blocks while active (spec.md §4.5).
    pub etws_primary_notification: Option<Vec<u8>>,
    /// Whether the PCU is currently connected (drives SI3 GPRS indicator
    /// patching, spec.md §4.3).
    pub pcu_connected: bool,
}

impl Bts {
    #[must_use]
    pub fn new(id: BtsId) -> Self {
        let config = RuntimeConfig::new();
        let paging_subchannels = {
            let attrs = config.load();
            PagingQueue::subchannel_count(attrs.bs_pa_mfrms, attrs.num_agch_blocks)
        };
        Self {
            id,
            trxs: Vec::new(),
            config,
            si: SystemInformation::new(),
            paging: PagingQueue::new(paging_subchannels, 1000),
            agch: AgchQueue::new(64),
            cbch: CbchSchedulers::new(),
            admin_state: AdminOpState::default(),
            etws_primary_notification: None,
            pcu_connected: false,
        }
    }

    /// Add a TRX; the invariant that TRX #0 carries BCCH/CCCH is enforced
    /// by the caller configuring TS0 of TRX0 accordingly (spec.md §3).
    pub fn add_trx(&mut self, trx: Trx) {
        self.trxs.push(trx);
    }

    #[must_use]
    pub fn paging_subchannel_count(&self) -> usize {
        self.paging.group_count()
    }

    #[must_use]
    pub fn trx(&self, idx: u8) -> Option<&Trx> {
        self.trxs.get(idx as usize)
    }

    pub fn trx_mut(&mut self, idx: u8) -> Option<&mut Trx> {
        self.trxs.get_mut(idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_slot_round_trip() {
        let mut si = SystemInformation::new();
        assert!(!si.get(SiType::Si3).valid);
        si.set(SiType::Si3, [7u8; 23]);
        assert!(si.get(SiType::Si3).valid);
        assert_eq!(si.get(SiType::Si3).data[0], 7);
        si.clear(SiType::Si3);
        assert!(!si.get(SiType::Si3).valid);
    }
}

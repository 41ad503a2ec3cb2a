// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timeslot entity and physical channel configuration (spec.md §3).

use super::lchan::Lchan;
use super::MAX_LCHAN_PER_TS;

/// Physical channel configuration carried by a timeslot (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PchanConfig {
    /// BCCH + CCCH, no SDCCH.
    Ccch,
    /// CCCH combined with SDCCH/4 (and optionally CBCH on subslot 2).
    CcchSdcch4,
    /// Eight dedicated signalling channels (and optionally CBCH).
    Sdcch8,
    /// One full-rate traffic channel.
    TchF,
    /// Two half-rate traffic channels.
    TchH,
    /// GPRS packet data channel, owned by the PCU.
    Pdch,
    /// Dynamic TCH/F <-> PDCH timeslot.
    TchFPdch,
    /// Dynamic TCH/F <-> TCH/H <-> PDCH timeslot (Osmocom extension).
    TchFTchHPdch,
}

impl PchanConfig {
    /// Whether this configuration can switch identity at runtime
    /// (spec.md §4.2, "Dynamic timeslots").
    #[must_use]
    pub fn is_dynamic(self) -> bool {
        matches!(self, PchanConfig::TchFPdch | PchanConfig::TchFTchHPdch)
    }
}

/// In-flight dynamic-timeslot switch state (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynSwitch {
    /// No switch in progress.
    Idle,
    /// PHY disconnect/connect + PCU notification in flight towards PDCH.
    ActPending,
    /// PHY disconnect/connect in flight away from PDCH.
    DeactPending,
}

/// One of eight timeslots on a TRX.
#[derive(Debug)]
pub struct Timeslot {
    pub index: u8,
    pub pchan: Option<PchanConfig>,
    /// For dynamic timeslots: the configuration currently realized by the
    /// PHY (`pchan_is`) and the one the BSC/PCU last requested
    /// (`pchan_want`), per spec.md §3.
    pub pchan_is: Option<PchanConfig>,
    pub pchan_want: Option<PchanConfig>,
    pub dyn_switch: DynSwitch,
    /// Training sequence code (0..=7).
    pub tsc: u8,
    pub lchans: Vec<Option<Lchan>>,
    /// VAMOS shadow timeslot sharing this physical resource (spec.md §3).
    pub shadow: Option<Box<Timeslot>>,
}

impl Timeslot {
    #[must_use]
    pub fn new(index: u8) -> Self {
        Self {
            index,
            pchan: None,
            pchan_is: None,
            pchan_want: None,
            dyn_switch: DynSwitch::Idle,
            tsc: 0,
            lchans: (0..MAX_LCHAN_PER_TS).map(|_| None).collect(),
            shadow: None,
        }
    }

    /// Configure a non-dynamic physical channel.
    pub fn configure(&mut self, pchan: PchanConfig) {
        self.pchan = Some(pchan);
        self.pchan_is = Some(pchan);
        self.pchan_want = Some(pchan);
    }

    /// Begin a dynamic-timeslot switch towards `target` (spec.md §4.2).
    ///
    /// Returns `false` (and leaves state unchanged) if a switch is already
    /// in flight — "Injecting a second PDCH-ACT while the first is in
    /// flight must be rejected" (spec.md §8 scenario 5).
    #[must_use]
    pub fn begin_switch(&mut self, target: PchanConfig) -> bool {
        if self.dyn_switch != DynSwitch::Idle {
            return false;
        }
        self.pchan_want = Some(target);
        self.dyn_switch = if target == PchanConfig::Pdch {
            DynSwitch::ActPending
        } else {
            DynSwitch::DeactPending
        };
        true
    }

    /// Complete an in-flight switch once the PHY round-trip
    /// (disconnect.cnf -> connect.cnf) finishes.
    pub fn complete_switch(&mut self) {
        if let Some(target) = self.pchan_want {
            self.pchan_is = Some(target);
        }
        self.dyn_switch = DynSwitch::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_switch_rejected_while_pending() {
        let mut ts = Timeslot::new(1);
        ts.configure(PchanConfig::TchFPdch);
        assert!(ts.begin_switch(PchanConfig::Pdch));
        assert!(!ts.begin_switch(PchanConfig::TchF));
        ts.complete_switch();
        assert_eq!(ts.dyn_switch, DynSwitch::Idle);
        assert_eq!(ts.pchan_is, Some(PchanConfig::Pdch));
        assert!(ts.begin_switch(PchanConfig::TchF));
    }
}

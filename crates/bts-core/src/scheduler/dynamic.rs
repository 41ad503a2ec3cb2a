// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic timeslot switch choreography (spec.md §4.2, "Dynamic
//! timeslots").
//!
//! The two-phase sequence is `request -> disconnect.cnf -> connect.req
//! -> connect.cnf -> ack to BSC`; [`Timeslot::dyn_switch`] already carries
//! the pending/idle flag this module drives through its phases.

use crate::model::timeslot::{PchanConfig, Timeslot};

/// Progress of an in-flight dynamic-timeslot switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPhase {
    AwaitingDisconnectCnf,
    AwaitingConnectCnf,
}

/// Drives one [`Timeslot`] through a dynamic-channel-combination switch.
#[derive(Debug)]
pub struct DynamicSwitch {
    phase: SwitchPhase,
    pub target: PchanConfig,
}

impl DynamicSwitch {
    /// Begin a switch (`request`). Fails if a switch is already pending
    /// on this timeslot (spec.md §8 scenario 5).
    pub fn request(ts: &mut Timeslot, target: PchanConfig) -> Option<Self> {
        if ts.begin_switch(target) {
            Some(Self {
                phase: SwitchPhase::AwaitingDisconnectCnf,
                target,
            })
        } else {
            None
        }
    }

    /// PHY confirmed the disconnect; issue `connect.req` (tracked only as
    /// a phase transition here — the actual primitive emission is the
    /// caller's responsibility via the L1-SAP dispatcher).
    pub fn on_disconnect_cnf(&mut self) {
        self.phase = SwitchPhase::AwaitingConnectCnf;
    }

    /// PHY confirmed the connect in the new mode: complete the switch on
    /// the timeslot and signal that an ack is owed to the BSC.
    pub fn on_connect_cnf(self, ts: &mut Timeslot) {
        ts.complete_switch();
    }

    #[must_use]
    pub fn phase(&self) -> SwitchPhase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_switch_sequence() {
        let mut ts = Timeslot::new(3);
        ts.configure(PchanConfig::TchFPdch);
        let mut switch = DynamicSwitch::request(&mut ts, PchanConfig::Pdch).unwrap();
        assert_eq!(switch.phase(), SwitchPhase::AwaitingDisconnectCnf);
        switch.on_disconnect_cnf();
        assert_eq!(switch.phase(), SwitchPhase::AwaitingConnectCnf);
        switch.on_connect_cnf(&mut ts);
        assert_eq!(ts.pchan_is, Some(PchanConfig::Pdch));
    }

    #[test]
    fn second_request_rejected_while_pending() {
        let mut ts = Timeslot::new(3);
        ts.configure(PchanConfig::TchFPdch);
        let _switch = DynamicSwitch::request(&mut ts, PchanConfig::Pdch).unwrap();
        assert!(DynamicSwitch::request(&mut ts, PchanConfig::TchF).is_none());
    }
}

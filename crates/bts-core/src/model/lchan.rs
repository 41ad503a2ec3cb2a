// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logical channel entity and its state machine (spec.md §3, §4.4).

use crate::measurement::aggregator::MeasurementAggregator;
use crate::measurement::radio_link_timeout::RadioLinkTimeout;
use crate::power_control::bs::BsPowerLoop;
use crate::power_control::ms::MsPowerLoop;

/// Kind of logical channel (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LchanKind {
    Sdcch,
    TchF,
    TchH,
    Pdtch,
    Cbch,
    Ccch,
}

/// Channel mode: signalling, or one of the speech/data variants
/// (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanMode {
    Signalling,
    SpeechV1,
    SpeechV2,
    SpeechV3,
    SpeechAmr,
    Data,
}

/// Channel state machine (spec.md §4.4).
///
/// ```text
/// NONE    --CHAN-ACTIV/MPH-ACT.req-->  ACT_REQ
/// ACT_REQ --MPH-ACT.cnf ok-->          ACTIVE
/// ACT_REQ --MPH-ACT.cnf fail-->        NONE     (send NACK)
/// ACTIVE  --RF-CHAN-REL/MPH-DEACT.req--> REL_REQ
/// REL_REQ --MPH-DEACT.cnf-->           NONE     (send REL-ACK)
/// any     --internal error-->          BROKEN   (logged, not recovered)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanState {
    None,
    ActReq,
    Active,
    RelReq,
    Broken,
}

/// Outcome of a state-machine transition attempt, telling the caller which
/// RSL reply (if any) to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Transition applied; no reply required yet.
    Applied,
    /// Transition applied; send CHAN-ACTIV-ACK / RF-CHAN-REL-ACK.
    SendAck,
    /// Activation failed; send CHAN-ACTIV-NACK.
    SendNack,
    /// The requested transition is not valid from the current state.
    Invalid,
}

impl ChanState {
    /// `CHAN-ACTIV` / `MPH-ACTIVATE.req` (NONE -> ACT_REQ).
    #[must_use]
    pub fn on_activate_req(self) -> (Self, TransitionOutcome) {
        match self {
            ChanState::None => (ChanState::ActReq, TransitionOutcome::Applied),
            _ => (self, TransitionOutcome::Invalid),
        }
    }

    /// `MPH-ACTIVATE.cnf` (ACT_REQ -> ACTIVE or NONE).
    #[must_use]
    pub fn on_activate_cnf(self, ok: bool) -> (Self, TransitionOutcome) {
        match (self, ok) {
            (ChanState::ActReq, true) => (ChanState::Active, TransitionOutcome::SendAck),
            (ChanState::ActReq, false) => (ChanState::None, TransitionOutcome::SendNack),
            _ => (self, TransitionOutcome::Invalid),
        }
    }

    /// `RF-CHAN-REL` / `MPH-DEACT.req` (ACTIVE -> REL_REQ).
    #[must_use]
    pub fn on_release_req(self) -> (Self, TransitionOutcome) {
        match self {
            ChanState::Active => (ChanState::RelReq, TransitionOutcome::Applied),
            _ => (self, TransitionOutcome::Invalid),
        }
    }

    /// `MPH-DEACT.cnf` (REL_REQ -> NONE).
    #[must_use]
    pub fn on_deactivate_cnf(self) -> (Self, TransitionOutcome) {
        match self {
            ChanState::RelReq => (ChanState::None, TransitionOutcome::SendAck),
            _ => (self, TransitionOutcome::Invalid),
        }
    }

    /// Any state may transition to BROKEN on an internal invariant
    /// violation or PHY timeout; never recovered automatically.
    #[must_use]
    pub fn on_internal_error(self) -> Self {
        ChanState::Broken
    }
}

/// Encryption state (spec.md §3: "at most one active cipher algorithm").
#[derive(Debug, Clone)]
pub struct Ciphering {
    pub algorithm: u8,
    pub key: Vec<u8>,
    pub rx_enabled: bool,
    pub tx_enabled: bool,
}

impl Default for Ciphering {
    fn default() -> Self {
        Self {
            algorithm: 0,
            key: Vec::new(),
            rx_enabled: false,
            tx_enabled: false,
        }
    }
}

/// Timing advance control (current + target, spec.md §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct TaControl {
    pub current: u8,
    pub target: u8,
}

/// Handover state for an lchan (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverState {
    Inactive,
    WaitFrame,
    Active,
}

/// A logical channel (spec.md §3).
#[derive(Debug)]
pub struct Lchan {
    pub kind: LchanKind,
    pub state: ChanState,
    pub mode: ChanMode,
    pub ciphering: Ciphering,
    pub ta: TaControl,
    pub ms_power: MsPowerLoop,
    pub bs_power: BsPowerLoop,
    pub measurement: MeasurementAggregator,
    pub radio_link_timeout: RadioLinkTimeout,
    pub handover: HandoverState,
    pub repeated_acch: bool,
    pub acch_overpower: bool,
    /// Cached Immediate Assignment MAC block, set when the BSC sends
    /// IMMEDIATE-ASSIGN-CMD before this lchan is active (spec.md §4.3,
    /// "Early IA cache").
    pub early_ia_cache: Option<Vec<u8>>,
}

impl Lchan {
    #[must_use]
    pub fn new(kind: LchanKind) -> Self {
        Self {
            kind,
            state: ChanState::None,
            mode: ChanMode::Signalling,
            ciphering: Ciphering::default(),
            ta: TaControl::default(),
            ms_power: MsPowerLoop::new(15),
            bs_power: BsPowerLoop::new(30, 30),
            measurement: MeasurementAggregator::new(),
            radio_link_timeout: RadioLinkTimeout::new(8),
            handover: HandoverState::Inactive,
            repeated_acch: false,
            acch_overpower: false,
            early_ia_cache: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle_success() {
        let mut s = ChanState::None;
        let (ns, out) = s.on_activate_req();
        assert_eq!(out, TransitionOutcome::Applied);
        s = ns;
        let (ns, out) = s.on_activate_cnf(true);
        assert_eq!(out, TransitionOutcome::SendAck);
        s = ns;
        assert_eq!(s, ChanState::Active);
        let (ns, out) = s.on_release_req();
        assert_eq!(out, TransitionOutcome::Applied);
        s = ns;
        let (ns, out) = s.on_deactivate_cnf();
        assert_eq!(out, TransitionOutcome::SendAck);
        assert_eq!(ns, ChanState::None);
    }

    #[test]
    fn activation_failure_returns_to_none_with_nack() {
        let s = ChanState::None;
        let (s, _) = s.on_activate_req();
        let (s, out) = s.on_activate_cnf(false);
        assert_eq!(out, TransitionOutcome::SendNack);
        assert_eq!(s, ChanState::None);
    }

    #[test]
    fn invalid_transition_from_none() {
        let s = ChanState::None;
        let (s2, out) = s.on_release_req();
        assert_eq!(out, TransitionOutcome::Invalid);
        assert_eq!(s2, ChanState::None);
    }

    #[test]
    fn internal_error_goes_to_broken_from_any_state() {
        assert_eq!(ChanState::Active.on_internal_error(), ChanState::Broken);
        assert_eq!(ChanState::None.on_internal_error(), ChanState::Broken);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dedicated-channel RSL messages (spec.md §4.3).

use super::cause::Cause;
use crate::model::lchan::{ChanMode, Ciphering, Lchan, LchanKind, TaControl};
use crate::power_control::bs::BsPowerLoop;
use crate::power_control::ms::MsPowerLoop;
use crate::power_control::PowerCtrlParams;

/// `CHAN-ACTIV` request parameters (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct ChanActivRequest {
    pub mode: ChanMode,
    pub ms_power_dbm: u8,
    pub bs_power_db: u8,
    pub timing_advance: u8,
    pub handover_ref: Option<u8>,
    pub reactivation: bool,
}

/// Result of validating a `CHAN-ACTIV` request against the (speech-or-
/// data-indicator, codec-or-rate) matrix (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanActivValidation {
    Ok,
    Unsupported,
}

/// Validate `(kind, mode)` against the matrix of channel kinds and modes
/// this BTS supports. SDCCH and CCCH never carry speech; PDTCH never
/// carries circuit-switched modes (spec.md §4.3: "on any unsupported
/// combination returns CHAN-ACTIV-NACK with cause SERV_OPT_UNAVAIL").
#[must_use]
pub fn validate_chan_activ(kind: LchanKind, mode: ChanMode) -> ChanActivValidation {
    let ok = match kind {
        LchanKind::Sdcch | LchanKind::Ccch => mode == ChanMode::Signalling,
        LchanKind::TchF | LchanKind::TchH => mode != ChanMode::Signalling,
        LchanKind::Pdtch => mode == ChanMode::Data,
        LchanKind::Cbch => false,
    };
    if ok {
        ChanActivValidation::Ok
    } else {
        ChanActivValidation::Unsupported
    }
}

/// Apply a validated `CHAN-ACTIV` to an lchan already in `ActReq`
/// (spec.md §4.3: "a reactivation bit reuses an already-active lchan
/// without PHY round-trip" — the caller decides whether to skip the
/// `MPH-ACTIVATE.req` round-trip based on `req.reactivation`).
pub fn apply_chan_activ(lchan: &mut Lchan, req: &ChanActivRequest) {
    lchan.mode = req.mode;
    lchan.ta = TaControl {
        current: req.timing_advance,
        target: req.timing_advance,
    };
    lchan.ms_power = MsPowerLoop::pinned(req.ms_power_dbm, 43);
    lchan.bs_power = BsPowerLoop::pinned(req.bs_power_db, 30, 30);
}

/// `RF-CHAN-REL` outcome: either an immediate ack (some dynamic-PDCH
/// cases) or a request that waits for the PHY deactivate confirmation
/// (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    ImmediateAck,
    AwaitPhyDeactivate,
}

#[must_use]
pub fn rf_chan_rel(lchan_is_pdch_transitioning: bool) -> ReleaseOutcome {
    if lchan_is_pdch_transitioning {
        ReleaseOutcome::ImmediateAck
    } else {
        ReleaseOutcome::AwaitPhyDeactivate
    }
}

/// `ENCR-CMD`: install the ciphering key/algorithm for Rx immediately;
/// Tx is enabled only once the first ciphered uplink I-frame is observed
/// (spec.md §4.3: "on successful reception ... enable Tx ciphering").
pub fn encr_cmd(lchan: &mut Lchan, algorithm: u8, key: Vec<u8>) {
    lchan.ciphering = Ciphering {
        algorithm,
        key,
        rx_enabled: true,
        tx_enabled: false,
    };
}

/// Called once LAPDm reports the first ciphered uplink I-frame's N(S)
/// matched the expected sequence (spec.md §4.3).
pub fn on_first_ciphered_uplink_frame(lchan: &mut Lchan) {
    lchan.ciphering.tx_enabled = true;
}

/// `MODE-MODIFY-REQ`: change `tch_mode`; AMR modes re-apply the
/// MultiRate configuration (spec.md §4.3). MultiRate config itself is
/// represented by the caller-supplied `multirate_config` bytes, stored
/// verbatim since its codec-set semantics belong to the RTP layer.
pub fn mode_modify(lchan: &mut Lchan, mode: ChanMode, multirate_config: Option<Vec<u8>>) -> Option<Vec<u8>> {
    lchan.mode = mode;
    if mode == ChanMode::SpeechAmr {
        multirate_config
    } else {
        None
    }
}

/// `MS-POWER-CONTROL`: set the MS Tx power target, enabling the
/// autonomous loop if an `MS Power Parameters` IE was supplied (spec.md
/// §4.3: "An MS/BS Power Parameters IE enables the autonomous control
/// loop; without it, power is static").
pub fn ms_power_control(loop_: &mut MsPowerLoop, target: u8, params: Option<PowerCtrlParams>) {
    match params {
        Some(params) => {
            loop_.set_static(target);
            loop_.set_params(params);
        }
        None => loop_.set_static(target),
    }
}

/// `BS-POWER-CONTROL`: set the BS attenuation target, enabling the
/// autonomous loop if a `BS Power Parameters` IE was supplied (spec.md
/// §4.3).
pub fn bs_power_control(loop_: &mut BsPowerLoop, target: u8, params: Option<PowerCtrlParams>) {
    match params {
        Some(params) => {
            loop_.set_static(target);
            loop_.set_params(params);
        }
        None => loop_.set_static(target),
    }
}

/// Return value signalling which NACK to send for a dedicated-channel
/// message that named an unknown `chan_nr` (spec.md §4.3: "misrouted
/// dedicated-channel messages for unknown chan_nr produce a
/// CHAN-ACTIV-NACK or MODE-MODIFY-NACK depending on the original type").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownChanNack {
    ChanActivNack(Cause),
    ModeModifyNack(Cause),
    RfChanRelNack(Cause),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdcch_rejects_speech_mode() {
        assert_eq!(
            validate_chan_activ(LchanKind::Sdcch, ChanMode::SpeechV1),
            ChanActivValidation::Unsupported
        );
    }

    #[test]
    fn tchf_accepts_speech_mode() {
        assert_eq!(
            validate_chan_activ(LchanKind::TchF, ChanMode::SpeechAmr),
            ChanActivValidation::Ok
        );
    }

    #[test]
    fn tchf_rejects_signalling_only_mode() {
        assert_eq!(
            validate_chan_activ(LchanKind::TchF, ChanMode::Signalling),
            ChanActivValidation::Unsupported
        );
    }

    #[test]
    fn cipher_tx_enabled_only_after_first_uplink_frame() {
        let mut lchan = Lchan::new(LchanKind::TchF);
        encr_cmd(&mut lchan, 1, vec![0xAA; 8]);
        assert!(lchan.ciphering.rx_enabled);
        assert!(!lchan.ciphering.tx_enabled);
        on_first_ciphered_uplink_frame(&mut lchan);
        assert!(lchan.ciphering.tx_enabled);
    }

    #[test]
    fn mode_modify_returns_multirate_only_for_amr() {
        let mut lchan = Lchan::new(LchanKind::TchF);
        let mr = mode_modify(&mut lchan, ChanMode::SpeechV1, Some(vec![1, 2, 3]));
        assert!(mr.is_none());
        let mr = mode_modify(&mut lchan, ChanMode::SpeechAmr, Some(vec![1, 2, 3]));
        assert_eq!(mr, Some(vec![1, 2, 3]));
    }

    #[test]
    fn ms_power_control_without_params_is_static() {
        let mut lchan = Lchan::new(LchanKind::TchF);
        ms_power_control(&mut lchan.ms_power, 10, None);
        assert_eq!(lchan.ms_power.current(), 10);
        assert!(!lchan.ms_power.is_autonomous());
    }

    #[test]
    fn bs_power_control_with_params_enables_autonomous_loop() {
        use crate::power_control::{MeasParams, PowerCtrlParams, PreprocAlgo};

        let mut lchan = Lchan::new(LchanKind::TchF);
        let params = PowerCtrlParams {
            rxlev_meas: MeasParams::new(-90, -50, 1, 1, 1, 1, PreprocAlgo::None),
            rxqual_meas: MeasParams::new(0, 4, 1, 1, 1, 1, PreprocAlgo::None),
            ci_thresholds: None,
            ctrl_interval: 1,
            inc_step_size_db: 2,
            red_step_size_db: 2,
        };
        bs_power_control(&mut lchan.bs_power, 6, Some(params));
        assert!(lchan.bs_power.is_autonomous());
        // set_params resets to 0 regardless of the static target requested.
        assert_eq!(lchan.bs_power.current_db(), 0);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A-bis OML engine (spec.md §2, §4.3; 3GPP TS 12.21 / 52.021).
//!
//! The OML stream carries Formatted O&M (FOM, discriminator `0x80`) and
//! manufacturer-specific (discriminator `0xA0`) messages over the same
//! IPA-multiplexed TCP connection as RSL. This module owns the
//! Managed-Object state machine ([`mo`]) and the message classification
//! that drives it; the TLV payload parsing for individual attribute sets
//! lives alongside each MO kind's Set-Attributes handler.

pub mod mo;

use crate::error::{Error, Result};
use crate::model::Trx;
use mo::AdminOpState;

/// IPA stream discriminator for Formatted O&M.
pub const OML_DISCRIMINATOR_FOM: u8 = 0x80;
/// IPA stream discriminator for manufacturer-specific O&M.
pub const OML_DISCRIMINATOR_MANUFACTURER: u8 = 0xA0;

/// Which node of the Managed-Object tree an OML message addresses
/// (spec.md §2 table: "Site-Mgr -> BTS -> TRX -> Channel, plus GPRS
/// NSE/Cell/NSVC").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoClass {
    SiteManager,
    Bts,
    Radio,
    Channel,
    GprsNse,
    GprsCell,
    GprsNsvc,
}

/// Fully qualified MO address: class plus the (bts, trx, ts) indices
/// that are meaningful for that class (unused indices are left at 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoAddr {
    pub class: MoClass,
    pub bts: u8,
    pub trx: u8,
    pub ts: u8,
}

impl MoAddr {
    #[must_use]
    pub fn new(class: MoClass, bts: u8, trx: u8, ts: u8) -> Self {
        Self { class, bts, trx, ts }
    }
}

/// The operations an OML message may request on a Managed Object
/// (spec.md §2 table: "Set-Attributes, Opstart, Get-Attributes").
#[derive(Debug, Clone)]
pub enum OmlRequest {
    SetAttributes { mo: MoAddr, attributes: Vec<u8> },
    Opstart { mo: MoAddr },
    GetAttributes { mo: MoAddr },
    ChangeAdminState { mo: MoAddr, locked: bool },
}

/// Result of processing one OML request: either an ACK carrying a reply
/// payload, or a NACK with a cause (spec.md §7: protocol errors become
/// ERROR-REPORT / NACK, never a panic).
#[derive(Debug, Clone)]
pub enum OmlReply {
    Ack { mo: MoAddr, payload: Vec<u8> },
    Nack { mo: MoAddr, cause: &'static str },
}

/// Classify a raw OML stream discriminator byte (spec.md §6, "A-bis
/// OML").
///
/// # Errors
/// Returns [`Error::Unsupported`] for any discriminator other than FOM
/// or manufacturer O&M.
pub fn classify_discriminator(byte: u8) -> Result<u8> {
    match byte {
        OML_DISCRIMINATOR_FOM | OML_DISCRIMINATOR_MANUFACTURER => Ok(byte),
        other => Err(Error::Unsupported(format!(
            "unknown OML stream discriminator 0x{other:02x}"
        ))),
    }
}

/// Map a core [`Error`] onto the OML NACK cause it is reported under
/// (spec.md §1.2: every core error converts 1:1 into an RSL cause code or
/// an OML NACK). Vocabulary follows 3GPP TS 12.21 Annex.
#[must_use]
pub fn nack_cause(error: &Error) -> &'static str {
    match error {
        Error::MandIeMissing(_) => "MAND_IE_ERROR",
        Error::IeContent(_) => "IE_CONTENT",
        Error::Unsupported(_) => "SERV_OPT_UNIMPL",
        Error::UnknownObject(_) => "OBJINST_UNKN",
        Error::ProtocolDecode(_) => "PROTO_ERR",
        Error::Congested => "RESOURCE_NOTAVAIL",
        Error::Overrun
        | Error::NoChannel
        | Error::PhyTimeout
        | Error::PhyFailure(_)
        | Error::Io(_)
        | Error::AbisLinkDown
        | Error::PcuLinkLost(_)
        | Error::JitterUnderrun => "EQUIPMENT_FAIL",
    }
}

/// Dispatch an already-parsed OML request against the addressed MO's
/// admin/oper/avail state (spec.md §2 table: "Set-Attributes, Opstart,
/// Get-Attributes, Change-Administrative-State"). TLV decode of the
/// request and its attribute payload happens upstream of this call.
pub fn dispatch(request: &OmlRequest, mo_state: &mut AdminOpState) -> OmlReply {
    match request {
        OmlRequest::SetAttributes { mo, attributes } => {
            crate::info!("Set-Attributes on {mo:?} ({} bytes)", attributes.len());
            OmlReply::Ack { mo: *mo, payload: Vec::new() }
        }
        OmlRequest::Opstart { mo } => match mo_state.opstart() {
            Ok(()) => OmlReply::Ack { mo: *mo, payload: Vec::new() },
            Err(cause) => OmlReply::Nack { mo: *mo, cause },
        },
        OmlRequest::GetAttributes { mo } => {
            OmlReply::Ack { mo: *mo, payload: Vec::new() }
        }
        OmlRequest::ChangeAdminState { mo, locked } => {
            if *locked {
                mo_state.lock();
            } else {
                mo_state.unlock();
            }
            OmlReply::Ack { mo: *mo, payload: Vec::new() }
        }
    }
}

/// OML Set-Radio-Attributes' ARFCN change, the one place a core `Error`
/// (spec.md §8 "ARFCN bounds") is required to surface as a specific NACK
/// cause rather than the generic [`nack_cause`] mapping: an out-of-range
/// ARFCN is reported `FREQ_NOTAVAIL`, not a generic IE-content error.
pub fn set_radio_attributes(mo: MoAddr, trx: &mut Trx, arfcn: u16) -> OmlReply {
    match trx.set_arfcn(arfcn) {
        Ok(()) => {
            crate::info!("TRX {} ARFCN set to {arfcn}", trx.index);
            OmlReply::Ack { mo, payload: Vec::new() }
        }
        Err(_) => {
            crate::warn!("TRX {} ARFCN {arfcn} rejected: FREQ_NOTAVAIL", trx.index);
            OmlReply::Nack { mo, cause: "FREQ_NOTAVAIL" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_classification() {
        assert!(classify_discriminator(OML_DISCRIMINATOR_FOM).is_ok());
        assert!(classify_discriminator(OML_DISCRIMINATOR_MANUFACTURER).is_ok());
        assert!(classify_discriminator(0x42).is_err());
    }

    #[test]
    fn mo_addr_equality_by_indices() {
        let a = MoAddr::new(MoClass::Channel, 0, 1, 2);
        let b = MoAddr::new(MoClass::Channel, 0, 1, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn dispatch_opstart_enables_mo() {
        let mo = MoAddr::new(MoClass::Radio, 0, 0, 0);
        let mut state = AdminOpState::initial();
        let reply = dispatch(&OmlRequest::Opstart { mo }, &mut state);
        assert!(matches!(reply, OmlReply::Ack { .. }));
        assert!(state.is_enabled());
    }

    #[test]
    fn dispatch_opstart_on_locked_mo_nacks() {
        let mo = MoAddr::new(MoClass::Radio, 0, 0, 0);
        let mut state = AdminOpState::initial();
        state.lock();
        let reply = dispatch(&OmlRequest::Opstart { mo }, &mut state);
        assert!(matches!(reply, OmlReply::Nack { .. }));
    }

    #[test]
    fn dispatch_change_admin_state_locks_and_unlocks() {
        let mo = MoAddr::new(MoClass::Radio, 0, 0, 0);
        let mut state = AdminOpState::initial();
        dispatch(&OmlRequest::ChangeAdminState { mo, locked: true }, &mut state);
        assert_eq!(state.admin, mo::AdminState::Locked);
        dispatch(&OmlRequest::ChangeAdminState { mo, locked: false }, &mut state);
        assert_eq!(state.admin, mo::AdminState::Unlocked);
    }

    #[test]
    fn out_of_range_arfcn_nacks_freq_notavail() {
        let mo = MoAddr::new(MoClass::Radio, 0, 0, 0);
        let mut trx = Trx::new(0, 50).unwrap();
        let reply = set_radio_attributes(mo, &mut trx, 2000);
        match reply {
            OmlReply::Nack { cause, .. } => assert_eq!(cause, "FREQ_NOTAVAIL"),
            OmlReply::Ack { .. } => panic!("expected NACK"),
        }
        assert_eq!(trx.arfcn, 50);
    }

    #[test]
    fn in_range_arfcn_acks() {
        let mo = MoAddr::new(MoClass::Radio, 0, 0, 0);
        let mut trx = Trx::new(0, 50).unwrap();
        let reply = set_radio_attributes(mo, &mut trx, 100);
        assert!(matches!(reply, OmlReply::Ack { .. }));
        assert_eq!(trx.arfcn, 100);
    }

    #[test]
    fn nack_cause_mapping_is_specific_for_known_errors() {
        assert_eq!(nack_cause(&Error::MandIeMissing("foo")), "MAND_IE_ERROR");
        assert_eq!(nack_cause(&Error::IeContent("bad".into())), "IE_CONTENT");
        assert_eq!(nack_cause(&Error::Congested), "RESOURCE_NOTAVAIL");
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! L1-SAP dispatcher (spec.md §4.1).
//!
//! A thin, synchronous, in-process primitive interface between the PHY
//! (hardware or software radio) and the protocol stack. Every primitive is
//! a variant of [`L1Prim`]; the dispatcher validates `chan_nr` against the
//! currently active logical channels and, for downlink primitives, taps
//! each message to an optional [`DebugObserver`] (GSMTAP), excluding fill
//! frames from the tap.
//!
//! Grounded on the teacher's typed-primitive dispatch style used for RTPS
//! submessage demultiplexing (`core/discovery` parsers take a raw byte
//! slice and return a typed enum rather than mutating shared state).

use crate::error::{Error, Result};
use crate::model::{ChanNr, LchanTable};

pub mod gsmtap;
pub use gsmtap::DebugObserver;

/// Channel-Needed indicator carried on some uplink primitives (3GPP 04.08).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkId {
    /// Main signalling link (SAPI 0).
    Main,
    /// SACCH (SAPI 0 on the associated control channel).
    Sacch,
}

/// `MPH-INFO` unsolicited indication types (PHY -> stack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MphInfoInd {
    /// Frame-number tick; the only thing allowed to advance the frame clock.
    Time { fn_: u32 },
    /// Per-burst uplink measurement sample.
    Meas {
        chan_nr: ChanNr,
        fn_: u32,
        rssi: i8,
        ber10k: u16,
        toa256: i16,
    },
    /// Handover detection criterion met.
    HandoverCriteria { chan_nr: ChanNr },
}

/// `MPH-INFO.req` types (stack -> PHY).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MphInfoReq {
    Activate { chan_nr: ChanNr },
    Deactivate { chan_nr: ChanNr },
    Modify { chan_nr: ChanNr },
    ActivateCiphering { chan_nr: ChanNr, downlink: bool },
}

/// `MPH-INFO.cnf` types (PHY -> stack).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MphInfoCnfType {
    Activate,
    Deactivate,
}

/// Cause reported alongside an `MPH-INFO.cnf`; `None` means success.
pub type MphCause = Option<&'static str>;

/// The tagged union of all L1-SAP primitives (spec.md §4.1).
#[derive(Debug, Clone)]
pub enum L1Prim {
    /// PHY requests downlink data for a burst at `fn_`.
    PhRtsInd {
        chan_nr: ChanNr,
        link_id: LinkId,
        fn_: u32,
    },
    /// Stack replies with a MAC block for the PHY to transmit.
    PhDataReq {
        chan_nr: ChanNr,
        link_id: LinkId,
        fn_: u32,
        payload: Vec<u8>,
    },
    /// PHY delivered an uplink MAC block.
    PhDataInd {
        chan_nr: ChanNr,
        link_id: LinkId,
        fn_: u32,
        rssi: i8,
        ber10k: u16,
        lqual_cb: i16,
        ta256: i16,
        is_sub: bool,
        payload: Vec<u8>,
    },
    /// Access Burst arrived on the RACH.
    PhRachInd {
        chan_nr: ChanNr,
        fn_: u32,
        ra: u8,
        acc_delay: u8,
        acc_delay256: i16,
        rssi: i8,
        ber10k: u16,
        lqual_cb: i16,
        is_11bit: bool,
        burst_type: u8,
    },
    /// Traffic frame, PHY -> stack.
    TchInd {
        chan_nr: ChanNr,
        fn_: u32,
        marker: bool,
        payload: Vec<u8>,
    },
    /// Traffic frame, stack -> PHY.
    TchReq {
        chan_nr: ChanNr,
        fn_: u32,
        marker: bool,
        payload: Vec<u8>,
    },
    /// PHY requests the next traffic frame for transmission.
    TchRtsInd { chan_nr: ChanNr, fn_: u32 },
    /// Unsolicited PHY-layer event.
    MphInfoInd(MphInfoInd),
    /// Stack -> PHY control request.
    MphInfoReq(MphInfoReq),
    /// PHY acknowledges a control request.
    MphInfoCnf {
        kind: MphInfoCnfType,
        chan_nr: ChanNr,
        cause: MphCause,
    },
}

/// In-process dispatcher between the PHY and the rest of the stack.
///
/// Validates `chan_nr` against the currently active logical channels and
/// taps outbound (downlink) primitives to an optional debug observer.
pub struct L1SapDispatcher<'a> {
    lchans: &'a LchanTable,
    tap: Option<Box<dyn DebugObserver>>,
}

impl<'a> L1SapDispatcher<'a> {
    #[must_use]
    pub fn new(lchans: &'a LchanTable) -> Self {
        Self { lchans, tap: None }
    }

    /// Attach a GSMTAP-style debug observer for downlink taps.
    pub fn set_tap(&mut self, tap: Box<dyn DebugObserver>) {
        self.tap = Some(tap);
    }

    /// Validate that `chan_nr` names a currently configured logical channel.
    fn validate_chan(&self, chan_nr: ChanNr) -> Result<()> {
        if self.lchans.find(chan_nr).is_some() {
            Ok(())
        } else {
            Err(Error::NoChannel)
        }
    }

    /// Process an inbound (PHY -> stack) primitive, validating `chan_nr`
    /// where the primitive carries one.
    pub fn accept(&self, prim: &L1Prim) -> Result<()> {
        match prim {
            L1Prim::PhRtsInd { chan_nr, .. }
            | L1Prim::PhDataInd { chan_nr, .. }
            | L1Prim::TchInd { chan_nr, .. }
            | L1Prim::TchRtsInd { chan_nr, .. } => self.validate_chan(*chan_nr),
            // RACH indications and MPH-INFO.ind(TIME) are not tied to an
            // existing lchan (RACH precedes channel activation by
            // definition; TIME is BTS-global).
            L1Prim::PhRachInd { .. } | L1Prim::MphInfoInd(MphInfoInd::Time { .. }) => Ok(()),
            L1Prim::MphInfoInd(MphInfoInd::Meas { chan_nr, .. })
            | L1Prim::MphInfoInd(MphInfoInd::HandoverCriteria { chan_nr }) => {
                self.validate_chan(*chan_nr)
            }
            L1Prim::MphInfoCnf { chan_nr, .. } => self.validate_chan(*chan_nr),
            _ => Ok(()),
        }
    }

    /// Send a downlink primitive to the PHY, tapping it unless it is a
    /// fill frame (spec.md §4.1: "fill frames must be excluded from the
    /// tap").
    pub fn emit_downlink(&self, prim: &L1Prim, is_fill: bool) {
        if is_fill {
            return;
        }
        if let Some(tap) = &self.tap {
            if let L1Prim::PhDataReq {
                chan_nr, payload, ..
            }
            | L1Prim::TchReq {
                chan_nr, payload, ..
            } = prim
            {
                tap.observe(*chan_nr, payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BtsId, ChanNr, LchanTable};

    #[test]
    fn rejects_unknown_chan_nr() {
        let table = LchanTable::new(BtsId(0));
        let dispatcher = L1SapDispatcher::new(&table);
        let prim = L1Prim::TchRtsInd {
            chan_nr: ChanNr::new(0, 0, 0),
            fn_: 10,
        };
        assert!(matches!(dispatcher.accept(&prim), Err(Error::NoChannel)));
    }

    #[test]
    fn rach_ind_bypasses_chan_validation() {
        let table = LchanTable::new(BtsId(0));
        let dispatcher = L1SapDispatcher::new(&table);
        let prim = L1Prim::PhRachInd {
            chan_nr: ChanNr::new(0, 0, 0),
            fn_: 42,
            ra: 0x03,
            acc_delay: 0,
            acc_delay256: 0,
            rssi: -80,
            ber10k: 0,
            lqual_cb: 0,
            is_11bit: false,
            burst_type: 0,
        };
        assert!(dispatcher.accept(&prim).is_ok());
    }
}

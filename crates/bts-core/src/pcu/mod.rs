// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PCU interface (spec.md §4.7): a framed datagram side channel to an
//! external Packet Control Unit that owns PDCH timeslots.

pub mod protocol;
pub mod socket;

pub use protocol::{Header, MsgType, VersionHandshake};
pub use socket::{PcuLinkState, PcuWriteQueue};

use crate::error::Result;

/// Prerequisites that must be known before `INFO-IND` can be sent
/// (spec.md §4.7: "BTS sends INFO-IND once all prerequisites (LAI from
/// SI3, NSE/Cell attributes, at least one NSVC) are known").
#[derive(Debug, Clone, Copy, Default)]
pub struct InfoIndPrerequisites {
    pub lai_known: bool,
    pub nse_cell_known: bool,
    pub has_nsvc: bool,
}

impl InfoIndPrerequisites {
    #[must_use]
    pub fn all_known(self) -> bool {
        self.lai_known && self.nse_cell_known && self.has_nsvc
    }
}

/// Drives the connect handshake: `INFO-IND` -> `TXT-IND(PCU_VERSION)` ->
/// version check -> `Connected`, or link loss on mismatch (spec.md
/// §4.7).
#[derive(Debug)]
pub struct PcuLink {
    pub state: PcuLinkState,
    pub write_queue: PcuWriteQueue,
}

impl PcuLink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PcuLinkState::Disconnected,
            write_queue: PcuWriteQueue::new(),
        }
    }

    /// Attempt to send `INFO-IND`, gated on prerequisites being known.
    #[must_use]
    pub fn try_send_info_ind(&mut self, prereqs: InfoIndPrerequisites) -> bool {
        if self.state != PcuLinkState::Disconnected || !prereqs.all_known() {
            return false;
        }
        self.state = PcuLinkState::AwaitingInfoIndAck;
        true
    }

    /// Handle the peer's `TXT-IND(PCU_VERSION)` reply.
    ///
    /// # Errors
    /// Returns an error (and transitions back to `Disconnected`) if the
    /// version does not match.
    pub fn on_txt_ind(&mut self, handshake: VersionHandshake) -> Result<()> {
        match handshake.verify() {
            Ok(()) => {
                self.state = PcuLinkState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = PcuLinkState::Disconnected;
                Err(e)
            }
        }
    }

    /// Disconnect the link: every PDCH timeslot must be deactivated by
    /// the caller in response (spec.md §4.7); this only resets link
    /// bookkeeping.
    pub fn on_disconnect(&mut self) {
        self.state = PcuLinkState::Disconnected;
        self.write_queue = PcuWriteQueue::new();
    }
}

impl Default for PcuLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PCU_IF_VERSION;

    #[test]
    fn info_ind_gated_on_prerequisites() {
        let mut link = PcuLink::new();
        let partial = InfoIndPrerequisites {
            lai_known: true,
            nse_cell_known: false,
            has_nsvc: false,
        };
        assert!(!link.try_send_info_ind(partial));
        assert_eq!(link.state, PcuLinkState::Disconnected);
    }

    #[test]
    fn full_handshake_reaches_connected() {
        let mut link = PcuLink::new();
        let prereqs = InfoIndPrerequisites {
            lai_known: true,
            nse_cell_known: true,
            has_nsvc: true,
        };
        assert!(link.try_send_info_ind(prereqs));
        assert_eq!(link.state, PcuLinkState::AwaitingInfoIndAck);
        link.on_txt_ind(VersionHandshake { version: PCU_IF_VERSION }).unwrap();
        assert_eq!(link.state, PcuLinkState::Connected);
    }

    #[test]
    fn version_mismatch_drops_back_to_disconnected() {
        let mut link = PcuLink::new();
        let prereqs = InfoIndPrerequisites {
            lai_known: true,
            nse_cell_known: true,
            has_nsvc: true,
        };
        link.try_send_info_ind(prereqs);
        let result = link.on_txt_ind(VersionHandshake {
            version: PCU_IF_VERSION + 1,
        });
        assert!(result.is_err());
        assert_eq!(link.state, PcuLinkState::Disconnected);
    }
}

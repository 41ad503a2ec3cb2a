// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GSMTAP debug tap (spec.md SPEC_FULL.md §2.2, supplemented feature).
//!
//! Downlink MAC blocks can optionally be mirrored to a UDP sink in
//! GSMTAP framing so an external capture tool can observe over-the-air
//! traffic without instrumenting the PHY. Disabled by default; attaching
//! a tap is the caller's choice (spec.md §4.1, "taps each message to an
//! optional debug observer").

use crate::model::ChanNr;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};

/// GSMTAP UDP port (assigned by IANA for Wireshark's gsmtap dissector).
pub const GSMTAP_UDP_PORT: u16 = 4729;

const GSMTAP_VERSION: u8 = 2;
const GSMTAP_TYPE_UM: u8 = 0x01;

/// Receives a copy of every non-fill downlink MAC block emitted by the
/// [`super::L1SapDispatcher`].
pub trait DebugObserver: Send {
    fn observe(&self, chan_nr: ChanNr, payload: &[u8]);
}

/// No-op observer; the default when no tap is attached.
#[derive(Debug, Default)]
pub struct NullObserver;

impl DebugObserver for NullObserver {
    fn observe(&self, _chan_nr: ChanNr, _payload: &[u8]) {}
}

/// Wraps each tapped block in a minimal GSMTAP v2 header and forwards it
/// over UDP to a capture endpoint (spec.md, ambient debug tooling).
pub struct GsmtapUdpSink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl GsmtapUdpSink {
    /// Bind an ephemeral UDP socket and target `dest` (conventionally
    /// `127.0.0.1:4729` for a local Wireshark capture).
    pub fn new(dest: SocketAddr) -> io::Result<Self> {
        let domain = if dest.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket2 = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_nonblocking(true)?;
        let bind_addr: SocketAddr = if dest.is_ipv6() {
            "[::]:0".parse().unwrap()
        } else {
            "0.0.0.0:0".parse().unwrap()
        };
        socket2.bind(&bind_addr.into())?;
        Ok(Self {
            socket: socket2.into(),
            dest,
        })
    }

    fn header(chan_nr: ChanNr, payload_len: usize) -> [u8; 16] {
        let mut hdr = [0u8; 16];
        hdr[0] = GSMTAP_VERSION;
        hdr[1] = 4; // header length in 32-bit words
        hdr[2] = GSMTAP_TYPE_UM;
        hdr[3] = 0; // timeslot
        hdr[4] = chan_nr.trx;
        hdr[5] = chan_nr.ts;
        hdr[12] = chan_nr.subslot;
        hdr[13] = payload_len.min(u8::from(u8::MAX).into()) as u8;
        hdr
    }
}

impl DebugObserver for GsmtapUdpSink {
    fn observe(&self, chan_nr: ChanNr, payload: &[u8]) {
        let hdr = Self::header(chan_nr, payload.len());
        let mut frame = Vec::with_capacity(hdr.len() + payload.len());
        frame.extend_from_slice(&hdr);
        frame.extend_from_slice(payload);
        // Best-effort: a capture tool not being attached is not an error
        // the scheduler should ever see.
        let _ = self.socket.send_to(&frame, self.dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_encodes_chan_addressing() {
        let hdr = GsmtapUdpSink::header(ChanNr::new(1, 2, 3), 23);
        assert_eq!(hdr[0], GSMTAP_VERSION);
        assert_eq!(hdr[4], 1);
        assert_eq!(hdr[5], 2);
        assert_eq!(hdr[12], 3);
        assert_eq!(hdr[13], 23);
    }

    #[test]
    fn null_observer_does_nothing() {
        NullObserver.observe(ChanNr::new(0, 0, 0), &[1, 2, 3]);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTP endpoint ("twrtp", spec.md §4.8): the TX cadence state machine and
//! wire header codec sitting on top of [`super::twjit::TwJit`].

use crate::error::{Error, Result};

const RTP_VERSION: u8 = 2;
pub const RTP_HEADER_LEN: usize = 12;

/// Fixed 12-byte RTP header, RFC 3550 §5.1. Extension headers and CSRC
/// lists are not produced or expected (spec.md §4.8 does not call for
/// them); `decode` rejects packets that carry either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    #[must_use]
    pub fn encode(self) -> [u8; RTP_HEADER_LEN] {
        let mut out = [0u8; RTP_HEADER_LEN];
        out[0] = RTP_VERSION << 6;
        out[1] = (u8::from(self.marker) << 7) | (self.payload_type & 0x7F);
        out[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        out[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        out
    }

    /// # Errors
    /// Returns [`Error::ProtocolDecode`] if the buffer is too short, the
    /// RTP version field isn't 2, or the packet carries an extension
    /// header or CSRC list.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < RTP_HEADER_LEN {
            return Err(Error::ProtocolDecode("RTP header truncated".into()));
        }
        let b0 = bytes[0];
        if b0 >> 6 != RTP_VERSION {
            return Err(Error::ProtocolDecode("unsupported RTP version".into()));
        }
        if b0 & 0x3F != 0 {
            return Err(Error::ProtocolDecode(
                "RTP extension/CSRC not supported".into(),
            ));
        }
        let b1 = bytes[1];
        let header = RtpHeader {
            marker: b1 & 0x80 != 0,
            payload_type: b1 & 0x7F,
            sequence: u16::from_be_bytes([bytes[2], bytes[3]]),
            timestamp: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ssrc: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        };
        Ok((header, &bytes[RTP_HEADER_LEN..]))
    }
}

/// Lifetime Tx/Rx counters (spec.md §4.8).
#[derive(Debug, Clone, Copy, Default)]
pub struct TwRtpStats {
    pub tx_rtp_pkt: u64,
    pub tx_rtp_bytes: u64,
    pub tx_rtcp_pkt: u64,
    pub rx_rtcp_invalid: u64,
}

#[derive(Debug)]
struct TxCadence {
    ssrc: u32,
    ts: u32,
    ts_addend: u32,
    seq: u16,
    started: bool,
    restart: bool,
}

/// Drives the cadence of locally generated RTP output (spec.md §4.8,
/// "TX path"); `original_source/src/common/twrtp.c` `obts_twrtp_tx_*`.
#[derive(Debug)]
pub struct TwRtp {
    ts_quantum: u32,
    ts_units_per_sec: u64,
    tx: TxCadence,
    stats: TwRtpStats,
}

impl TwRtp {
    /// Create a new endpoint. SSRC, starting timestamp addend and
    /// starting sequence number are randomized per RFC 3550's SHOULD
    /// directive unless `deterministic_seed` is given (useful for
    /// reproducible test/debug runs).
    #[must_use]
    pub fn new(clock_rate_hz: u32, quantum_ms: u32, deterministic_seed: Option<(u32, u32, u16)>) -> Self {
        let (ssrc, ts_addend, seq) = deterministic_seed.unwrap_or_else(|| {
            (fastrand::u32(..), fastrand::u32(..), fastrand::u16(..))
        });
        Self {
            ts_quantum: quantum_ms * (clock_rate_hz / 1000),
            ts_units_per_sec: u64::from(clock_rate_hz),
            tx: TxCadence {
                ssrc,
                ts: 0,
                ts_addend,
                seq,
                started: false,
                restart: false,
            },
            stats: TwRtpStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> TwRtpStats {
        self.stats
    }

    #[must_use]
    pub fn ssrc(&self) -> u32 {
        self.tx.ssrc
    }

    fn gen_timestamp(&self, now_ns: u64) -> u32 {
        let ts = ((u128::from(now_ns) * u128::from(self.ts_units_per_sec)) / 1_000_000_000u128)
            as u32;
        ts.wrapping_add(self.tx.ts_addend)
    }

    /// Emit one RTP packet carrying a locally sourced quantum of
    /// speech/data (spec.md §4.8, "TX path"). Returns the encoded
    /// packet; the caller sends it on the RTP socket.
    pub fn tx_quantum(
        &mut self,
        now_ns: u64,
        payload: &[u8],
        payload_type: u8,
        mut marker: bool,
        auto_marker: bool,
    ) -> Vec<u8> {
        if !self.tx.started {
            self.tx.ts = self.gen_timestamp(now_ns);
            self.tx.started = true;
            self.tx.restart = false;
            if auto_marker {
                marker = true;
            }
        } else if self.tx.restart {
            let mut restart_ts = self.gen_timestamp(now_ns);
            let ts_delta = restart_ts.wrapping_sub(self.tx.ts) as i32;
            if ts_delta <= 0 {
                self.tx.ts = self.tx.ts.wrapping_add(1);
            } else {
                if ts_delta as u32 % self.ts_quantum == 0 {
                    restart_ts = restart_ts.wrapping_add(1);
                }
                self.tx.ts = restart_ts;
            }
            self.tx.restart = false;
            if auto_marker {
                marker = true;
            }
        }

        let header = RtpHeader {
            marker,
            payload_type,
            sequence: self.tx.seq,
            timestamp: self.tx.ts,
            ssrc: self.tx.ssrc,
        };
        self.tx.seq = self.tx.seq.wrapping_add(1);
        self.tx.ts = self.tx.ts.wrapping_add(self.ts_quantum);

        let mut out = Vec::with_capacity(RTP_HEADER_LEN + payload.len());
        out.extend_from_slice(&header.encode());
        out.extend_from_slice(payload);
        self.stats.tx_rtp_pkt += 1;
        self.stats.tx_rtp_bytes += payload.len() as u64;
        out
    }

    /// Last emitted timestamp, for RTCP SR's `rtp_ts` field.
    #[must_use]
    pub fn last_tx_timestamp(&self) -> u32 {
        self.tx.ts.wrapping_sub(self.ts_quantum)
    }

    /// Advance the output timestamp by one quantum without emitting a
    /// packet, for intentional silence-period gaps (spec.md §4.8).
    pub fn tx_skip(&mut self) {
        if !self.tx.started || self.tx.restart {
            return;
        }
        self.tx.ts = self.tx.ts.wrapping_add(self.ts_quantum);
    }

    /// Request a discontinuous timestamp reset on the next
    /// [`Self::tx_quantum`] call (spec.md §4.8).
    pub fn tx_restart(&mut self) {
        self.tx.restart = true;
    }

    /// Bypass timing entirely, forwarding an already-framed RTP packet
    /// verbatim (spec.md §4.8, "transparent packet forwarding").
    pub fn tx_forward(&mut self, packet: &[u8]) -> Vec<u8> {
        self.stats.tx_rtp_pkt += 1;
        self.stats.tx_rtp_bytes += packet.len().saturating_sub(RTP_HEADER_LEN) as u64;
        packet.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let hdr = RtpHeader {
            marker: true,
            payload_type: 3,
            sequence: 4242,
            timestamp: 0xDEAD_BEEF,
            ssrc: 0x1234_5678,
        };
        let bytes = hdr.encode();
        let (decoded, rest) = RtpHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, hdr);
        assert!(rest.is_empty());
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let mut bytes = [0u8; RTP_HEADER_LEN];
        bytes[0] = 0x00; // version 0
        assert!(RtpHeader::decode(&bytes).is_err());
    }

    #[test]
    fn first_quantum_sets_auto_marker() {
        let mut rtp = TwRtp::new(8000, 20, Some((1, 0, 0)));
        let packet = rtp.tx_quantum(0, &[0xAA; 33], 3, false, true);
        let (hdr, payload) = RtpHeader::decode(&packet).unwrap();
        assert!(hdr.marker);
        assert_eq!(payload.len(), 33);
        assert_eq!(hdr.sequence, 0);
    }

    #[test]
    fn sequence_and_timestamp_advance_each_quantum() {
        let mut rtp = TwRtp::new(8000, 20, Some((1, 0, 0)));
        let p1 = rtp.tx_quantum(0, &[0u8; 4], 3, false, false);
        let p2 = rtp.tx_quantum(20_000_000, &[0u8; 4], 3, false, false);
        let (h1, _) = RtpHeader::decode(&p1).unwrap();
        let (h2, _) = RtpHeader::decode(&p2).unwrap();
        assert_eq!(h2.sequence, h1.sequence.wrapping_add(1));
        assert_eq!(h2.timestamp, h1.timestamp.wrapping_add(160));
    }

    #[test]
    fn tx_skip_advances_timestamp_without_emitting() {
        let mut rtp = TwRtp::new(8000, 20, Some((1, 0, 0)));
        let p1 = rtp.tx_quantum(0, &[0u8; 4], 3, false, false);
        rtp.tx_skip();
        let p2 = rtp.tx_quantum(40_000_000, &[0u8; 4], 3, false, false);
        let (h1, _) = RtpHeader::decode(&p1).unwrap();
        let (h2, _) = RtpHeader::decode(&p2).unwrap();
        assert_eq!(h2.timestamp, h1.timestamp.wrapping_add(320));
    }

    #[test]
    fn restart_breaks_cadence_discontinuously() {
        let mut rtp = TwRtp::new(8000, 20, Some((1, 0, 0)));
        let _ = rtp.tx_quantum(0, &[0u8; 4], 3, false, false);
        rtp.tx_restart();
        let p2 = rtp.tx_quantum(5_000_000_000, &[0u8; 4], 3, false, true);
        let (h2, _) = RtpHeader::decode(&p2).unwrap();
        // 5 s at 8 kHz is a ts jump far larger than one quantum (160).
        assert!(h2.timestamp > 8000 * 4);
        assert!(h2.marker);
    }
}

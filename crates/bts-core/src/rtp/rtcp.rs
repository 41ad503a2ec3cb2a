// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTCP SR/RR/SDES construction (spec.md §4.8; RFC 3550 §6).
//!
//! A combined SR+RR+SDES compound packet is built as: `[SR header + SR
//! block]` or `[RR header]`, an optional report block when anything has
//! been received, and a mandatory SDES chunk carrying CNAME.

use super::twjit::RrInfo;

const RTCP_VERSION: u8 = 2;
const RTCP_PT_SR: u8 = 200;
const RTCP_PT_RR: u8 = 201;
const RTCP_PT_SDES: u8 = 202;
const SDES_CNAME: u8 = 1;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
const NTP_UNIX_EPOCH_DIFF: u64 = 2_208_988_800;

/// Sender-side counters carried in an SR block.
#[derive(Debug, Clone, Copy)]
pub struct SenderInfo {
    pub rtp_ts: u32,
    pub pkt_count: u32,
    pub octet_count: u32,
}

/// State needed to fill `LSR`/`DLSR` in an RR block, captured from the
/// most recently received SR from the same SSRC we are reporting on.
#[derive(Debug, Clone, Copy)]
pub struct LastSrReceipt {
    pub ssrc: u32,
    /// Middle 32 bits of the received SR's NTP timestamp.
    pub ntp_mid: u32,
    /// Monotonic nanoseconds at which that SR was received.
    pub received_at_ns: u64,
}

/// Tracks `last_expected`/`last_received` across reports so the
/// "fraction lost" field reflects the delta since the previous RR
/// (`fill_rr_block()` in the original source), not a lifetime ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct RrEmitState {
    last_expected: u32,
    last_received: u64,
}

impl RrEmitState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one RTCP reception report block from the jitter buffer's
    /// analytics and (if available) the peer's most recent SR.
    #[must_use]
    pub fn build_block(
        &mut self,
        rri: &RrInfo,
        last_sr: Option<LastSrReceipt>,
        now_ns: u64,
    ) -> RrBlock {
        let cumulative_lost =
            (i64::from(rri.expected_pkt) - rri.rx_packets as i64).clamp(-0x80_0000, 0x7F_FFFF);
        let delta_expect = rri.expected_pkt.wrapping_sub(self.last_expected);
        self.last_expected = rri.expected_pkt;
        let delta_rcvd = (rri.rx_packets.wrapping_sub(self.last_received)) as u32;
        self.last_received = rri.rx_packets;
        let newly_lost = i64::from(delta_expect) - i64::from(delta_rcvd);
        let lost_fraction = if delta_expect == 0 || newly_lost <= 0 {
            0
        } else {
            ((newly_lost << 8) / i64::from(delta_expect)) as u32
        };
        let lost_word = (lost_fraction << 24) | (cumulative_lost as u32 & 0x00FF_FFFF);

        let (lsr, dlsr) = match last_sr.filter(|sr| sr.ssrc == rri.ssrc) {
            Some(sr) => {
                let delta_ns = now_ns.saturating_sub(sr.received_at_ns);
                // DLSR is in units of 1/65536 second.
                let dlsr = ((u128::from(delta_ns) * 65536) / 1_000_000_000) as u32;
                (sr.ntp_mid, dlsr)
            }
            None => (0, 0),
        };

        RrBlock {
            ssrc: rri.ssrc,
            lost_word,
            max_seq_ext: rri.max_seq_ext,
            jitter: (rri.jitter_accum >> 4) as u32,
            lsr,
            dlsr,
        }
    }
}

/// One RTCP reception report block (RFC 3550 §6.4.1).
#[derive(Debug, Clone, Copy)]
pub struct RrBlock {
    pub ssrc: u32,
    /// Fraction lost (high byte) | cumulative lost (low 24 bits).
    pub lost_word: u32,
    pub max_seq_ext: u32,
    pub jitter: u32,
    pub lsr: u32,
    pub dlsr: u32,
}

impl RrBlock {
    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ssrc.to_be_bytes());
        out.extend_from_slice(&self.lost_word.to_be_bytes());
        out.extend_from_slice(&self.max_seq_ext.to_be_bytes());
        out.extend_from_slice(&self.jitter.to_be_bytes());
        out.extend_from_slice(&self.lsr.to_be_bytes());
        out.extend_from_slice(&self.dlsr.to_be_bytes());
    }
}

/// Split a Unix `(secs, nanos)` timestamp into the 64-bit NTP timestamp
/// used by RTCP SR, returning `(ntp_sec, ntp_fract)`.
#[must_use]
pub fn unix_to_ntp(unix_secs: u64, unix_nanos: u32) -> (u32, u32) {
    let ntp_sec = (unix_secs + NTP_UNIX_EPOCH_DIFF) as u32;
    let ntp_fract = ((u64::from(unix_nanos) << 32) / 1_000_000_000) as u32;
    (ntp_sec, ntp_fract)
}

/// Build an SDES chunk carrying exactly one CNAME item, per RFC 3550
/// §6.5. The chunk is padded with null terminators to a 32-bit boundary.
#[must_use]
pub fn build_sdes_cname(ssrc: u32, cname: &str) -> Vec<u8> {
    let cname_bytes = cname.as_bytes();
    let mut chunk = Vec::with_capacity(4 + 2 + cname_bytes.len());
    chunk.extend_from_slice(&ssrc.to_be_bytes());
    chunk.push(SDES_CNAME);
    chunk.push(cname_bytes.len() as u8);
    chunk.extend_from_slice(cname_bytes);
    chunk.push(0); // END marker
    while chunk.len() % 4 != 0 {
        chunk.push(0);
    }

    let word_count = (chunk.len() / 4) as u16;
    let mut out = Vec::with_capacity(4 + chunk.len());
    out.push((RTCP_VERSION << 6) | 1); // V=2, P=0, SC=1
    out.push(RTCP_PT_SDES);
    out.extend_from_slice(&word_count.to_be_bytes());
    out.extend_from_slice(&chunk);
    out
}

/// Build a compound `SR`/`RR` + mandatory `SDES` packet (spec.md §4.8).
///
/// `rr` is `None` when nothing has yet been received from the peer; an
/// `RR`-only packet (`sender.is_none()`) is emitted when the caller has
/// not been asked to send an `SR` this round (e.g. no local Tx activity).
#[must_use]
pub fn build_compound(
    own_ssrc: u32,
    sender: Option<SenderInfo>,
    ntp_now: (u32, u32),
    rr: Option<RrBlock>,
    sdes: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    let has_rr = rr.is_some();
    let rc: u8 = u8::from(has_rr);
    out.push((RTCP_VERSION << 6) | rc);
    if let Some(sender) = sender {
        out.push(RTCP_PT_SR);
        let len_words: u16 = if has_rr { 12 } else { 6 };
        out.extend_from_slice(&len_words.to_be_bytes());
        out.extend_from_slice(&own_ssrc.to_be_bytes());
        out.extend_from_slice(&ntp_now.0.to_be_bytes());
        out.extend_from_slice(&ntp_now.1.to_be_bytes());
        out.extend_from_slice(&sender.rtp_ts.to_be_bytes());
        out.extend_from_slice(&sender.pkt_count.to_be_bytes());
        out.extend_from_slice(&sender.octet_count.to_be_bytes());
    } else {
        out.push(RTCP_PT_RR);
        let len_words: u16 = 7;
        out.extend_from_slice(&len_words.to_be_bytes());
        out.extend_from_slice(&own_ssrc.to_be_bytes());
    }
    if let Some(rr) = rr {
        rr.encode(&mut out);
    }
    out.extend_from_slice(sdes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdes_cname_is_word_padded() {
        let sdes = build_sdes_cname(0x1234_5678, "bts0/trx0");
        assert_eq!(sdes.len() % 4, 0);
        assert_eq!(sdes[1], RTCP_PT_SDES);
    }

    #[test]
    fn unix_epoch_maps_to_known_ntp_second() {
        let (sec, fract) = unix_to_ntp(0, 0);
        assert_eq!(sec, NTP_UNIX_EPOCH_DIFF as u32);
        assert_eq!(fract, 0);
    }

    #[test]
    fn rr_block_reports_zero_loss_when_fully_caught_up() {
        let mut state = RrEmitState::new();
        let rri = RrInfo {
            ssrc: 7,
            rx_packets: 10,
            base_seq: 0,
            max_seq_ext: 9,
            expected_pkt: 10,
            jitter_accum: 160,
        };
        let block = state.build_block(&rri, None, 0);
        assert_eq!(block.lost_word >> 24, 0);
        assert_eq!(block.lost_word & 0x00FF_FFFF, 0);
        assert_eq!(block.jitter, 10);
    }

    #[test]
    fn rr_block_reports_partial_loss_since_last_report() {
        let mut state = RrEmitState::new();
        let mut rri = RrInfo {
            ssrc: 7,
            rx_packets: 10,
            base_seq: 0,
            max_seq_ext: 9,
            expected_pkt: 10,
            jitter_accum: 0,
        };
        let _ = state.build_block(&rri, None, 0);
        rri.rx_packets = 15;
        rri.expected_pkt = 20;
        rri.max_seq_ext = 19;
        let block = state.build_block(&rri, None, 0);
        assert_eq!(block.lost_word & 0x00FF_FFFF, 5);
        assert!(block.lost_word >> 24 > 0);
    }

    #[test]
    fn compound_packet_carries_sdes_after_report() {
        let sdes = build_sdes_cname(42, "x");
        let packet = build_compound(42, None, (0, 0), None, &sdes);
        assert_eq!(packet[1], RTCP_PT_RR);
        assert!(packet.len() > 8);
    }
}

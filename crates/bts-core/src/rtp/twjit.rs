// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Adaptive jitter buffer ("twjit", spec.md §4.8).
//!
//! Maintains up to two subbuffers, each a per-SSRC queue of RTP payloads
//! at a fixed timestamp quantum `Q`. A subbuffer is modeled as a ring of
//! optional slots anchored at `head_ts`: slot `i` holds the payload due
//! `i` quanta after `head_ts`, or `None` for a quantum not yet received.

use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Tunable jitter buffer parameters (`original_source/src/common/twjit.c`,
/// `obts_twjit_config`).
#[derive(Debug, Clone, Copy)]
pub struct JitterConfig {
    /// Subbuffer depth at which HUNT may transition to FLOWING.
    pub bd_start: u32,
    /// Depth above which thinning engages.
    pub bd_hiwat: u32,
    /// Thin one quantum every N polls once above `bd_hiwat`.
    pub thinning_int: u32,
    /// Maximum seconds a packet may run ahead of the subbuffer before a
    /// handover subbuffer is started instead.
    pub max_future_sec: u32,
    /// Minimum inter-arrival delta (ms) required before HUNT may flow.
    pub start_min_delta: u32,
    /// Maximum inter-arrival delta (ms) tolerated while starting; 0
    /// disables the check.
    pub start_max_delta: u32,
    /// Duration of one quantum, in milliseconds.
    pub quantum_ms: u32,
    /// RTP clock rate in Hz (e.g. 8000 for GSM FR).
    pub clock_rate_hz: u32,
}

impl JitterConfig {
    #[must_use]
    pub fn ts_quantum(&self) -> u32 {
        self.quantum_ms * (self.clock_rate_hz / 1000)
    }

    #[must_use]
    pub fn quanta_per_sec(&self) -> u32 {
        1000 / self.quantum_ms
    }

    #[must_use]
    pub fn ts_units_per_ms(&self) -> u32 {
        self.clock_rate_hz / 1000
    }

    /// # Errors
    /// Returns [`Error::IeContent`] if any parameter is out of the
    /// ranges enforced by `config_is_valid()` in the original source.
    pub fn validate(&self) -> Result<()> {
        if self.bd_start < 1 {
            return Err(Error::IeContent("twjit bd_start must be >= 1".into()));
        }
        if self.bd_hiwat < self.bd_start {
            return Err(Error::IeContent("twjit bd_hiwat must be >= bd_start".into()));
        }
        if self.thinning_int < 2 {
            return Err(Error::IeContent("twjit thinning_int must be >= 2".into()));
        }
        if self.max_future_sec < 1 {
            return Err(Error::IeContent("twjit max_future_sec must be >= 1".into()));
        }
        Ok(())
    }
}

impl Default for JitterConfig {
    fn default() -> Self {
        use crate::config::{
            TWJIT_DEFAULT_BD_HIWAT, TWJIT_DEFAULT_BD_START, TWJIT_DEFAULT_MAX_FUTURE_SEC,
            TWJIT_DEFAULT_THINNING_INT,
        };
        Self {
            bd_start: TWJIT_DEFAULT_BD_START,
            bd_hiwat: TWJIT_DEFAULT_BD_HIWAT,
            thinning_int: TWJIT_DEFAULT_THINNING_INT,
            max_future_sec: TWJIT_DEFAULT_MAX_FUTURE_SEC,
            start_min_delta: 0,
            start_max_delta: 0,
            quantum_ms: 20,
            clock_rate_hz: 8000,
        }
    }
}

/// Lifetime statistics (spec.md §4.8, "reception statistics").
#[derive(Debug, Clone, Copy, Default)]
pub struct JitterStats {
    pub rx_packets: u64,
    pub bad_packets: u64,
    pub duplicate_ts: u64,
    pub too_old: u64,
    pub underruns: u64,
    pub ho_underruns: u64,
    pub output_gaps: u64,
    pub delivered_pkt: u64,
    pub thinning_drops: u64,
    pub handovers_in: u64,
    pub handovers_out: u64,
    pub ssrc_changes: u64,
    pub seq_backwards: u64,
    pub seq_repeats: u64,
    pub seq_skips: u64,
    pub intentional_gaps: u64,
    pub ts_resets: u64,
    /// Largest interarrival jitter sample observed, RTP timestamp units.
    pub jitter_max: i64,
}

/// Analytics feeding RTCP RR generation (spec.md §4.8, RFC 3550 §A.8
/// fixed-point interarrival jitter; `original_source/src/common/twjit.c`
/// `struct obts_twjit_rr_info`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RrInfo {
    pub ssrc: u32,
    pub rx_packets: u64,
    pub base_seq: u16,
    /// Extended highest sequence number received: high 16 bits are the
    /// seqno wraparound cycle count, low 16 bits are the seqno itself.
    pub max_seq_ext: u32,
    pub expected_pkt: u32,
    /// RFC 3550 §A.8 jitter estimate, scaled by 16 (fixed-point).
    pub jitter_accum: i64,
}

#[derive(Debug)]
struct Subbuffer {
    ssrc: u32,
    head_ts: u32,
    slots: VecDeque<Option<Vec<u8>>>,
    drop_int_count: u32,
    delta_ms: u32,
}

impl Subbuffer {
    fn first_packet(ssrc: u32, ts: u32, payload: Vec<u8>) -> Self {
        let mut slots = VecDeque::with_capacity(4);
        slots.push_back(Some(payload));
        Self {
            ssrc,
            head_ts: ts,
            slots,
            drop_int_count: 0,
            // Pacifies the start_min_delta check for bd_start == 1, same
            // as the original `sb->delta_ms = UINT32_MAX`.
            delta_ms: u32::MAX,
        }
    }

    fn depth(&self) -> u32 {
        self.slots.len() as u32
    }

    fn insert(&mut self, ts_quantum: u32, ts: u32, payload: Vec<u8>, stats: &mut JitterStats) {
        let ts_delta = ts.wrapping_sub(self.head_ts);
        let idx = (ts_delta / ts_quantum) as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx, || None);
            self.slots.push_back(Some(payload));
        } else if self.slots[idx].is_some() {
            stats.duplicate_ts += 1;
        } else {
            self.slots[idx] = Some(payload);
        }
    }

    /// Drop leading slots down to `bd_start` depth (HUNT-state trimming).
    fn trim_to(&mut self, bd_start: u32, ts_quantum: u32) {
        while self.depth() > bd_start {
            self.slots.pop_front();
            self.head_ts = self.head_ts.wrapping_add(ts_quantum);
        }
    }

    fn pull(&mut self, ts_quantum: u32, stats: &mut JitterStats) -> Option<Vec<u8>> {
        let front = self.slots.pop_front()?;
        self.head_ts = self.head_ts.wrapping_add(ts_quantum);
        match front {
            Some(payload) => {
                stats.delivered_pkt += 1;
                Some(payload)
            }
            None => {
                stats.output_gaps += 1;
                None
            }
        }
    }
}

/// Input classification (`check_input_for_subbuf` in the original).
enum InputDecision {
    Continue,
    TooOld,
    Reset,
}

fn check_input(
    sb: &Subbuffer,
    starting: bool,
    config: &JitterConfig,
    rx_ssrc: u32,
    rx_ts: u32,
) -> InputDecision {
    if rx_ssrc != sb.ssrc {
        return InputDecision::Reset;
    }
    let ts_delta = rx_ts.wrapping_sub(sb.head_ts) as i32;
    if ts_delta < 0 {
        return InputDecision::TooOld;
    }
    let ts_quantum = config.ts_quantum();
    if ts_delta as u32 % ts_quantum != 0 {
        return InputDecision::Reset;
    }
    if starting {
        if config.start_max_delta != 0 && sb.delta_ms > config.start_max_delta {
            return InputDecision::Reset;
        }
    } else {
        let fwd = ts_delta as u32 / ts_quantum;
        if fwd >= config.max_future_sec * config.quanta_per_sec() {
            return InputDecision::Reset;
        }
    }
    InputDecision::Continue
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterState {
    Empty,
    Hunt,
    Flowing,
    Handover,
}

/// The jitter buffer proper (spec.md §4.8).
#[derive(Debug)]
pub struct TwJit {
    config: JitterConfig,
    state: JitterState,
    write: Option<Subbuffer>,
    handover: Option<Subbuffer>,
    got_first_packet: bool,
    last_seq: Option<u16>,
    last_ts: u32,
    last_arrival_ns: Option<u64>,
    last_arrival_delta_ms: u32,
    rr_info: RrInfo,
    stats: JitterStats,
}

impl TwJit {
    /// # Errors
    /// Returns an error if `config` fails [`JitterConfig::validate`].
    pub fn new(config: JitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: JitterState::Empty,
            write: None,
            handover: None,
            got_first_packet: false,
            last_seq: None,
            last_ts: 0,
            last_arrival_ns: None,
            last_arrival_delta_ms: 0,
            rr_info: RrInfo::default(),
            stats: JitterStats::default(),
        })
    }

    #[must_use]
    pub fn state(&self) -> JitterState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> JitterStats {
        self.stats
    }

    #[must_use]
    pub fn rr_info(&self) -> RrInfo {
        self.rr_info
    }

    fn analytics_init(&mut self, ssrc: u32, seq: u16) {
        self.rr_info = RrInfo {
            ssrc,
            rx_packets: 1,
            base_seq: seq,
            max_seq_ext: u32::from(seq),
            expected_pkt: 1,
            jitter_accum: 0,
        };
    }

    /// RFC 3550 §A.8 fixed-point interarrival jitter, plus the sequence
    /// and timing bookkeeping RTCP RR reporting needs
    /// (`analytics_cont()` in the original source).
    fn analytics_cont(&mut self, seq: u16, ts: u32, arrival_ns: u64) {
        let last_seq = self.last_seq.expect("analytics_cont only called after a first packet");
        let seq_delta = seq.wrapping_sub(last_seq) as i16;
        let ts_delta = ts.wrapping_sub(self.last_ts) as i32;
        let ts_quantum = self.config.ts_quantum() as i32;

        if seq_delta < 0 {
            self.stats.seq_backwards += 1;
        } else if seq_delta == 0 {
            self.stats.seq_repeats += 1;
        } else if seq_delta == 1 {
            if ts_delta != ts_quantum {
                if ts_delta > 0 && ts_delta % ts_quantum == 0 {
                    self.stats.intentional_gaps += 1;
                } else {
                    self.stats.ts_resets += 1;
                }
            }
        } else {
            self.stats.seq_skips += 1;
        }

        self.rr_info.rx_packets += 1;
        let seq_ext_lo = self.rr_info.max_seq_ext as u16;
        let mut seq_ext_hi = (self.rr_info.max_seq_ext >> 16) as u16;
        let seq_delta2 = seq.wrapping_sub(seq_ext_lo) as i16;
        if seq_delta2 > 0 {
            if seq < seq_ext_lo {
                seq_ext_hi = seq_ext_hi.wrapping_add(1);
            }
            self.rr_info.max_seq_ext = (u32::from(seq_ext_hi) << 16) | u32::from(seq);
            self.rr_info.expected_pkt =
                self.rr_info.max_seq_ext - u32::from(self.rr_info.base_seq) + 1;
        }

        let ts_units_per_sec = u64::from(self.config.clock_rate_hz);
        let arrival_delta_ns = arrival_ns.saturating_sub(self.last_arrival_ns.unwrap_or(arrival_ns));
        let clamped_ns = arrival_delta_ns.min(3600 * 1_000_000_000);
        let time_delta_tsu =
            (u128::from(clamped_ns) * u128::from(ts_units_per_sec) / 1_000_000_000u128) as u32;
        self.last_arrival_delta_ms = time_delta_tsu / self.config.ts_units_per_ms().max(1);

        let ts_delta_clamp = (ts_units_per_sec as i64) * 3600;
        let ts_delta_clamped = i64::from(ts_delta).clamp(-ts_delta_clamp, ts_delta_clamp);
        let jitter_new = (i64::from(time_delta_tsu) - ts_delta_clamped).abs();
        self.rr_info.jitter_accum += jitter_new - ((self.rr_info.jitter_accum + 8) >> 4);
        if jitter_new > self.stats.jitter_max {
            self.stats.jitter_max = jitter_new;
        }
    }

    /// Feed one received RTP payload (spec.md §4.8, "Entry").
    pub fn input(&mut self, ssrc: u32, seq: u16, ts: u32, arrival_ns: u64, payload: Vec<u8>) {
        let got_previous = self.last_seq.is_some();
        if !got_previous {
            self.analytics_init(ssrc, seq);
        } else if ssrc != self.rr_info.ssrc {
            self.stats.ssrc_changes += 1;
            self.analytics_init(ssrc, seq);
        } else {
            self.analytics_cont(seq, ts, arrival_ns);
        }
        self.last_seq = Some(seq);
        self.last_ts = ts;
        self.last_arrival_ns = Some(arrival_ns);
        self.stats.rx_packets += 1;
        self.got_first_packet = true;

        match self.state {
            JitterState::Empty => {
                if got_previous {
                    self.stats.underruns += 1;
                }
                self.state = JitterState::Hunt;
                self.write = Some(Subbuffer::first_packet(ssrc, ts, payload));
            }
            JitterState::Hunt | JitterState::Handover => {
                let sb = self.write.as_mut().expect("write subbuffer present");
                sb.delta_ms = self.last_arrival_delta_ms;
                match check_input(sb, true, &self.config, ssrc, ts) {
                    InputDecision::TooOld => self.stats.too_old += 1,
                    InputDecision::Reset => {
                        self.write = Some(Subbuffer::first_packet(ssrc, ts, payload));
                    }
                    InputDecision::Continue => {
                        let sb = self.write.as_mut().expect("write subbuffer present");
                        sb.insert(self.config.ts_quantum(), ts, payload, &mut self.stats);
                        sb.trim_to(self.config.bd_start, self.config.ts_quantum());
                    }
                }
            }
            JitterState::Flowing => {
                let sb = self.write.as_mut().expect("write subbuffer present");
                sb.delta_ms = self.last_arrival_delta_ms;
                match check_input(sb, false, &self.config, ssrc, ts) {
                    InputDecision::TooOld => self.stats.too_old += 1,
                    InputDecision::Reset => {
                        self.stats.handovers_in += 1;
                        self.handover = self.write.take();
                        self.write = Some(Subbuffer::first_packet(ssrc, ts, payload));
                        self.state = JitterState::Handover;
                    }
                    InputDecision::Continue => {
                        let sb = self.write.as_mut().expect("write subbuffer present");
                        sb.insert(self.config.ts_quantum(), ts, payload, &mut self.stats);
                    }
                }
            }
        }
    }

    fn starting_sb_ready(&self) -> bool {
        match &self.write {
            Some(sb) => {
                sb.depth() >= self.config.bd_start && sb.delta_ms >= self.config.start_min_delta
            }
            None => false,
        }
    }

    fn thin(sb: &mut Subbuffer, config: &JitterConfig, stats: &mut JitterStats) -> Option<Vec<u8>> {
        if sb.drop_int_count > 0 {
            sb.drop_int_count -= 1;
            return sb.pull(config.ts_quantum(), stats);
        }
        if sb.depth() <= config.bd_hiwat {
            return sb.pull(config.ts_quantum(), stats);
        }
        stats.thinning_drops += 1;
        let _ = sb.pull(config.ts_quantum(), stats);
        sb.drop_int_count = config.thinning_int - 2;
        sb.pull(config.ts_quantum(), stats)
    }

    /// Periodic poll every `quantum_ms` (spec.md §4.8, "Exit").
    pub fn output(&mut self) -> Option<Vec<u8>> {
        match self.state {
            JitterState::Empty => {
                if self.got_first_packet {
                    self.stats.underruns += 1;
                    self.got_first_packet = false;
                }
                None
            }
            JitterState::Hunt => {
                if !self.starting_sb_ready() {
                    return None;
                }
                self.state = JitterState::Flowing;
                let mut sb = self.write.take()?;
                let out = sb.pull(self.config.ts_quantum(), &mut self.stats);
                self.write = Some(sb);
                out
            }
            JitterState::Flowing => {
                let empty = self.write.as_ref().map_or(true, |sb| sb.depth() == 0);
                if empty {
                    self.state = JitterState::Empty;
                    self.write = None;
                    return None;
                }
                let mut sb = self.write.take()?;
                let out = Self::thin(&mut sb, &self.config, &mut self.stats);
                self.write = Some(sb);
                out
            }
            JitterState::Handover => {
                if self.starting_sb_ready() {
                    self.stats.handovers_out += 1;
                    self.state = JitterState::Flowing;
                    self.handover = None;
                    let mut sb = self.write.take()?;
                    let out = sb.pull(self.config.ts_quantum(), &mut self.stats);
                    self.write = Some(sb);
                    return out;
                }
                let empty = self.handover.as_ref().map_or(true, |sb| sb.depth() == 0);
                if empty {
                    self.state = JitterState::Hunt;
                    self.stats.ho_underruns += 1;
                    self.handover = None;
                    return None;
                }
                let mut sb = self.handover.take()?;
                let out = Self::thin(&mut sb, &self.config, &mut self.stats);
                self.handover = Some(sb);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS_PER_QUANTUM: u64 = 20_000_000;

    fn cfg() -> JitterConfig {
        JitterConfig {
            bd_start: 2,
            bd_hiwat: 4,
            thinning_int: 17,
            max_future_sec: 10,
            start_min_delta: 0,
            start_max_delta: 0,
            quantum_ms: 20,
            clock_rate_hz: 8000,
        }
    }

    #[test]
    fn empty_then_hunt_then_flowing() {
        let mut j = TwJit::new(cfg()).unwrap();
        assert_eq!(j.state(), JitterState::Empty);
        j.input(1, 0, 0, 0, vec![1]);
        assert_eq!(j.state(), JitterState::Hunt);
        assert!(j.output().is_none());
        j.input(1, 1, 160, NS_PER_QUANTUM, vec![2]);
        let out = j.output();
        assert_eq!(j.state(), JitterState::Flowing);
        assert_eq!(out, Some(vec![1]));
    }

    #[test]
    fn duplicate_timestamp_is_dropped() {
        let mut j = TwJit::new(cfg()).unwrap();
        j.input(1, 0, 0, 0, vec![1]);
        j.input(1, 1, 0, NS_PER_QUANTUM, vec![99]);
        assert_eq!(j.stats().duplicate_ts, 1);
    }

    #[test]
    fn out_of_order_packet_fills_gap() {
        let mut c = cfg();
        c.bd_start = 3;
        let mut j = TwJit::new(c).unwrap();
        j.input(1, 0, 0, 0, vec![1]);
        j.input(1, 1, 320, NS_PER_QUANTUM, vec![3]);
        j.input(1, 2, 160, 2 * NS_PER_QUANTUM, vec![2]);
        assert_eq!(j.output(), Some(vec![1]));
        assert_eq!(j.output(), Some(vec![2]));
        assert_eq!(j.output(), Some(vec![3]));
    }

    #[test]
    fn ssrc_change_triggers_handover() {
        let mut j = TwJit::new(cfg()).unwrap();
        for n in 0..10u32 {
            j.input(0xAAAA, n as u16, n * 160, u64::from(n) * NS_PER_QUANTUM, vec![n as u8]);
        }
        // One poll is enough to flip Hunt -> Flowing; A still has packets
        // queued behind it.
        assert!(j.output().is_some());
        assert_eq!(j.state(), JitterState::Flowing);
        j.input(0xBBBB, 0, 0, 10 * NS_PER_QUANTUM, vec![200]);
        assert_eq!(j.state(), JitterState::Handover);
        assert_eq!(j.stats().handovers_in, 1);
    }

    #[test]
    fn standing_queue_above_hiwat_is_thinned() {
        let mut j = TwJit::new(cfg()).unwrap();
        j.input(1, 0, 0, 0, vec![0]);
        j.input(1, 1, 160, NS_PER_QUANTUM, vec![1]);
        let _ = j.output();
        assert_eq!(j.state(), JitterState::Flowing);
        // Network delivers faster than it's drained, growing a standing
        // queue well past bd_hiwat (4) without polling in between.
        for n in 2..8u32 {
            j.input(1, n as u16, n * 160, u64::from(n) * NS_PER_QUANTUM, vec![n as u8]);
        }
        let before = j.stats().thinning_drops;
        let _ = j.output();
        assert_eq!(j.stats().thinning_drops, before + 1);
    }

    #[test]
    fn too_old_packet_is_counted_and_dropped() {
        let mut j = TwJit::new(cfg()).unwrap();
        j.input(1, 0, 320, 0, vec![1]);
        let _ = j.output();
        let _ = j.output();
        j.input(1, 1, 0, NS_PER_QUANTUM, vec![0]);
        assert_eq!(j.stats().too_old, 1);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut bad = cfg();
        bad.thinning_int = 1;
        assert!(TwJit::new(bad).is_err());
    }

    #[test]
    fn rr_info_tracks_extended_sequence_and_expected_count() {
        let mut j = TwJit::new(cfg()).unwrap();
        for n in 0..5u32 {
            j.input(1, n as u16, n * 160, u64::from(n) * NS_PER_QUANTUM, vec![n as u8]);
        }
        let rr = j.rr_info();
        assert_eq!(rr.base_seq, 0);
        assert_eq!(rr.max_seq_ext, 4);
        assert_eq!(rr.expected_pkt, 5);
        assert_eq!(rr.rx_packets, 5);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame clock: the BTS-wide notion of "now" (spec.md §4.2).
//!
//! Advanced exclusively by `MPH-INFO.ind(TIME)`; nothing else is allowed
//! to move it forward. Tracks a rolling latency statistic over
//! `rts_fn - current_fn` the way the teacher's reliability layer tracks
//! RTT statistics for its heartbeat cadence.

use crate::config::FN_MODULUS;
use crate::error::{Error, Result};

/// Rolling statistics over the PH-RTS.ind lead time (`rts_fn -
/// current_fn`), spec.md §4.2.
#[derive(Debug, Clone, Copy)]
pub struct FnStats {
    pub min: u32,
    pub max: u32,
    /// Average, fixed-point Q8 (value * 256).
    pub avg256: u32,
    pub avg_count: u64,
    /// Number of samples folded into the running average before it is
    /// reset (bounds unbounded drift over a long-running process).
    pub avg_window: u64,
}

impl Default for FnStats {
    fn default() -> Self {
        Self {
            min: u32::MAX,
            max: 0,
            avg256: 0,
            avg_count: 0,
            avg_window: 4096,
        }
    }
}

impl FnStats {
    fn record(&mut self, lead: u32) {
        self.min = self.min.min(lead);
        self.max = self.max.max(lead);
        if self.avg_count == 0 {
            self.avg256 = lead * 256;
        } else {
            // Exponential-ish running mean, reset every avg_window samples
            // to bound the influence of stale history.
            self.avg256 = self.avg256 + (lead * 256).wrapping_sub(self.avg256) / 16;
        }
        self.avg_count += 1;
        if self.avg_count >= self.avg_window {
            self.avg_count = 0;
        }
    }
}

/// A contiguous range of frame numbers whose RACH slots were skipped by a
/// clock gap and must be treated as expired (spec.md §4.2, "Gap
/// detection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredRachWindow {
    pub from_fn: u32,
    pub to_fn: u32,
}

/// The BTS-wide frame clock.
#[derive(Debug, Default)]
pub struct FrameClock {
    current_fn: Option<u32>,
    pub stats: FnStats,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_fn(&self) -> Option<u32> {
        self.current_fn
    }

    /// Advance the clock to `new_fn` (an `MPH-INFO.ind(TIME)` tick).
    ///
    /// Returns the skipped-frame window if the new frame number is more
    /// than one ahead of the previous one (spec.md §4.2: "if the new FN
    /// is more than 1 greater than the previous, the scheduler must mark
    /// as expired every RACH slot in the skipped window").
    pub fn advance(&mut self, new_fn: u32) -> Option<ExpiredRachWindow> {
        let gap = match self.current_fn {
            None => None,
            Some(prev) => {
                let delta = new_fn.wrapping_sub(prev) % FN_MODULUS;
                if delta > 1 {
                    Some(ExpiredRachWindow {
                        from_fn: (prev + 1) % FN_MODULUS,
                        to_fn: (new_fn.wrapping_sub(1)) % FN_MODULUS,
                    })
                } else {
                    None
                }
            }
        };
        self.current_fn = Some(new_fn % FN_MODULUS);
        gap
    }

    /// Validate a PH-RTS.ind's frame number against the current clock and
    /// fold its lead time into `fn_stats`.
    ///
    /// # Errors
    /// Returns [`Error::Overrun`] if `rts_fn` names a frame already past
    /// the current clock.
    pub fn observe_rts(&mut self, rts_fn: u32) -> Result<()> {
        let current = self.current_fn.unwrap_or(0);
        let lead = rts_fn.wrapping_sub(current) % FN_MODULUS;
        // A lead time spanning more than half the hyperframe means rts_fn
        // is actually behind current: the PHY asked for a burst we have
        // already passed.
        if lead > FN_MODULUS / 2 {
            return Err(Error::Overrun);
        }
        self.stats.record(lead);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_no_gap() {
        let mut clk = FrameClock::new();
        assert!(clk.advance(100).is_none());
        assert_eq!(clk.current_fn(), Some(100));
    }

    #[test]
    fn skipped_frames_reported_as_expired_window() {
        let mut clk = FrameClock::new();
        clk.advance(100);
        let gap = clk.advance(105).expect("gap detected");
        assert_eq!(gap.from_fn, 101);
        assert_eq!(gap.to_fn, 104);
    }

    #[test]
    fn consecutive_ticks_report_no_gap() {
        let mut clk = FrameClock::new();
        clk.advance(100);
        assert!(clk.advance(101).is_none());
    }

    #[test]
    fn rts_behind_clock_is_overrun() {
        let mut clk = FrameClock::new();
        clk.advance(1000);
        assert!(matches!(clk.observe_rts(999), Err(Error::Overrun)));
    }

    #[test]
    fn rts_ahead_of_clock_updates_stats() {
        let mut clk = FrameClock::new();
        clk.advance(1000);
        clk.observe_rts(1003).unwrap();
        assert_eq!(clk.stats.min, 3);
        assert_eq!(clk.stats.max, 3);
        assert_eq!(clk.stats.avg_count, 1);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by BTS core operations.
//!
//! This enum covers the error taxonomy in spec.md §7, from malformed
//! A-bis/PCU messages to PHY and transport failures. Every decode path
//! reachable from externally sourced bytes (RSL/OML TLVs, PCU frames)
//! returns a `Result` rather than panicking; the RSL/OML layers convert
//! these into NACK / ERROR-REPORT messages (see `rsl::cause`).
//!
//! # Example
//!
//! ```rust,no_run
//! use bts_core::error::Error;
//!
//! fn check_arfcn(arfcn: u16) -> Result<(), Error> {
//!     if arfcn > 1023 {
//!         return Err(Error::IeContent("ARFCN out of range".into()));
//!     }
//!     Ok(())
//! }
//! ```

/// `Result` alias used throughout the BTS core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Protocol decode errors (A-bis OML/RSL, PCU framing)
    // ========================================================================
    /// Truncated or malformed TLV while decoding an OML/RSL message.
    ProtocolDecode(String),
    /// A mandatory IE was missing from an otherwise well-formed message.
    MandIeMissing(&'static str),
    /// An IE was present but its content was out of range or inconsistent.
    IeContent(String),
    /// The message names a feature this BTS does not implement.
    Unsupported(String),
    /// chan_nr / TRX number referenced an object that does not exist.
    UnknownObject(String),

    // ========================================================================
    // PHY / scheduler errors
    // ========================================================================
    /// PH-RTS.ind named a frame number already past the scheduler's clock.
    Overrun,
    /// chan_nr does not map to any configured logical channel.
    NoChannel,
    /// MPH-ACTIVATE.cnf / deactivate did not complete before the bounded
    /// PHY timeout; the lchan has moved to BROKEN.
    PhyTimeout,
    /// PHY reported a hard failure for the given reason.
    PhyFailure(String),

    // ========================================================================
    // Transport errors
    // ========================================================================
    /// Socket bind/connect/accept failed.
    Io(std::io::Error),
    /// The BSC (OML/RSL) link went down.
    AbisLinkDown,
    /// The PCU socket was lost (EOF, version mismatch, queue overrun).
    PcuLinkLost(String),

    // ========================================================================
    // Resource / queue errors
    // ========================================================================
    /// A bounded queue (paging, AGCH, PCU write queue) is at capacity.
    Congested,
    /// Jitter buffer underrun for the current poll quantum.
    JitterUnderrun,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ProtocolDecode(msg) => write!(f, "protocol decode error: {msg}"),
            Error::MandIeMissing(ie) => write!(f, "mandatory IE missing: {ie}"),
            Error::IeContent(msg) => write!(f, "invalid IE content: {msg}"),
            Error::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Error::UnknownObject(msg) => write!(f, "unknown object: {msg}"),
            Error::Overrun => write!(f, "scheduler overrun: frame number already past"),
            Error::NoChannel => write!(f, "chan_nr does not map to a configured lchan"),
            Error::PhyTimeout => write!(f, "PHY activation/deactivation timed out"),
            Error::PhyFailure(msg) => write!(f, "PHY failure: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::AbisLinkDown => write!(f, "A-bis (OML/RSL) link is down"),
            Error::PcuLinkLost(msg) => write!(f, "PCU link lost: {msg}"),
            Error::Congested => write!(f, "queue congested"),
            Error::JitterUnderrun => write!(f, "jitter buffer underrun"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

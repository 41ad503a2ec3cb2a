// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # bts-core - GSM Base Transceiver Station core
//!
//! A pure Rust implementation of the GSM BTS control-plane core: A-bis
//! OML/RSL message handling, the TDMA/L1-SAP scheduler, paging, uplink
//! measurement processing, PCU side-channel framing, RTP/RTCP transport
//! with jitter buffering, and MS/BS power control.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                    A-bis OML / RSL (TCP, IPA)                       |
//! +---------------------------------------------------------------------+
//! |   oml        | rsl          | paging       | measurement            |
//! |   MO tree,   | dedicated &  | AGCH/CBCH,   | SACCH aggregation,     |
//! |   attributes | common chan  | congestion   | radio link timeout     |
//! +---------------------------------------------------------------------+
//! |                    scheduler (TDMA multiframe, L1-SAP)               |
//! +---------------------------------------------------------------------+
//! |   l1sap      | model                      | pcu         | rtp        |
//! |   MPH/PH     | Bts/Trx/Timeslot/Lchan     | PCU socket  | twjit/twrtp|
//! |   primitives | arena                      | framing     | RTCP       |
//! +---------------------------------------------------------------------+
//! |                       power_control (MS/BS loops)                   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`model::Bts`] | Root of the BTS/TRX/Timeslot/Lchan arena |
//! | [`scheduler::frame_clock::FrameClock`] | TDMA frame-number clock and RACH window tracking |
//! | [`rsl::common::Discriminator`] | RSL message discriminator classification |
//! | [`rtp::TwJit`] | Adaptive jitter buffer for RTP reception |
//! | [`power_control::ms::MsPowerLoop`] | Autonomous uplink power control loop |
//!
//! ## Modules Overview
//!
//! - [`model`] - BTS/TRX/Timeslot/Lchan object model
//! - [`scheduler`] - TDMA multiframe scheduling and L1-SAP dispatch
//! - [`oml`] - A-bis OML managed-object handling
//! - [`rsl`] - A-bis RSL dedicated/common channel handling
//! - [`paging`] - Paging group calculation, AGCH/CBCH queues
//! - [`measurement`] - Uplink measurement aggregation, radio link timeout
//! - [`pcu`] - PCU side-channel protocol and socket framing
//! - [`rtp`] - RTP/RTCP transport, adaptive jitter buffer
//! - [`power_control`] - MS/BS autonomous power control loops
//! - [`config`] - Global constants and runtime-configurable attributes
//! - [`logging`] - Structured logging output
//!
//! ## See Also
//!
//! - 3GPP TS 08.58 (A-bis RSL), TS 12.21 (A-bis OML)
//! - 3GPP TS 05.02 (Multiplexing and multiple access), TS 05.08 (Radio subsystem link control)
//! - 3GPP TS 45.008 (Radio subsystem link control, power control)
//! - RFC 3550 (RTP), RFC 3551 (RTP A/V profile)

/// Error taxonomy and `Result` alias used throughout the BTS core.
pub mod error;

/// Global constants and runtime-configurable attributes (copy-on-write).
pub mod config;

/// Structured logging output (console/file, level filtering).
pub mod logging;

/// BTS/TRX/Timeslot/Lchan object model (typed-index arena).
pub mod model;

/// A-bis OML managed-object handling (spec.md §4.3).
pub mod oml;

/// A-bis RSL dedicated/common channel handling (spec.md §4.4-4.6).
pub mod rsl;

/// TDMA multiframe scheduling and L1-SAP dispatch (spec.md §4.1-4.2).
pub mod scheduler;

/// L1-SAP primitives (PH-*, MPH-*) and GSMTAP debug observation.
pub mod l1sap;

/// Paging group calculation, AGCH/CBCH queues (spec.md §4.6).
pub mod paging;

/// Uplink measurement aggregation and radio link timeout (spec.md §4.2).
pub mod measurement;

/// PCU side-channel protocol and socket framing (spec.md §4.7).
pub mod pcu;

/// RTP/RTCP transport and adaptive jitter buffer (spec.md §4.8).
pub mod rtp;

/// MS/BS autonomous power control loops (spec.md §4.9).
pub mod power_control;

pub use error::{Error, Result};

/// bts-core version string.
pub const VERSION: &str = "0.1.0";

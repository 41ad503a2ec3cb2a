// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RSL protocol engine (spec.md §4.3; 3GPP TS 48.058).
//!
//! Terminates every non-RLL A-bis Radio Signalling Link message. RLL
//! (Radio Link Layer) messages are forwarded whole to the LAPDm library,
//! which owns retransmission, segmentation, and SAPI-0/3 datalinks; this
//! engine never inspects their payload.

pub mod cause;
pub mod common;
pub mod dedicated;
pub mod error_report;
pub mod trx_msg;

pub use cause::Cause;
pub use error_report::ErrorReport;

use crate::error::{Error, Result};

/// RSL message discriminator (first header byte, 3GPP 48.058 §9.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    RadioLinkLayer,
    DedicatedChannel,
    CommonChannel,
    Trx,
    IpAccess,
}

/// Classify the first header byte of an inbound RSL message (spec.md
/// §4.3, "Message classification").
///
/// # Errors
/// Returns [`Error::ProtocolDecode`] for a discriminator value this
/// implementation does not recognize.
pub fn classify_discriminator(byte: u8) -> Result<Discriminator> {
    // 0x40/0x60/0x80/0xA0 occupy the top 3 bits per 08.58 §9.1; bit 0 is
    // the Transparent flag, which callers inspect separately, so it's
    // cleared before matching. RLL spans the whole low range 0x00-0x1F.
    match byte & 0xFE {
        0x00..=0x1E => Ok(Discriminator::RadioLinkLayer),
        0x40 => Ok(Discriminator::DedicatedChannel),
        0x60 => Ok(Discriminator::CommonChannel),
        0x80 => Ok(Discriminator::Trx),
        0xA0 => Ok(Discriminator::IpAccess),
        other => {
            crate::warn!("unknown RSL discriminator 0x{other:02x}");
            Err(Error::ProtocolDecode(format!(
                "unknown RSL discriminator 0x{other:02x}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_every_defined_discriminator() {
        assert_eq!(classify_discriminator(0x00).unwrap(), Discriminator::RadioLinkLayer);
        assert_eq!(classify_discriminator(0x40).unwrap(), Discriminator::DedicatedChannel);
        assert_eq!(classify_discriminator(0x60).unwrap(), Discriminator::CommonChannel);
        assert_eq!(classify_discriminator(0x80).unwrap(), Discriminator::Trx);
        assert_eq!(classify_discriminator(0xA0).unwrap(), Discriminator::IpAccess);
    }

    #[test]
    fn rejects_unknown_discriminator() {
        assert!(classify_discriminator(0x33).is_err());
    }

    #[test]
    fn transparent_bit_does_not_affect_classification() {
        assert_eq!(classify_discriminator(0x01).unwrap(), Discriminator::RadioLinkLayer);
    }
}

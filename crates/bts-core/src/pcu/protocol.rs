// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PCU_IF wire protocol (spec.md §4.7).
//!
//! Every primitive begins with a fixed 4-byte header
//! `{msg_type: u8, bts_nr: u8, _pad: u16}`; most message bodies are
//! fixed-size, except `CONTAINER`, which carries a 16-bit length prefix.

use crate::config::PCU_IF_VERSION;
use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 4;

/// PCU_IF message type (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    InfoInd,
    ActReq,
    ActAck,
    ActNack,
    DataReq,
    DataInd,
    DataCnf,
    RachInd,
    PagReq,
    TxtInd,
    Container,
    TimeInd,
    InterfInd,
    SuspReq,
    AppInfoReq,
}

impl MsgType {
    #[must_use]
    pub fn wire_value(self) -> u8 {
        match self {
            MsgType::InfoInd => 0x01,
            MsgType::ActReq => 0x10,
            MsgType::ActAck => 0x11,
            MsgType::ActNack => 0x12,
            MsgType::DataReq => 0x20,
            MsgType::DataInd => 0x21,
            MsgType::DataCnf => 0x22,
            MsgType::RachInd => 0x30,
            MsgType::PagReq => 0x40,
            MsgType::TxtInd => 0x50,
            MsgType::Container => 0x60,
            MsgType::TimeInd => 0x70,
            MsgType::InterfInd => 0x71,
            MsgType::SuspReq => 0x80,
            MsgType::AppInfoReq => 0x90,
        }
    }

    /// Decode a wire byte back into a [`MsgType`].
    ///
    /// # Errors
    /// Returns [`Error::ProtocolDecode`] for an unrecognized message
    /// type.
    pub fn from_wire(byte: u8) -> Result<Self> {
        Ok(match byte {
            0x01 => MsgType::InfoInd,
            0x10 => MsgType::ActReq,
            0x11 => MsgType::ActAck,
            0x12 => MsgType::ActNack,
            0x20 => MsgType::DataReq,
            0x21 => MsgType::DataInd,
            0x22 => MsgType::DataCnf,
            0x30 => MsgType::RachInd,
            0x40 => MsgType::PagReq,
            0x50 => MsgType::TxtInd,
            0x60 => MsgType::Container,
            0x70 => MsgType::TimeInd,
            0x71 => MsgType::InterfInd,
            0x80 => MsgType::SuspReq,
            0x90 => MsgType::AppInfoReq,
            other => {
                return Err(Error::ProtocolDecode(format!(
                    "unknown PCU_IF message type 0x{other:02x}"
                )))
            }
        })
    }
}

/// Fixed 4-byte header carried by every primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MsgType,
    pub bts_nr: u8,
}

impl Header {
    #[must_use]
    pub fn encode(self) -> [u8; HEADER_LEN] {
        [self.msg_type.wire_value(), self.bts_nr, 0, 0]
    }

    /// # Errors
    /// Returns [`Error::ProtocolDecode`] if `bytes` is shorter than
    /// [`HEADER_LEN`] or the message type byte is unrecognized.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::ProtocolDecode("PCU_IF header truncated".into()));
        }
        Ok(Self {
            msg_type: MsgType::from_wire(bytes[0])?,
            bts_nr: bytes[1],
        })
    }
}

/// `TXT-IND` version handshake payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionHandshake {
    pub version: u8,
}

impl VersionHandshake {
    /// Verify a peer-reported version against [`PCU_IF_VERSION`]
    /// (spec.md §4.7: "PCU_IF protocol version must match exactly;
    /// mismatch closes the link").
    ///
    /// # Errors
    /// Returns [`Error::PcuLinkLost`] on any version mismatch.
    pub fn verify(self) -> Result<()> {
        if self.version == PCU_IF_VERSION {
            Ok(())
        } else {
            Err(Error::PcuLinkLost(format!(
                "PCU_IF version mismatch: got {}, expected {PCU_IF_VERSION}",
                self.version
            )))
        }
    }
}

/// `CONTAINER` message: variable-length body with a 16-bit length
/// prefix (spec.md §4.7).
#[must_use]
pub fn encode_container(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 2 + body.len());
    out.extend_from_slice(&Header {
        msg_type: MsgType::Container,
        bts_nr: 0,
    }.encode());
    out.extend_from_slice(&(body.len() as u16).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Decode a `CONTAINER` message body, validating the 16-bit length
/// prefix against the remaining bytes.
///
/// # Errors
/// Returns [`Error::ProtocolDecode`] if the frame is shorter than the
/// header plus length prefix, or the declared length doesn't match.
pub fn decode_container(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < HEADER_LEN + 2 {
        return Err(Error::ProtocolDecode("CONTAINER frame truncated".into()));
    }
    let len = u16::from_be_bytes([frame[HEADER_LEN], frame[HEADER_LEN + 1]]) as usize;
    let body = &frame[HEADER_LEN + 2..];
    if body.len() != len {
        return Err(Error::ProtocolDecode(format!(
            "CONTAINER length mismatch: header says {len}, got {}",
            body.len()
        )));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let hdr = Header {
            msg_type: MsgType::RachInd,
            bts_nr: 3,
        };
        let bytes = hdr.encode();
        assert_eq!(Header::decode(&bytes).unwrap(), hdr);
    }

    #[test]
    fn version_mismatch_loses_link() {
        let hs = VersionHandshake { version: PCU_IF_VERSION.wrapping_add(1) };
        assert!(matches!(hs.verify(), Err(Error::PcuLinkLost(_))));
    }

    #[test]
    fn version_match_ok() {
        assert!(VersionHandshake { version: PCU_IF_VERSION }.verify().is_ok());
    }

    #[test]
    fn container_round_trip() {
        let frame = encode_container(b"hello");
        assert_eq!(decode_container(&frame).unwrap(), b"hello");
    }

    #[test]
    fn container_length_mismatch_rejected() {
        let mut frame = encode_container(b"hello");
        frame.truncate(frame.len() - 1);
        assert!(decode_container(&frame).is_err());
    }
}

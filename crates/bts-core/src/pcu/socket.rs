// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PCU SEQPACKET socket and bounded write queue (spec.md §4.7, §5).

use crate::config::{PCU_QUEUE_MAX_BYTES, PCU_SOCK_DEFAULT_PATH};
use crate::error::{Error, Result};
use socket2::{Domain, SockAddr, Socket, Type};
use std::collections::VecDeque;
use std::os::unix::net::UnixListener;
use std::path::Path;

/// Connection-level state of the PCU side channel (spec.md §4.7:
/// "On connect... On disconnect, all PDCH timeslots are deactivated").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcuLinkState {
    Disconnected,
    AwaitingInfoIndAck,
    Connected,
}

/// Bounded outbound byte queue for the PCU socket. Once a write would
/// push the queue past [`PCU_QUEUE_MAX_BYTES`], the connection is
/// considered lost rather than let unbounded memory growth mask a wedged
/// PCU (spec.md §5: "when the PCU queue reaches its maximum length, the
/// connection is closed").
#[derive(Debug, Default)]
pub struct PcuWriteQueue {
    frames: VecDeque<Vec<u8>>,
    queued_bytes: usize,
}

impl PcuWriteQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    /// Enqueue a frame for transmission.
    ///
    /// # Errors
    /// Returns [`Error::PcuLinkLost`] if the queue is already at or would
    /// exceed [`PCU_QUEUE_MAX_BYTES`]; the caller must treat this as a
    /// link failure and reconnect.
    pub fn push(&mut self, frame: Vec<u8>) -> Result<()> {
        if self.queued_bytes + frame.len() > PCU_QUEUE_MAX_BYTES {
            crate::error!("PCU write queue overflow, treating link as lost");
            return Err(Error::PcuLinkLost("write queue overflow".into()));
        }
        self.queued_bytes += frame.len();
        self.frames.push_back(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Vec<u8>> {
        let frame = self.frames.pop_front()?;
        self.queued_bytes -= frame.len();
        Some(frame)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Bind the PCU UNIX SEQPACKET listening socket at `path` (the BTS is
/// the server side; the PCU process connects to it).
///
/// # Errors
/// Returns [`Error::Io`] if the bind fails (e.g. stale socket file,
/// permission denied).
pub fn bind_pcu_socket(path: &Path) -> Result<Socket> {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
    let socket = Socket::new(Domain::UNIX, Type::SEQPACKET, None)?;
    let addr = SockAddr::unix(path)?;
    socket.bind(&addr)?;
    socket.listen(1)?;
    crate::info!("PCU socket bound at {}", path.display());
    Ok(socket)
}

/// Bind using the default path (spec.md §4.7, [`PCU_SOCK_DEFAULT_PATH`]).
///
/// # Errors
/// See [`bind_pcu_socket`].
pub fn bind_default() -> Result<Socket> {
    bind_pcu_socket(Path::new(PCU_SOCK_DEFAULT_PATH))
}

/// Re-exported so callers that prefer the std listener type (e.g. to
/// integrate with an existing `mio`/epoll registration) can convert one.
#[must_use]
pub fn into_std_listener(socket: Socket) -> UnixListener {
    socket.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_rejects_once_over_budget() {
        let mut q = PcuWriteQueue::new();
        let big = vec![0u8; PCU_QUEUE_MAX_BYTES];
        assert!(q.push(big).is_ok());
        assert!(q.push(vec![1u8]).is_err());
    }

    #[test]
    fn pop_frees_budget() {
        let mut q = PcuWriteQueue::new();
        q.push(vec![1, 2, 3]).unwrap();
        assert_eq!(q.queued_bytes(), 3);
        q.pop();
        assert_eq!(q.queued_bytes(), 0);
        assert!(q.is_empty());
    }
}

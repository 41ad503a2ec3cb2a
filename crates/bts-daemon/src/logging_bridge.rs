// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forwards `bts_core`'s macro-based logger into the `tracing` subscriber
//! installed by this binary, so both logging paths share one sink.

use bts_core::logging::{LogLevel, Output};
use std::io;

pub struct TracingOutput;

impl Output for TracingOutput {
    fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
        match level {
            LogLevel::Trace => tracing::trace!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Map the CLI's `--log-level` string onto `bts_core`'s level enum, the
/// same way `init_tracing` maps it onto `tracing::Level`.
#[must_use]
pub fn level_from_str(log_level: &str) -> LogLevel {
    match log_level {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "warn" => LogLevel::Warning,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

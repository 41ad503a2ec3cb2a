// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! BTS daemon configuration: identity, A-bis remote endpoints, PCU socket
//! path and VTY port (spec.md §6: "flags to select config file path,
//! identity override and daemonize").

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;

/// On-disk / CLI-overridable daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// ip.access unit-id: (site_id, bts_id), identifying this BTS to the BSC.
    #[serde(default = "default_site_id")]
    pub site_id: u16,
    #[serde(default = "default_unit_id")]
    pub unit_id: u16,

    /// BSC address the OML/RSL A-bis links dial out to.
    #[serde(default = "default_bsc_host")]
    pub bsc_oml_host: IpAddr,
    #[serde(default = "default_oml_port")]
    pub oml_port: u16,
    #[serde(default = "default_rsl_port")]
    pub rsl_port: u16,

    /// UNIX SEQPACKET path the PCU process connects to.
    #[serde(default = "default_pcu_path")]
    pub pcu_socket_path: String,

    /// TCP port the runtime-inspection VTY listens on.
    #[serde(default = "default_vty_port")]
    pub vty_port: u16,
}

fn default_site_id() -> u16 {
    1
}
fn default_unit_id() -> u16 {
    0
}
fn default_bsc_host() -> IpAddr {
    "127.0.0.1".parse().unwrap()
}
fn default_oml_port() -> u16 {
    3002
}
fn default_rsl_port() -> u16 {
    3003
}
fn default_pcu_path() -> String {
    bts_core::config::PCU_SOCK_DEFAULT_PATH.to_string()
}
fn default_vty_port() -> u16 {
    4241
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            unit_id: default_unit_id(),
            bsc_oml_host: default_bsc_host(),
            oml_port: default_oml_port(),
            rsl_port: default_rsl_port(),
            pcu_socket_path: default_pcu_path(),
            vty_port: default_vty_port(),
        }
    }
}

impl DaemonConfig {
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file can't be read, or
    /// [`ConfigError::Parse`] if it isn't valid JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if any port is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oml_port == 0 || self.rsl_port == 0 || self.vty_port == 0 {
            return Err(ConfigError::InvalidValue("port cannot be 0".into()));
        }
        Ok(())
    }
}

/// Configuration load/validation error (spec.md §6: exit code 2).
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::InvalidValue(s) => write!(f, "invalid config value: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DaemonConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_port_rejected() {
        let config = DaemonConfig {
            vty_port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = DaemonConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DaemonConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.oml_port, parsed.oml_port);
    }
}

// Wifi Heartbeat - Watchdog Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Watchdog configuration model.
//!
//! The configuration is read once at process start (TOML file, then
//! environment/command line overrides) and handed to the services as an
//! immutable value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{Error, Result};
use super::network::is_same_network;
use super::CONFIG_DIR_NAME;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wifi-heartbeat/config.toml";

/// The network the device is supposed to be on.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DesiredNetwork {
    /// SSID, also used as the saved profile name.
    #[serde(default)]
    pub name: String,

    /// Pre-shared key. Empty for open networks.
    #[serde(default)]
    pub secret: String,
}

impl DesiredNetwork {
    #[cfg(test)]
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Whether a target network has been configured at all.
    pub fn is_configured(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Whether the association or profile `name` is this network, counting
    /// NetworkManager's numbered duplicates.
    pub fn is_same_network(&self, name: &str) -> bool {
        is_same_network(name, &self.name)
    }
}

impl fmt::Debug for DesiredNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredNetwork")
            .field("name", &self.name)
            .field("secret", &if self.has_secret() { "<redacted>" } else { "" })
            .finish()
    }
}

/// Per-call bounds for external commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Bound for plain queries and quick actions.
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,

    /// How long NetworkManager may wait for an activation to complete.
    #[serde(default = "default_connect_wait_secs")]
    pub connect_wait_secs: u64,

    /// Reply deadline handed to a single reachability probe.
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,

    /// Extra time allowed for the probe process on top of its reply deadline.
    #[serde(default = "default_probe_grace_secs")]
    pub probe_grace_secs: u64,
}

impl Timeouts {
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    pub fn connect_wait(&self) -> Duration {
        Duration::from_secs(self.connect_wait_secs)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    /// Upper bound for a command that itself waits `wait` for activation.
    pub fn for_activation(&self, wait: Duration) -> Duration {
        wait + self.command()
    }

    /// Upper bound for the probe process.
    pub fn for_probe(&self, reply: Duration) -> Duration {
        reply + Duration::from_secs(self.probe_grace_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: default_command_secs(),
            connect_wait_secs: default_connect_wait_secs(),
            probe_secs: default_probe_secs(),
            probe_grace_secs: default_probe_grace_secs(),
        }
    }
}

/// Pauses between escalation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delays {
    /// Settle time after a credentialed (re)connect.
    #[serde(default = "default_settle_after_credentials_secs")]
    pub settle_after_credentials_secs: u64,

    /// Settle time after bringing a saved profile up.
    #[serde(default = "default_settle_after_profile_secs")]
    pub settle_after_profile_secs: u64,

    /// Pause between the forced disconnect and reconnect of a hard reset.
    #[serde(default = "default_reset_disconnect_secs")]
    pub reset_disconnect_secs: u64,

    /// Pause after the forced reconnect before re-checking connectivity.
    #[serde(default = "default_reset_reconnect_secs")]
    pub reset_reconnect_secs: u64,
}

impl Delays {
    /// No pauses at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            settle_after_credentials_secs: 0,
            settle_after_profile_secs: 0,
            reset_disconnect_secs: 0,
            reset_reconnect_secs: 0,
        }
    }

    pub fn settle_after_credentials(&self) -> Duration {
        Duration::from_secs(self.settle_after_credentials_secs)
    }

    pub fn settle_after_profile(&self) -> Duration {
        Duration::from_secs(self.settle_after_profile_secs)
    }

    pub fn reset_disconnect(&self) -> Duration {
        Duration::from_secs(self.reset_disconnect_secs)
    }

    pub fn reset_reconnect(&self) -> Duration {
        Duration::from_secs(self.reset_reconnect_secs)
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            settle_after_credentials_secs: default_settle_after_credentials_secs(),
            settle_after_profile_secs: default_settle_after_profile_secs(),
            reset_disconnect_secs: default_reset_disconnect_secs(),
            reset_reconnect_secs: default_reset_reconnect_secs(),
        }
    }
}

/// Watchdog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Network the device must be associated with.
    #[serde(default)]
    pub desired_network: DesiredNetwork,

    /// Probe targets tried after the gateway and any extra targets.
    #[serde(default = "default_fallback_targets")]
    pub fallback_targets: Vec<String>,

    /// Site-specific probe targets tried right after the gateway.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_targets: Vec<String>,

    /// Auto-connect priority given to the desired profile.
    #[serde(default = "default_preferred_priority")]
    pub preferred_priority: i32,

    /// Ask for a fresh scan before walking saved profiles.
    #[serde(default = "default_true")]
    pub rescan_before_fallback: bool,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub delays: Delays,
}

fn default_fallback_targets() -> Vec<String> {
    vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()]
}

fn default_preferred_priority() -> i32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_command_secs() -> u64 {
    8
}

fn default_connect_wait_secs() -> u64 {
    15
}

fn default_probe_secs() -> u64 {
    1
}

fn default_probe_grace_secs() -> u64 {
    2
}

fn default_settle_after_credentials_secs() -> u64 {
    5
}

fn default_settle_after_profile_secs() -> u64 {
    2
}

fn default_reset_disconnect_secs() -> u64 {
    2
}

fn default_reset_reconnect_secs() -> u64 {
    3
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            desired_network: DesiredNetwork::default(),
            fallback_targets: default_fallback_targets(),
            extra_targets: Vec::new(),
            preferred_priority: default_preferred_priority(),
            rescan_before_fallback: true,
            timeouts: Timeouts::default(),
            delays: Delays::default(),
        }
    }
}

/// Values supplied through the environment or the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ssid: Option<String>,
    pub secret: Option<String>,
    pub fallback_targets: Option<Vec<String>>,
}

impl WatchdogConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigReadFailed(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find the configuration file to use, if any.
    ///
    /// An explicit path always wins. Otherwise the system file is preferred
    /// over the per-user one.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return Some(system);
        }

        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Load the configuration file (or defaults), apply overrides and validate.
    pub fn resolve(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match Self::locate(explicit) {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment/command line values on top of the file values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(ssid) = overrides.ssid {
            self.desired_network.name = ssid;
        }
        if let Some(secret) = overrides.secret {
            self.desired_network.secret = secret;
        }
        if let Some(targets) = overrides.fallback_targets {
            self.fallback_targets = targets;
        }
    }

    /// Reject configurations the watchdog cannot act on.
    pub fn validate(&self) -> Result<()> {
        if !self.desired_network.is_configured() && self.desired_network.has_secret() {
            return Err(Error::InvalidConfig(
                "a network secret is configured without a network name".to_string(),
            ));
        }

        for target in self.extra_targets.iter().chain(&self.fallback_targets) {
            if target.is_empty() || target.chars().any(char::is_whitespace) {
                return Err(Error::InvalidConfig(format!(
                    "invalid probe target '{}'",
                    target
                )));
            }
        }

        Ok(())
    }
}

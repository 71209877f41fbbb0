// Wifi Heartbeat - Network State Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Typed view of the network state the watchdog observes.
//!
//! These are produced by the backend decoders; the orchestrator never sees
//! raw tool output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The wireless device under management.
///
/// Resolved once per run and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface(String);

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Kernel name of the device (e.g. "wlan0").
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link state of the interface as reported by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

impl LinkState {
    /// Map a NetworkManager device state string onto a link state.
    ///
    /// "connected (externally)" still counts as connected; the transitional
    /// states ("connecting (...)", "deactivating") and "unavailable" count as
    /// disconnected since nothing usable is associated.
    pub fn from_nm_state(state: &str) -> Self {
        let state = state.trim();
        if state.starts_with("connected") {
            Self::Connected
        } else if state.starts_with("disconnected")
            || state.starts_with("connecting")
            || state.starts_with("deactivating")
            || state == "unavailable"
            || state == "failed"
        {
            Self::Disconnected
        } else {
            Self::Unknown
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of device reported by the connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Wifi,
    Ethernet,
    Loopback,
    Other(String),
}

impl DeviceType {
    pub fn from_nm_type(kind: &str) -> Self {
        match kind.trim() {
            "wifi" => Self::Wifi,
            "ethernet" => Self::Ethernet,
            "loopback" => Self::Loopback,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One row of the device table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub device: String,
    pub device_type: DeviceType,
    pub state: LinkState,
}

impl DeviceStatus {
    pub fn is_wireless(&self) -> bool {
        self.device_type == DeviceType::Wifi
    }
}

/// An active connection and the device it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConnection {
    pub name: String,
    pub device: String,
}

/// Kind of a saved connection profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Wireless,
    Other(String),
}

impl ProfileKind {
    pub fn from_nm_type(kind: &str) -> Self {
        match kind.trim() {
            "802-11-wireless" | "wifi" => Self::Wireless,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A saved connection profile together with its auto-connect settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProfile {
    /// Profile name (NetworkManager connection id).
    pub name: String,
    pub kind: ProfileKind,
    pub autoconnect: bool,
    pub priority: i32,
}

/// Whether a profile or association called `name` belongs to the network `desired`.
///
/// NetworkManager names duplicate profiles "<name> 1", "<name> 2", ... so
/// those count as the same network.
pub fn is_same_network(name: &str, desired: &str) -> bool {
    if desired.is_empty() {
        return false;
    }
    if name == desired {
        return true;
    }
    name.strip_prefix(desired)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

impl SavedProfile {
    #[cfg(test)]
    pub fn wireless(name: impl Into<String>, autoconnect: bool, priority: i32) -> Self {
        Self {
            name: name.into(),
            kind: ProfileKind::Wireless,
            autoconnect,
            priority,
        }
    }

    pub fn is_wireless(&self) -> bool {
        self.kind == ProfileKind::Wireless
    }

    /// Whether this profile belongs to the network called `desired`.
    pub fn matches_network(&self, desired: &str) -> bool {
        is_same_network(&self.name, desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state_from_nm_state() {
        assert_eq!(LinkState::from_nm_state("connected"), LinkState::Connected);
        assert_eq!(LinkState::from_nm_state("connected (externally)"), LinkState::Connected);
        assert_eq!(LinkState::from_nm_state("disconnected"), LinkState::Disconnected);
        assert_eq!(
            LinkState::from_nm_state("connecting (getting IP configuration)"),
            LinkState::Disconnected
        );
        assert_eq!(LinkState::from_nm_state("unavailable"), LinkState::Disconnected);
        assert_eq!(LinkState::from_nm_state("unmanaged"), LinkState::Unknown);
        assert_eq!(LinkState::from_nm_state(""), LinkState::Unknown);
    }

    #[test]
    fn test_profile_matches_network() {
        assert!(SavedProfile::wireless("Office", true, 0).matches_network("Office"));
        assert!(SavedProfile::wireless("Office 1", true, 0).matches_network("Office"));
        assert!(SavedProfile::wireless("Office 12", true, 0).matches_network("Office"));
        assert!(!SavedProfile::wireless("Office Guest", true, 0).matches_network("Office"));
        assert!(!SavedProfile::wireless("Office2", true, 0).matches_network("Office"));
        assert!(!SavedProfile::wireless("Office ", true, 0).matches_network("Office"));
        assert!(!SavedProfile::wireless("Office", true, 0).matches_network(""));
    }

    #[test]
    fn test_profile_kind() {
        assert_eq!(ProfileKind::from_nm_type("802-11-wireless"), ProfileKind::Wireless);
        assert_eq!(
            ProfileKind::from_nm_type("802-3-ethernet"),
            ProfileKind::Other("802-3-ethernet".to_string())
        );
    }
}

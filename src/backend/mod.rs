// Wifi Heartbeat - Collaborator Backends
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Interfaces to the host's network stack.
//!
//! The services only talk to these traits:
//! - [`StateReader`]: interface identity, link state, active network, gateway
//! - [`NetworkController`]: corrective commands and saved-profile management
//! - [`Prober`]: single bounded reachability checks
//!
//! Query methods return `Result` so the failure reason is available for
//! logging. The provided wrappers degrade failures into negative observations
//! (`None`, [`LinkState::Unknown`], a failed [`ConnectReport`]) and never
//! propagate them.

pub mod command;
pub mod nmcli;
pub mod ping;
pub mod route;

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    ActiveConnection, DesiredNetwork, DeviceStatus, Error, Interface, LinkState, Result,
    SavedProfile,
};

pub use nmcli::NmcliBackend;
pub use ping::PingProber;

/// Read-only view of the current network state.
#[async_trait]
pub trait StateReader: Send + Sync {
    /// All devices known to the connection manager, in its listing order.
    async fn list_devices(&self) -> Result<Vec<DeviceStatus>>;

    /// Currently active connections.
    async fn active_connections(&self) -> Result<Vec<ActiveConnection>>;

    /// Gateway of the first default route, if any.
    async fn query_default_gateway(&self) -> Result<Option<IpAddr>>;

    /// First device reporting wireless capability.
    async fn find_wireless_interface(&self) -> Option<Interface> {
        match self.list_devices().await {
            Ok(devices) => devices
                .into_iter()
                .find(DeviceStatus::is_wireless)
                .map(|d| Interface::new(d.device)),
            Err(e) => {
                warn!("Device listing failed: {}", e);
                None
            }
        }
    }

    /// Link state of `iface`; `Unknown` when the query fails.
    async fn link_state_of(&self, iface: &Interface) -> LinkState {
        match self.list_devices().await {
            Ok(devices) => devices
                .into_iter()
                .find(|d| d.device == iface.name())
                .map(|d| d.state)
                .unwrap_or(LinkState::Unknown),
            Err(e) => {
                warn!("Link state query for {} failed: {}", iface, e);
                LinkState::Unknown
            }
        }
    }

    /// Name of the network currently associated on `iface`.
    ///
    /// `None` both when nothing is associated and when the query failed.
    async fn active_network_identity(&self, iface: &Interface) -> Option<String> {
        match self.active_connections().await {
            Ok(active) => active
                .into_iter()
                .find(|c| c.device == iface.name())
                .map(|c| c.name)
                .filter(|name| !name.is_empty()),
            Err(e) => {
                warn!("Active connection query failed: {}", e);
                None
            }
        }
    }

    /// Current default gateway; `None` if absent or unreadable.
    async fn default_gateway(&self) -> Option<IpAddr> {
        match self.query_default_gateway().await {
            Ok(gateway) => gateway,
            Err(e) => {
                debug!("Default gateway lookup failed: {}", e);
                None
            }
        }
    }
}

/// How a credentialed connect finally succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMethod {
    /// Plain connect-with-secret.
    Direct,
    /// Stale profile removed, fresh profile created and brought up.
    FreshProfile,
}

/// Outcome of [`NetworkController::connect_with_credentials`].
#[derive(Debug, Default)]
pub struct ConnectReport {
    /// Set when the network is up.
    pub method: Option<ConnectMethod>,
    /// Failures of the sub-stages, in the order they happened.
    pub failures: Vec<Error>,
}

impl ConnectReport {
    pub fn is_connected(&self) -> bool {
        self.method.is_some()
    }

    /// Failure of the last sub-stage, the one that decided the result.
    pub fn last_failure(&self) -> Option<&Error> {
        self.failures.last()
    }
}

/// Corrective actions on the network stack.
#[async_trait]
pub trait NetworkController: Send + Sync {
    /// Switch the wireless radio on.
    async fn enable_radio(&self) -> Result<()>;

    /// Activate a saved profile, waiting up to `wait` for it to come up.
    async fn bring_profile_up(&self, name: &str, wait: Duration) -> Result<()>;

    /// Device-level disconnect of `iface`.
    async fn disconnect_interface(&self, iface: &Interface) -> Result<()>;

    /// Device-level connect of `iface`, letting the manager pick a profile.
    async fn reconnect_interface_automatically(&self, iface: &Interface) -> Result<()>;

    /// Ask for a fresh scan of visible networks.
    async fn rescan(&self, iface: &Interface) -> Result<()>;

    /// Connect to `network` by SSID and secret in one step.
    async fn connect_direct(
        &self,
        iface: &Interface,
        network: &DesiredNetwork,
        wait: Duration,
    ) -> Result<()>;

    /// Create a wireless profile named after the SSID, bound to `iface`.
    async fn create_profile(&self, iface: &Interface, network: &DesiredNetwork) -> Result<()>;

    /// Set key management and pre-shared key on a saved profile.
    async fn set_profile_security(&self, name: &str, secret: &str) -> Result<()>;

    async fn list_saved_profiles(&self) -> Result<Vec<SavedProfile>>;

    async fn set_profile_autoconnect(
        &self,
        name: &str,
        enabled: bool,
        priority: Option<i32>,
    ) -> Result<()>;

    async fn delete_profile(&self, name: &str) -> Result<()>;

    /// Two-stage connect to `network`.
    ///
    /// First a plain connect-with-secret. If that fails, any stale profile
    /// of the same name is deleted, a fresh one is created on `iface`, its
    /// security is set explicitly, and it is brought up. Every sub-stage
    /// failure is kept in the report; only the second stage decides the
    /// result.
    async fn connect_with_credentials(
        &self,
        iface: &Interface,
        network: &DesiredNetwork,
        wait: Duration,
    ) -> ConnectReport {
        let mut report = ConnectReport::default();

        match self.connect_direct(iface, network, wait).await {
            Ok(()) => {
                report.method = Some(ConnectMethod::Direct);
                return report;
            }
            Err(e) => {
                debug!("Direct connect to '{}' failed: {}", network.name, e);
                report.failures.push(e);
            }
        }

        // A missing profile is the normal case here
        if let Err(e) = self.delete_profile(&network.name).await {
            debug!("No stale profile '{}' removed: {}", network.name, e);
        }

        if let Err(e) = self.create_profile(iface, network).await {
            report.failures.push(e);
            return report;
        }

        if network.has_secret() {
            if let Err(e) = self.set_profile_security(&network.name, &network.secret).await {
                report.failures.push(e);
                return report;
            }
        }

        match self.bring_profile_up(&network.name, wait).await {
            Ok(()) => report.method = Some(ConnectMethod::FreshProfile),
            Err(e) => report.failures.push(e),
        }

        report
    }
}

/// Single bounded reachability check.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Send one probe to `target` through `iface`.
    ///
    /// True only on a reply within `timeout`. Timeouts and transport errors
    /// are plain `false`.
    async fn probe(&self, iface: &Interface, target: &str, timeout: Duration) -> bool;
}

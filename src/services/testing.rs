// Wifi Heartbeat - Test Network
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Scripted in-memory network used by the service tests.
//!
//! Implements all three collaborator traits, keeps just enough state to
//! react to corrective actions, and records every call in order.

use async_trait::async_trait;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::{NetworkController, Prober, StateReader};
use crate::models::{
    ActiveConnection, DesiredNetwork, DeviceStatus, DeviceType, Error, Interface, LinkState,
    Result, SavedProfile,
};

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListDevices,
    ActiveConnections,
    Gateway,
    EnableRadio,
    BringUp(String),
    Disconnect(String),
    Reconnect(String),
    Rescan(String),
    ConnectDirect(String),
    CreateProfile(String),
    SetSecurity(String),
    ListProfiles,
    SetAutoconnect(String, bool, Option<i32>),
    Delete(String),
    Probe(String),
}

impl Call {
    /// Calls that change association or device state.
    pub fn is_disruptive(&self) -> bool {
        matches!(
            self,
            Call::Disconnect(_)
                | Call::Reconnect(_)
                | Call::BringUp(_)
                | Call::ConnectDirect(_)
                | Call::Delete(_)
        )
    }
}

#[derive(Default)]
struct State {
    devices: Vec<DeviceStatus>,
    fail_devices: bool,
    active: Vec<ActiveConnection>,
    gateway: Option<IpAddr>,
    profiles: Vec<SavedProfile>,
    fail_profiles: bool,
    reachable: HashSet<String>,
    direct_connect_ok: bool,
    create_ok: bool,
    up_ok: HashSet<String>,
    online_after_connect: Vec<String>,
    online_after_reset: Vec<String>,
    /// Targets that are reachable only while a network is associated.
    via_association: Vec<String>,
    calls: Vec<(Call, Duration)>,
}

/// In-memory network for tests.
pub struct FakeNetwork {
    state: Mutex<State>,
    created: Instant,
}

impl FakeNetwork {
    pub fn new() -> Self {
        let net = Self {
            state: Mutex::new(State::default()),
            created: Instant::now(),
        };
        net.lock().create_ok = true;
        net
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: Call) {
        let at = self.created.elapsed();
        self.lock().calls.push((call, at));
    }

    // ---- scenario setup ----

    pub fn wifi(self, device: &str, state: LinkState) -> Self {
        self.lock().devices.push(DeviceStatus {
            device: device.to_string(),
            device_type: DeviceType::Wifi,
            state,
        });
        self
    }

    pub fn ethernet(self, device: &str) -> Self {
        self.lock().devices.push(DeviceStatus {
            device: device.to_string(),
            device_type: DeviceType::Ethernet,
            state: LinkState::Connected,
        });
        self
    }

    pub fn fail_device_listing(self) -> Self {
        self.lock().fail_devices = true;
        self
    }

    pub fn active(self, name: &str, device: &str) -> Self {
        self.lock().active.push(ActiveConnection {
            name: name.to_string(),
            device: device.to_string(),
        });
        self
    }

    pub fn gateway(self, gateway: &str) -> Self {
        self.lock().gateway = gateway.parse().ok();
        self
    }

    pub fn profile(self, profile: SavedProfile) -> Self {
        self.lock().profiles.push(profile);
        self
    }

    pub fn fail_profile_listing(self) -> Self {
        self.lock().fail_profiles = true;
        self
    }

    pub fn reachable(self, target: &str) -> Self {
        self.lock().reachable.insert(target.to_string());
        self
    }

    /// The one-step connect-with-secret succeeds.
    pub fn direct_connect_ok(self) -> Self {
        self.lock().direct_connect_ok = true;
        self
    }

    /// Creating a fresh profile fails.
    pub fn create_fails(self) -> Self {
        self.lock().create_ok = false;
        self
    }

    /// Bringing up the profile called `name` succeeds.
    pub fn up_ok(self, name: &str) -> Self {
        self.lock().up_ok.insert(name.to_string());
        self
    }

    /// Targets that become reachable once any connect succeeds, until the
    /// interface is disconnected again.
    pub fn online_after_connect(self, targets: &[&str]) -> Self {
        self.lock().online_after_connect = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Targets that become reachable after a device-level reconnect.
    pub fn online_after_reset(self, targets: &[&str]) -> Self {
        self.lock().online_after_reset = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    // ---- inspection ----

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|(c, _)| pred(c)).count()
    }

    /// Position of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.lock().calls.iter().position(|(c, _)| pred(c))
    }

    /// Time since construction at which the first call matching `pred` was made.
    pub fn time_of(&self, pred: impl Fn(&Call) -> bool) -> Option<Duration> {
        self.lock()
            .calls
            .iter()
            .find(|(c, _)| pred(c))
            .map(|(_, at)| *at)
    }

    pub fn probes(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|(c, _)| match c {
                Call::Probe(target) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn saved_profiles(&self) -> Vec<SavedProfile> {
        self.lock().profiles.clone()
    }

    // ---- state transitions ----

    fn associate(state: &mut State, name: &str, device: &str) {
        state.active.retain(|c| c.device != device);
        state.active.push(ActiveConnection {
            name: name.to_string(),
            device: device.to_string(),
        });
        for d in state.devices.iter_mut().filter(|d| d.device == device) {
            d.state = LinkState::Connected;
        }
        let targets = std::mem::take(&mut state.online_after_connect);
        for target in targets {
            if state.reachable.insert(target.clone()) {
                state.via_association.push(target);
            }
        }
    }

    fn first_wifi(state: &State) -> String {
        state
            .devices
            .iter()
            .find(|d| d.is_wireless())
            .map(|d| d.device.clone())
            .unwrap_or_default()
    }
}

fn failed(command: &str) -> Error {
    Error::command_failed(command, "Error: scripted failure")
}

#[async_trait]
impl StateReader for FakeNetwork {
    async fn list_devices(&self) -> Result<Vec<DeviceStatus>> {
        self.record(Call::ListDevices);
        let state = self.lock();
        if state.fail_devices {
            return Err(failed("nmcli device status"));
        }
        Ok(state.devices.clone())
    }

    async fn active_connections(&self) -> Result<Vec<ActiveConnection>> {
        self.record(Call::ActiveConnections);
        Ok(self.lock().active.clone())
    }

    async fn query_default_gateway(&self) -> Result<Option<IpAddr>> {
        self.record(Call::Gateway);
        Ok(self.lock().gateway)
    }
}

#[async_trait]
impl NetworkController for FakeNetwork {
    async fn enable_radio(&self) -> Result<()> {
        self.record(Call::EnableRadio);
        Ok(())
    }

    async fn bring_profile_up(&self, name: &str, _wait: Duration) -> Result<()> {
        self.record(Call::BringUp(name.to_string()));
        let mut state = self.lock();
        if !state.up_ok.contains(name) {
            return Err(failed("nmcli connection up"));
        }
        let device = Self::first_wifi(&state);
        Self::associate(&mut state, name, &device);
        Ok(())
    }

    async fn disconnect_interface(&self, iface: &Interface) -> Result<()> {
        self.record(Call::Disconnect(iface.name().to_string()));
        let mut state = self.lock();
        state.active.retain(|c| c.device != iface.name());
        for d in state.devices.iter_mut().filter(|d| d.device == iface.name()) {
            d.state = LinkState::Disconnected;
        }
        for target in std::mem::take(&mut state.via_association) {
            state.reachable.remove(&target);
        }
        Ok(())
    }

    async fn reconnect_interface_automatically(&self, iface: &Interface) -> Result<()> {
        self.record(Call::Reconnect(iface.name().to_string()));
        let mut state = self.lock();
        let targets = std::mem::take(&mut state.online_after_reset);
        state.reachable.extend(targets);
        Ok(())
    }

    async fn rescan(&self, iface: &Interface) -> Result<()> {
        self.record(Call::Rescan(iface.name().to_string()));
        Ok(())
    }

    async fn connect_direct(
        &self,
        iface: &Interface,
        network: &DesiredNetwork,
        _wait: Duration,
    ) -> Result<()> {
        self.record(Call::ConnectDirect(network.name.clone()));
        let mut state = self.lock();
        if !state.direct_connect_ok {
            return Err(failed("nmcli device wifi connect"));
        }
        Self::associate(&mut state, &network.name, iface.name());
        Ok(())
    }

    async fn create_profile(&self, _iface: &Interface, network: &DesiredNetwork) -> Result<()> {
        self.record(Call::CreateProfile(network.name.clone()));
        let mut state = self.lock();
        if !state.create_ok {
            return Err(failed("nmcli connection add"));
        }
        state
            .profiles
            .push(SavedProfile::wireless(network.name.clone(), true, 0));
        Ok(())
    }

    async fn set_profile_security(&self, name: &str, _secret: &str) -> Result<()> {
        self.record(Call::SetSecurity(name.to_string()));
        Ok(())
    }

    async fn list_saved_profiles(&self) -> Result<Vec<SavedProfile>> {
        self.record(Call::ListProfiles);
        let state = self.lock();
        if state.fail_profiles {
            return Err(failed("nmcli connection show"));
        }
        Ok(state.profiles.clone())
    }

    async fn set_profile_autoconnect(
        &self,
        name: &str,
        enabled: bool,
        priority: Option<i32>,
    ) -> Result<()> {
        self.record(Call::SetAutoconnect(name.to_string(), enabled, priority));
        let mut state = self.lock();
        for p in state.profiles.iter_mut().filter(|p| p.name == name) {
            p.autoconnect = enabled;
            if let Some(priority) = priority {
                p.priority = priority;
            }
        }
        Ok(())
    }

    async fn delete_profile(&self, name: &str) -> Result<()> {
        self.record(Call::Delete(name.to_string()));
        let mut state = self.lock();
        let before = state.profiles.len();
        state.profiles.retain(|p| p.name != name);
        if state.profiles.len() == before {
            return Err(Error::ProfileNotFound(name.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Prober for FakeNetwork {
    async fn probe(&self, _iface: &Interface, target: &str, _timeout: Duration) -> bool {
        self.record(Call::Probe(target.to_string()));
        self.lock().reachable.contains(target)
    }
}

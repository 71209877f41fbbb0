// Wifi Heartbeat - NetworkManager Backend
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! NetworkManager backend driven through `nmcli`.
//!
//! All listings use terse mode (`-t`) and are decoded into the typed
//! network models right here, so nothing above this module handles raw
//! tool output.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use super::command::Cmd;
use super::{route, NetworkController, StateReader};
use crate::models::config::Timeouts;
use crate::models::network::ProfileKind;
use crate::models::{
    ActiveConnection, DesiredNetwork, DeviceStatus, DeviceType, Error, Interface, LinkState,
    Result, SavedProfile,
};

/// Key management used for profiles created with a secret.
const KEY_MGMT_PSK: &str = "wpa-psk";

/// NetworkManager state reader and controller.
#[derive(Debug, Clone)]
pub struct NmcliBackend {
    timeouts: Timeouts,
}

impl NmcliBackend {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    fn nmcli() -> Cmd {
        Cmd::new("nmcli")
    }

    /// `nmcli -w <secs>`, for commands that wait on an activation.
    fn nmcli_waiting(wait: Duration) -> Cmd {
        Cmd::new("nmcli").args(["-w".to_string(), wait.as_secs().max(1).to_string()])
    }

    async fn run(&self, cmd: Cmd) -> Result<String> {
        cmd.run(self.timeouts.command()).await
    }

    async fn run_waiting(&self, cmd: Cmd, wait: Duration) -> Result<String> {
        cmd.run(self.timeouts.for_activation(wait)).await
    }
}

#[async_trait]
impl StateReader for NmcliBackend {
    async fn list_devices(&self) -> Result<Vec<DeviceStatus>> {
        let out = self
            .run(Self::nmcli().args(["-t", "-f", "DEVICE,TYPE,STATE", "device", "status"]))
            .await?;
        parse_device_status(&out)
    }

    async fn active_connections(&self) -> Result<Vec<ActiveConnection>> {
        let out = self
            .run(Self::nmcli().args([
                "-t",
                "-f",
                "NAME,DEVICE",
                "connection",
                "show",
                "--active",
            ]))
            .await?;
        parse_active_connections(&out)
    }

    async fn query_default_gateway(&self) -> Result<Option<IpAddr>> {
        route::default_gateway(self.timeouts.command()).await
    }
}

#[async_trait]
impl NetworkController for NmcliBackend {
    async fn enable_radio(&self) -> Result<()> {
        self.run(Self::nmcli().args(["radio", "wifi", "on"])).await?;
        Ok(())
    }

    async fn bring_profile_up(&self, name: &str, wait: Duration) -> Result<()> {
        let cmd = Self::nmcli_waiting(wait).args(["connection", "up", "id", name]);
        self.run_waiting(cmd, wait).await?;
        Ok(())
    }

    async fn disconnect_interface(&self, iface: &Interface) -> Result<()> {
        self.run(Self::nmcli().args(["device", "disconnect", iface.name()]))
            .await?;
        Ok(())
    }

    async fn reconnect_interface_automatically(&self, iface: &Interface) -> Result<()> {
        let wait = self.timeouts.connect_wait();
        let cmd = Self::nmcli_waiting(wait).args(["device", "connect", iface.name()]);
        self.run_waiting(cmd, wait).await?;
        Ok(())
    }

    async fn rescan(&self, iface: &Interface) -> Result<()> {
        self.run(Self::nmcli().args(["device", "wifi", "rescan", "ifname", iface.name()]))
            .await?;
        Ok(())
    }

    async fn connect_direct(
        &self,
        iface: &Interface,
        network: &DesiredNetwork,
        wait: Duration,
    ) -> Result<()> {
        let mut cmd =
            Self::nmcli_waiting(wait).args(["device", "wifi", "connect", network.name.as_str()]);
        if network.has_secret() {
            cmd = cmd.arg("password").secret_arg(network.secret.as_str());
        }
        cmd = cmd.args(["ifname", iface.name()]);
        self.run_waiting(cmd, wait).await?;
        Ok(())
    }

    async fn create_profile(&self, iface: &Interface, network: &DesiredNetwork) -> Result<()> {
        self.run(Self::nmcli().args([
            "connection",
            "add",
            "type",
            "wifi",
            "ifname",
            iface.name(),
            "con-name",
            network.name.as_str(),
            "ssid",
            network.name.as_str(),
        ]))
        .await?;
        Ok(())
    }

    async fn set_profile_security(&self, name: &str, secret: &str) -> Result<()> {
        let cmd = Self::nmcli()
            .args([
                "connection",
                "modify",
                "id",
                name,
                "wifi-sec.key-mgmt",
                KEY_MGMT_PSK,
                "wifi-sec.psk",
            ])
            .secret_arg(secret);
        self.run(cmd).await?;
        Ok(())
    }

    async fn list_saved_profiles(&self) -> Result<Vec<SavedProfile>> {
        let out = self
            .run(Self::nmcli().args([
                "-t",
                "-f",
                "NAME,TYPE,AUTOCONNECT,AUTOCONNECT-PRIORITY",
                "connection",
                "show",
            ]))
            .await?;
        parse_saved_profiles(&out)
    }

    async fn set_profile_autoconnect(
        &self,
        name: &str,
        enabled: bool,
        priority: Option<i32>,
    ) -> Result<()> {
        let mut cmd = Self::nmcli().args([
            "connection",
            "modify",
            "id",
            name,
            "connection.autoconnect",
            if enabled { "yes" } else { "no" },
        ]);
        if let Some(priority) = priority {
            cmd = cmd.args(["connection.autoconnect-priority".to_string(), priority.to_string()]);
        }
        self.run(cmd).await?;
        Ok(())
    }

    async fn delete_profile(&self, name: &str) -> Result<()> {
        match self
            .run(Self::nmcli().args(["connection", "delete", "id", name]))
            .await
        {
            Ok(_) => Ok(()),
            // "Error: unknown connection '<name>'."
            Err(Error::CommandFailed { reason, .. }) if reason.contains("unknown connection") => {
                debug!("Profile '{}' does not exist", name);
                Err(Error::ProfileNotFound(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Split one line of `nmcli -t` output into its fields.
///
/// Terse mode separates fields with `:` and escapes literal `:` and `\`
/// inside values with a backslash.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn expect_fields<'a>(
    source: &str,
    line: &str,
    fields: &'a [String],
    n: usize,
) -> Result<&'a [String]> {
    if fields.len() < n {
        return Err(Error::parse(
            source,
            format!("expected {} fields, got {}: '{}'", n, fields.len(), line),
        ));
    }
    Ok(&fields[..n])
}

/// Decode `nmcli -t -f DEVICE,TYPE,STATE device status`.
pub fn parse_device_status(out: &str) -> Result<Vec<DeviceStatus>> {
    let mut devices = Vec::new();
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        let fields = split_terse(line);
        let fields = expect_fields("nmcli device status", line, &fields, 3)?;
        devices.push(DeviceStatus {
            device: fields[0].clone(),
            device_type: DeviceType::from_nm_type(&fields[1]),
            state: LinkState::from_nm_state(&fields[2]),
        });
    }
    Ok(devices)
}

/// Decode `nmcli -t -f NAME,DEVICE connection show --active`.
pub fn parse_active_connections(out: &str) -> Result<Vec<ActiveConnection>> {
    let mut active = Vec::new();
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        let fields = split_terse(line);
        let fields = expect_fields("nmcli connection show --active", line, &fields, 2)?;
        active.push(ActiveConnection {
            name: fields[0].clone(),
            device: fields[1].clone(),
        });
    }
    Ok(active)
}

/// Decode `nmcli -t -f NAME,TYPE,AUTOCONNECT,AUTOCONNECT-PRIORITY connection show`.
pub fn parse_saved_profiles(out: &str) -> Result<Vec<SavedProfile>> {
    let mut profiles = Vec::new();
    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        let fields = split_terse(line);
        let fields = expect_fields("nmcli connection show", line, &fields, 4)?;

        let autoconnect = match fields[2].as_str() {
            "yes" => true,
            "no" => false,
            other => {
                return Err(Error::parse(
                    "nmcli connection show",
                    format!("bad autoconnect value '{}'", other),
                ))
            }
        };
        let priority = fields[3].trim().parse().map_err(|_| {
            Error::parse(
                "nmcli connection show",
                format!("bad autoconnect priority '{}'", fields[3]),
            )
        })?;

        profiles.push(SavedProfile {
            name: fields[0].clone(),
            kind: ProfileKind::from_nm_type(&fields[1]),
            autoconnect,
            priority,
        });
    }
    Ok(profiles)
}

// Wifi Heartbeat - Reconnect Orchestrator
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! The watchdog run: observe, correct, escalate, report.
//!
//! One run walks a fixed ladder of stages, each more invasive than the
//! last, and tries each at most once:
//!
//! 1. resolve the wireless interface (fatal if missing)
//! 2. enforce the auto-connect policy
//! 3. if the link is down: credentialed connect, then saved profiles
//! 4. if associated with the wrong network: forced switch to the desired one
//! 5. connectivity check
//! 6. if still offline: hard reset of the device and a final check
//!
//! Persistent failure is left for the next scheduled run; nothing loops.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::connectivity::ConnectivityChecker;
use super::policy::PolicyEnforcer;
use crate::backend::{ConnectMethod, NetworkController, Prober, StateReader};
use crate::models::{
    Error, Interface, ReconnectOutcome, RunReport, SavedProfile, Stage, StageRecord,
    WatchdogConfig, LOG_TAG,
};

/// What the reconnect stage achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReconnectAttempt {
    /// Connected with the configured credentials.
    Credentials(ConnectMethod),
    /// A saved profile came up.
    Profile(String),
    /// Something was tried and nothing came up.
    Failed(Option<String>),
    /// There was nothing to try.
    NothingToTry,
}

/// Drives one watchdog run against the given collaborators.
pub struct ReconnectOrchestrator<'a, R, C, P> {
    reader: &'a R,
    controller: &'a C,
    prober: &'a P,
    config: &'a WatchdogConfig,
}

impl<'a, R, C, P> ReconnectOrchestrator<'a, R, C, P>
where
    R: StateReader,
    C: NetworkController,
    P: Prober,
{
    pub fn new(
        reader: &'a R,
        controller: &'a C,
        prober: &'a P,
        config: &'a WatchdogConfig,
    ) -> Self {
        Self {
            reader,
            controller,
            prober,
            config,
        }
    }

    fn connectivity(&self) -> ConnectivityChecker<'a, R, P> {
        ConnectivityChecker::new(self.reader, self.prober, self.config)
    }

    /// Run the full escalation ladder once.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();

        // 1. Interface
        let started = Instant::now();
        let Some(iface) = self.reader.find_wireless_interface().await else {
            warn!(target: LOG_TAG, "no wifi interface found");
            report.record(StageRecord::failed(
                Stage::ResolveInterface,
                "no wireless interface",
                Some(Error::NoWirelessInterface.to_string()),
                started.elapsed(),
            ));
            report.finalize(ReconnectOutcome::NoInterface);
            return report;
        };
        report.interface = Some(iface.name().to_string());
        report.record(StageRecord::success(
            Stage::ResolveInterface,
            format!("using {}", iface),
            started.elapsed(),
        ));

        // 2. Policy
        self.enforce_policy(&mut report).await;

        // 3. Link
        let state = self.reader.link_state_of(&iface).await;
        report.link_state = Some(state);
        report.record(StageRecord::success(
            Stage::CheckLink,
            format!("link {}", state),
            Duration::ZERO,
        ));
        info!(target: LOG_TAG, "iface={} state={}", iface, state);

        let mut corrected = false;
        let mut nothing_to_try = false;

        if state.is_connected() {
            report.record(StageRecord::skipped(Stage::Reconnect, "link connected"));
        } else {
            corrected = true;
            info!(target: LOG_TAG, "state not connected, trying reconnect");
            let started = Instant::now();
            let attempt = self.try_reconnect(&iface).await;
            nothing_to_try = attempt == ReconnectAttempt::NothingToTry;
            self.record_reconnect(&mut report, &attempt, started.elapsed());
            self.settle_after(&attempt).await;
        }

        // 4. Wrong network
        let active = self.reader.active_network_identity(&iface).await;
        report.active_network = active.clone();
        let desired = &self.config.desired_network;
        match active {
            Some(active) if desired.is_configured() && !desired.is_same_network(&active) => {
                corrected = true;
                self.enforce_switch(&iface, &active, &mut report).await;
            }
            _ => report.record(StageRecord::skipped(
                Stage::EnforceSwitch,
                "no undesired association",
            )),
        }

        // 5. Connectivity
        let started = Instant::now();
        if let Some(target) = self.connectivity().reachable_target(&iface).await {
            report.record(StageRecord::success(
                Stage::CheckConnectivity,
                format!("{} reachable", target),
                started.elapsed(),
            ));
            let outcome = if corrected {
                ReconnectOutcome::Reconnected
            } else {
                ReconnectOutcome::AlreadyOnline
            };
            self.log_online(&iface, outcome).await;
            report.finalize(outcome);
            return report;
        }
        report.record(StageRecord::failed(
            Stage::CheckConnectivity,
            "no probe target reachable",
            None,
            started.elapsed(),
        ));

        // 6. Hard reset
        let outcome = self.hard_reset(&iface, nothing_to_try, &mut report).await;
        report.finalize(outcome);
        report
    }

    async fn enforce_policy(&self, report: &mut RunReport) {
        let started = Instant::now();
        let enforcer = PolicyEnforcer::new(self.controller, self.config.preferred_priority);
        let policy = enforcer.enforce(&self.config.desired_network).await;

        let record = if policy.skipped {
            StageRecord::skipped(Stage::EnforcePolicy, "no desired network configured")
        } else if let Some(e) = policy.failures.last() {
            StageRecord::failed(
                Stage::EnforcePolicy,
                format!("{} failure(s)", policy.failures.len()),
                Some(e.to_string()),
                started.elapsed(),
            )
        } else {
            StageRecord::success(
                Stage::EnforcePolicy,
                format!("{} profile(s) updated", policy.changed.len()),
                started.elapsed(),
            )
        };
        report.record(record);
    }

    /// Soft reconnect: radio on, credentialed connect, then saved profiles.
    async fn try_reconnect(&self, iface: &Interface) -> ReconnectAttempt {
        if let Err(e) = self.controller.enable_radio().await {
            warn!("Enabling wifi radio failed: {}", e);
        }

        let desired = &self.config.desired_network;
        let wait = self.config.timeouts.connect_wait();
        let mut last_failure = None;

        let candidates: Vec<String> = if desired.is_configured() {
            let connect = self
                .controller
                .connect_with_credentials(iface, desired, wait)
                .await;
            for failure in &connect.failures {
                debug!("Credentialed connect sub-stage failed: {}", failure);
            }
            if let Some(method) = connect.method {
                info!(target: LOG_TAG, "reconnected via preferred: {}", desired.name);
                return ReconnectAttempt::Credentials(method);
            }
            if let Some(e) = connect.last_failure() {
                warn!(target: LOG_TAG, "connect to '{}' failed: {}", desired.name, e);
                last_failure = Some(e.to_string());
            }

            // The exact-name profile was just recreated (or removed) above
            self.saved_wireless_profiles(iface)
                .await
                .into_iter()
                .filter(|p| p.name != desired.name && p.matches_network(&desired.name))
                .map(|p| p.name)
                .collect()
        } else {
            let mut candidates = Vec::new();
            if let Some(current) = self.reader.active_network_identity(iface).await {
                candidates.push(current);
            }
            for profile in self.saved_wireless_profiles(iface).await {
                if !candidates.contains(&profile.name) {
                    candidates.push(profile.name);
                }
            }
            if candidates.is_empty() {
                warn!(target: LOG_TAG, "no wifi connection profiles found");
                return ReconnectAttempt::NothingToTry;
            }
            candidates
        };

        for name in candidates {
            match self.controller.bring_profile_up(&name, wait).await {
                Ok(()) => {
                    info!(target: LOG_TAG, "reconnected via: {}", name);
                    return ReconnectAttempt::Profile(name);
                }
                Err(e) => {
                    debug!("Bringing up '{}' failed: {}", name, e);
                    last_failure = Some(e.to_string());
                }
            }
        }

        ReconnectAttempt::Failed(last_failure)
    }

    /// Saved wireless profiles, after an optional rescan.
    async fn saved_wireless_profiles(&self, iface: &Interface) -> Vec<SavedProfile> {
        if self.config.rescan_before_fallback {
            if let Err(e) = self.controller.rescan(iface).await {
                debug!("Wifi rescan failed: {}", e);
            }
        }

        match self.controller.list_saved_profiles().await {
            Ok(profiles) => profiles.into_iter().filter(SavedProfile::is_wireless).collect(),
            Err(e) => {
                warn!("Listing saved profiles failed: {}", e);
                Vec::new()
            }
        }
    }

    fn record_reconnect(&self, report: &mut RunReport, attempt: &ReconnectAttempt, took: Duration) {
        let record = match attempt {
            ReconnectAttempt::Credentials(method) => StageRecord::success(
                Stage::Reconnect,
                format!("connected to {} ({:?})", self.config.desired_network.name, method),
                took,
            ),
            ReconnectAttempt::Profile(name) => {
                StageRecord::success(Stage::Reconnect, format!("profile {} up", name), took)
            }
            ReconnectAttempt::Failed(detail) => {
                StageRecord::failed(Stage::Reconnect, "reconnect failed", detail.clone(), took)
            }
            ReconnectAttempt::NothingToTry => StageRecord::failed(
                Stage::Reconnect,
                "no wifi connection profiles found",
                None,
                took,
            ),
        };
        report.record(record);
    }

    /// Give the network stack time to come up after a successful reconnect.
    async fn settle_after(&self, attempt: &ReconnectAttempt) {
        let delay = match attempt {
            ReconnectAttempt::Credentials(_) => self.config.delays.settle_after_credentials(),
            ReconnectAttempt::Profile(_) => self.config.delays.settle_after_profile(),
            ReconnectAttempt::Failed(_) | ReconnectAttempt::NothingToTry => return,
        };
        pause(delay).await;
    }

    /// Drop an undesired association and connect to the desired network once.
    async fn enforce_switch(&self, iface: &Interface, active: &str, report: &mut RunReport) {
        let desired = &self.config.desired_network;
        let started = Instant::now();
        warn!(
            target: LOG_TAG,
            "associated with '{}' instead of '{}', forcing switch", active, desired.name
        );

        if let Err(e) = self.controller.disconnect_interface(iface).await {
            warn!("Disconnecting {} failed: {}", iface, e);
        }

        let connect = self
            .controller
            .connect_with_credentials(iface, desired, self.config.timeouts.connect_wait())
            .await;

        if connect.is_connected() {
            info!(target: LOG_TAG, "switched to preferred: {}", desired.name);
            report.record(StageRecord::success(
                Stage::EnforceSwitch,
                format!("switched from {} to {}", active, desired.name),
                started.elapsed(),
            ));
            pause(self.config.delays.settle_after_credentials()).await;
        } else {
            let detail = connect.last_failure().map(|e| e.to_string());
            warn!(
                target: LOG_TAG,
                "switch to '{}' failed: {}",
                desired.name,
                detail.as_deref().unwrap_or("unknown error")
            );
            report.record(StageRecord::failed(
                Stage::EnforceSwitch,
                format!("switch from {} failed", active),
                detail,
                started.elapsed(),
            ));
        }
    }

    /// Force the device down and up again, then check one last time.
    async fn hard_reset(
        &self,
        iface: &Interface,
        nothing_to_try: bool,
        report: &mut RunReport,
    ) -> ReconnectOutcome {
        info!(target: LOG_TAG, "still offline, hard reset of {}", iface);
        let started = Instant::now();
        let mut detail = None;

        if let Err(e) = self.controller.disconnect_interface(iface).await {
            warn!("Disconnecting {} failed: {}", iface, e);
            detail = Some(e.to_string());
        }
        pause(self.config.delays.reset_disconnect()).await;

        if let Err(e) = self.controller.reconnect_interface_automatically(iface).await {
            warn!("Reconnecting {} failed: {}", iface, e);
            detail = Some(e.to_string());
        }
        pause(self.config.delays.reset_reconnect()).await;

        match self.connectivity().reachable_target(iface).await {
            Some(target) => {
                report.record(StageRecord::success(
                    Stage::HardReset,
                    format!("{} reachable after reset", target),
                    started.elapsed(),
                ));
                let outcome = ReconnectOutcome::ReconnectedAfterHardReset;
                self.log_online(iface, outcome).await;
                outcome
            }
            None => {
                report.record(StageRecord::failed(
                    Stage::HardReset,
                    "offline after reset",
                    detail,
                    started.elapsed(),
                ));
                warn!(target: LOG_TAG, "offline (will retry next timer tick)");
                if nothing_to_try {
                    ReconnectOutcome::NoUsableProfile
                } else {
                    ReconnectOutcome::StillOffline
                }
            }
        }
    }

    async fn log_online(&self, iface: &Interface, outcome: ReconnectOutcome) {
        let ssid = self.reader.active_network_identity(iface).await;
        info!(
            target: LOG_TAG,
            "online SSID='{}' ({})",
            ssid.as_deref().unwrap_or("unknown"),
            outcome
        );
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

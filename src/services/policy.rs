// Wifi Heartbeat - Auto-Connect Policy
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Keeps the desired network the only one allowed to auto-connect.
//!
//! The desired profile gets auto-connect and an elevated priority; every
//! other saved wireless profile has auto-connect disabled. Profiles already
//! in the right state are left alone, so enforcing twice is the same as
//! enforcing once.

use tracing::{debug, info, warn};

use crate::backend::NetworkController;
use crate::models::{DesiredNetwork, Error, LOG_TAG};

/// What an enforcement pass did.
#[derive(Debug, Default)]
pub struct PolicyReport {
    /// The desired profile exists as a saved profile.
    pub desired_present: bool,
    /// Profiles whose auto-connect settings were changed.
    pub changed: Vec<String>,
    /// Failures while listing or modifying profiles.
    pub failures: Vec<Error>,
    /// Nothing was done because no desired network is configured.
    pub skipped: bool,
}

impl PolicyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Auto-connect policy enforcer.
pub struct PolicyEnforcer<'a, C> {
    controller: &'a C,
    priority: i32,
}

impl<'a, C: NetworkController> PolicyEnforcer<'a, C> {
    /// `priority` is the auto-connect priority given to the desired profile.
    pub fn new(controller: &'a C, priority: i32) -> Self {
        Self {
            controller,
            priority,
        }
    }

    /// Apply the policy for `desired`.
    ///
    /// Never creates the desired profile; that happens during a connect.
    pub async fn enforce(&self, desired: &DesiredNetwork) -> PolicyReport {
        let mut report = PolicyReport::default();

        if !desired.is_configured() {
            debug!("No desired network configured, leaving auto-connect untouched");
            report.skipped = true;
            return report;
        }

        let profiles = match self.controller.list_saved_profiles().await {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(target: LOG_TAG, "policy: cannot list saved profiles: {}", e);
                report.failures.push(e);
                return report;
            }
        };

        for profile in profiles.iter().filter(|p| p.is_wireless()) {
            let change = if profile.name == desired.name {
                report.desired_present = true;
                (!profile.autoconnect || profile.priority != self.priority)
                    .then_some((true, Some(self.priority)))
            } else {
                profile.autoconnect.then_some((false, None))
            };

            let Some((enabled, priority)) = change else {
                continue;
            };

            match self
                .controller
                .set_profile_autoconnect(&profile.name, enabled, priority)
                .await
            {
                Ok(()) => {
                    debug!(
                        "Auto-connect for '{}' set to {} (priority {:?})",
                        profile.name, enabled, priority
                    );
                    report.changed.push(profile.name.clone());
                }
                Err(e) => {
                    warn!("Failed to update auto-connect for '{}': {}", profile.name, e);
                    report.failures.push(e);
                }
            }
        }

        if !report.desired_present {
            debug!("Desired profile '{}' not saved yet", desired.name);
        }

        info!(
            target: LOG_TAG,
            "policy: preferring '{}' ({} profile(s) updated{})",
            desired.name,
            report.changed.len(),
            if report.failures.is_empty() {
                String::new()
            } else {
                format!(", {} failure(s)", report.failures.len())
            }
        );

        report
    }
}

// Wifi Heartbeat - Run Results
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Result types for one watchdog run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::network::LinkState;

/// Terminal result of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconnectOutcome {
    /// Online without any corrective action.
    AlreadyOnline,
    /// Online after a reconnect or a forced switch back to the desired network.
    Reconnected,
    /// Online only after the interface was hard reset.
    ReconnectedAfterHardReset,
    /// Every stage was attempted and the device is still offline.
    StillOffline,
    /// No wireless device exists.
    NoInterface,
    /// Offline, and there was no profile to bring up in the first place.
    NoUsableProfile,
}

impl ReconnectOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::AlreadyOnline | Self::Reconnected | Self::ReconnectedAfterHardReset => 0,
            Self::NoInterface => 1,
            Self::StillOffline | Self::NoUsableProfile => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyOnline => "already-online",
            Self::Reconnected => "reconnected",
            Self::ReconnectedAfterHardReset => "reconnected-after-hard-reset",
            Self::StillOffline => "still-offline",
            Self::NoInterface => "no-interface",
            Self::NoUsableProfile => "no-usable-profile",
        }
    }
}

impl fmt::Display for ReconnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation stages, in the order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolveInterface,
    EnforcePolicy,
    CheckLink,
    Reconnect,
    EnforceSwitch,
    CheckConnectivity,
    HardReset,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveInterface => "resolve_interface",
            Self::EnforcePolicy => "enforce_policy",
            Self::CheckLink => "check_link",
            Self::Reconnect => "reconnect",
            Self::EnforceSwitch => "enforce_switch",
            Self::CheckConnectivity => "check_connectivity",
            Self::HardReset => "hard_reset",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Failed,
    Skipped,
}

/// Record of one stage of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    /// Human-readable message.
    pub message: String,
    /// Underlying tool error, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub duration_ms: u64,
}

impl StageRecord {
    pub fn success(stage: Stage, message: impl Into<String>, took: Duration) -> Self {
        Self {
            stage,
            status: StageStatus::Success,
            message: message.into(),
            error_detail: None,
            duration_ms: took.as_millis() as u64,
        }
    }

    pub fn failed(
        stage: Stage,
        message: impl Into<String>,
        detail: Option<String>,
        took: Duration,
    ) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            message: message.into(),
            error_detail: detail,
            duration_ms: took.as_millis() as u64,
        }
    }

    pub fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            message: reason.into(),
            error_detail: None,
            duration_ms: 0,
        }
    }
}

/// Everything that happened during one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_state: Option<LinkState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_network: Option<String>,
    pub stages: Vec<StageRecord>,
    /// Final outcome. `None` until the run is finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReconnectOutcome>,
    pub total_duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            interface: None,
            link_state: None,
            active_network: None,
            stages: Vec::new(),
            outcome: None,
            total_duration_ms: 0,
            started_at: now,
            completed_at: now,
        }
    }

    pub fn record(&mut self, record: StageRecord) {
        debug!(
            "stage {} {:?} after {}ms: {}",
            record.stage, record.status, record.duration_ms, record.message
        );
        self.stages.push(record);
    }

    /// Stamp the outcome and the end time.
    pub fn finalize(&mut self, outcome: ReconnectOutcome) {
        self.outcome = Some(outcome);
        self.completed_at = Utc::now();
        self.total_duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
    }

    /// Whether `stage` was actually attempted (not skipped) in this run.
    #[cfg(test)]
    pub fn attempted(&self, stage: Stage) -> bool {
        self.stages
            .iter()
            .any(|r| r.stage == stage && r.status != StageStatus::Skipped)
    }

    /// Exit code of the run. An unfinished report counts as offline.
    pub fn exit_code(&self) -> u8 {
        self.outcome.map(|o| o.exit_code()).unwrap_or(2)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

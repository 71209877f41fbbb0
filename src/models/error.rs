// Wifi Heartbeat - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the watchdog.
//!
//! Most of these never abort a run. Collaborators hand them back so the
//! orchestrator can log the underlying reason and fold the failure into the
//! next escalation stage.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for watchdog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for watchdog operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Command Errors
    // ========================================
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Command timed out after {}s: {command}", .after.as_secs())]
    CommandTimeout { command: String, after: Duration },

    #[error("Failed to spawn {command}: {reason}")]
    CommandSpawn { command: String, reason: String },

    // ========================================
    // Network Errors
    // ========================================
    #[error("No wireless interface found")]
    NoWirelessInterface,

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Unexpected output from {source_name}: {detail}")]
    Parse { source_name: String, detail: String },

    // ========================================
    // Configuration Errors
    // ========================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    ConfigReadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new command failed error.
    pub fn command_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }

    /// Whether the underlying command ran out of time rather than failing outright.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. })
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message_keeps_tool_text() {
        let err = Error::command_failed("nmcli con up id Office", "Error: no network with SSID 'Office'");
        assert_eq!(
            err.to_string(),
            "Command failed: nmcli con up id Office - Error: no network with SSID 'Office'"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::CommandTimeout {
            command: "ping -c1 8.8.8.8".to_string(),
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "Command timed out after 3s: ping -c1 8.8.8.8");
        assert!(err.is_timeout());
    }
}

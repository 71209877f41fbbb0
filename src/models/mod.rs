// Wifi Heartbeat - Data Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Data Models
//!
//! Plain types shared by the backends and the services:
//!
//! - **Config**: the immutable watchdog configuration
//! - **Network**: typed network state (interface, link state, profiles)
//! - **Result**: stage records, run report and terminal outcome
//! - **Error**: shared error types

pub mod config;
pub mod error;
pub mod network;
pub mod result;

pub use config::{ConfigOverrides, DesiredNetwork, WatchdogConfig};
pub use error::{Error, Result};
pub use network::{ActiveConnection, DeviceStatus, DeviceType, Interface, LinkState, SavedProfile};
pub use result::{ReconnectOutcome, RunReport, Stage, StageRecord};

/// Fixed tag every stage log line is emitted under.
pub const LOG_TAG: &str = "wifi-heartbeat";

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "wifi-heartbeat";

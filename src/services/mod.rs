// Wifi Heartbeat - Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Watchdog services built on the backend traits.
//!
//! - Connectivity: ordered probing of gateway and fallback targets
//! - Policy: auto-connect preference for the desired network
//! - Watchdog: the reconnect orchestrator driving one run

pub mod connectivity;
pub mod policy;
pub mod watchdog;

#[cfg(test)]
pub mod testing;

pub use connectivity::ConnectivityChecker;
pub use policy::PolicyEnforcer;
pub use watchdog::ReconnectOrchestrator;

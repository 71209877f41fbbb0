// Wifi Heartbeat - ICMP Prober
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Reachability probe using the system `ping`.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::command::Cmd;
use super::Prober;
use crate::models::config::Timeouts;
use crate::models::Interface;

/// Sends exactly one echo request bound to the interface.
#[derive(Debug, Clone)]
pub struct PingProber {
    timeouts: Timeouts,
}

impl PingProber {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    fn command(iface: &Interface, target: &str, timeout: Duration) -> Cmd {
        Cmd::new("ping").args([
            "-I".to_string(),
            iface.name().to_string(),
            "-c1".to_string(),
            format!("-W{}", timeout.as_secs().max(1)),
            target.to_string(),
        ])
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, iface: &Interface, target: &str, timeout: Duration) -> bool {
        let cmd = Self::command(iface, target, timeout);
        match cmd.output(self.timeouts.for_probe(timeout)).await {
            Ok(output) if output.success() => true,
            Ok(output) => {
                debug!("No reply from {} via {}: {}", target, iface, output.failure_reason());
                false
            }
            Err(e) if e.is_timeout() => {
                debug!("Probe to {} via {} got no answer in time", target, iface);
                false
            }
            Err(e) => {
                debug!("Probe to {} via {} failed: {}", target, iface, e);
                false
            }
        }
    }
}

// Wifi Heartbeat - Connectivity Check
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Upstream connectivity check over an ordered list of probe targets.

use std::net::IpAddr;
use tracing::debug;

use crate::backend::{Prober, StateReader};
use crate::models::{Interface, WatchdogConfig};

/// Ordered probe targets: gateway first, then extra targets, then fallbacks.
///
/// Duplicates are dropped, keeping the first occurrence.
pub fn candidate_targets(
    gateway: Option<IpAddr>,
    extra: &[String],
    fallbacks: &[String],
) -> Vec<String> {
    let mut targets: Vec<String> = Vec::with_capacity(1 + extra.len() + fallbacks.len());
    let ordered = gateway
        .map(|gw| gw.to_string())
        .into_iter()
        .chain(extra.iter().cloned())
        .chain(fallbacks.iter().cloned());

    for target in ordered {
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

/// Checks connectivity through the reader (for the gateway) and the prober.
pub struct ConnectivityChecker<'a, R, P> {
    reader: &'a R,
    prober: &'a P,
    config: &'a WatchdogConfig,
}

impl<'a, R: StateReader, P: Prober> ConnectivityChecker<'a, R, P> {
    pub fn new(reader: &'a R, prober: &'a P, config: &'a WatchdogConfig) -> Self {
        Self {
            reader,
            prober,
            config,
        }
    }

    /// First target that answers, probing in order and stopping at the first reply.
    ///
    /// The gateway is looked up again on every call since a reconnect may
    /// have changed it.
    pub async fn reachable_target(&self, iface: &Interface) -> Option<String> {
        let gateway = self.reader.default_gateway().await;
        let targets = candidate_targets(
            gateway,
            &self.config.extra_targets,
            &self.config.fallback_targets,
        );
        let timeout = self.config.timeouts.probe();

        for target in targets {
            if self.prober.probe(iface, &target, timeout).await {
                debug!("{} reachable via {}", target, iface);
                return Some(target);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Call, FakeNetwork};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_targets_order() {
        let targets = candidate_targets(
            Some("192.168.1.1".parse().unwrap()),
            &strings(&["10.0.0.53"]),
            &strings(&["1.1.1.1", "8.8.8.8"]),
        );
        assert_eq!(targets, vec!["192.168.1.1", "10.0.0.53", "1.1.1.1", "8.8.8.8"]);
    }

    #[test]
    fn test_candidate_targets_without_gateway_and_dedup() {
        assert_eq!(
            candidate_targets(None, &[], &strings(&["1.1.1.1", "8.8.8.8"])),
            vec!["1.1.1.1", "8.8.8.8"]
        );
        assert_eq!(
            candidate_targets(
                Some("1.1.1.1".parse().unwrap()),
                &[],
                &strings(&["1.1.1.1", "8.8.8.8"])
            ),
            vec!["1.1.1.1", "8.8.8.8"]
        );
        assert!(candidate_targets(None, &[], &[]).is_empty());
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_success() {
        let net = FakeNetwork::new()
            .gateway("192.168.1.1")
            .reachable("192.168.1.1")
            .reachable("8.8.8.8");
        let config = WatchdogConfig::default();
        let checker = ConnectivityChecker::new(&net, &net, &config);

        assert_eq!(
            checker.reachable_target(&Interface::new("wlan0")).await,
            Some("192.168.1.1".to_string())
        );
        assert_eq!(net.probes(), vec!["192.168.1.1"]);
    }

    #[tokio::test]
    async fn test_falls_through_to_fallbacks() {
        let net = FakeNetwork::new().gateway("192.168.1.1").reachable("8.8.8.8");
        let config = WatchdogConfig::default();
        let checker = ConnectivityChecker::new(&net, &net, &config);

        assert_eq!(
            checker.reachable_target(&Interface::new("wlan0")).await,
            Some("8.8.8.8".to_string())
        );
        assert_eq!(net.probes(), vec!["192.168.1.1", "1.1.1.1", "8.8.8.8"]);
    }

    #[tokio::test]
    async fn test_empty_target_list_is_offline() {
        let net = FakeNetwork::new().reachable("8.8.8.8");
        let mut config = WatchdogConfig::default();
        config.fallback_targets.clear();
        let checker = ConnectivityChecker::new(&net, &net, &config);

        assert!(checker.reachable_target(&Interface::new("wlan0")).await.is_none());
        assert!(!net.calls().iter().any(|c| matches!(c, Call::Probe(_))));
    }
}

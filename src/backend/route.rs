// Wifi Heartbeat - Route Table
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Default gateway lookup from the kernel route table.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::time::Duration;

use super::command::Cmd;
use crate::models::Result;

static DEFAULT_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^default\s+via\s+(\S+)").expect("default route pattern is valid"));

/// Gateway of the first default route in `ip route` output.
///
/// Returns `None` if there is no default route or its gateway is not an
/// address.
pub fn parse_default_gateway(routes: &str) -> Option<IpAddr> {
    routes
        .lines()
        .filter_map(|line| DEFAULT_ROUTE.captures(line.trim()))
        .next()
        .and_then(|caps| caps.get(1))
        .and_then(|gw| gw.as_str().parse().ok())
}

/// Read the default gateway via `ip route show default`.
pub async fn default_gateway(bound: Duration) -> Result<Option<IpAddr>> {
    let routes = Cmd::new("ip")
        .args(["route", "show", "default"])
        .run(bound)
        .await?;
    Ok(parse_default_gateway(&routes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_gateway() {
        let routes = "default via 192.168.1.1 dev wlan0 proto dhcp src 192.168.1.40 metric 600\n\
                      192.168.1.0/24 dev wlan0 proto kernel scope link src 192.168.1.40 metric 600";
        assert_eq!(
            parse_default_gateway(routes),
            Some("192.168.1.1".parse().unwrap())
        );
    }

    #[test]
    fn test_first_default_route_wins() {
        let routes = "default via 10.0.0.1 dev eth0 metric 100\n\
                      default via 192.168.1.1 dev wlan0 metric 600";
        assert_eq!(parse_default_gateway(routes), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_no_default_route() {
        assert_eq!(parse_default_gateway(""), None);
        assert_eq!(
            parse_default_gateway("192.168.1.0/24 dev wlan0 proto kernel scope link"),
            None
        );
        // Point-to-point default without a gateway address
        assert_eq!(parse_default_gateway("default dev wg0 scope link"), None);
    }

    #[test]
    fn test_unparsable_gateway() {
        assert_eq!(parse_default_gateway("default via gateway.lan dev wlan0"), None);
    }
}

// Wifi Heartbeat - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Wifi Heartbeat
//!
//! Periodic Wi-Fi connectivity watchdog for NetworkManager hosts.
//!
//! Meant to be started by a timer. Each invocation observes the wireless
//! link once, applies the least invasive correction that could help, and
//! exits with a code describing the result.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

mod backend;
mod models;
mod services;

use backend::{NmcliBackend, PingProber, StateReader};
use models::{ConfigOverrides, Error, WatchdogConfig, LOG_TAG};
use services::policy::PolicyReport;
use services::{ConnectivityChecker, PolicyEnforcer, ReconnectOrchestrator};

/// Application name.
pub const APP_NAME: &str = "wifi-heartbeat";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about = "Keep a Wi-Fi link online and on the right network")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Desired network name
    #[arg(long, env = "WIFI_HEARTBEAT_SSID")]
    ssid: Option<String>,

    /// Secret of the desired network
    #[arg(long, env = "WIFI_HEARTBEAT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Fallback probe target (repeatable)
    #[arg(long, env = "WIFI_HEARTBEAT_FALLBACKS", value_delimiter = ',')]
    fallback: Option<Vec<String>>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Observe, correct and escalate once (default)
    Run,
    /// Connectivity check only, no corrective action
    Check,
    /// Apply the auto-connect policy only
    Enforce,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ssid: self.ssid.clone(),
            secret: self.secret.clone(),
            fallback_targets: self.fallback.clone(),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogStream {
    Stdout,
    /// Keeps stdout free for the JSON report.
    Stderr,
}

impl LogStream {
    fn for_cli(cli: &Cli) -> Self {
        if cli.json {
            Self::Stderr
        } else {
            Self::Stdout
        }
    }

    fn writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(std::io::stdout),
            Self::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

fn init_logging(debug: bool, stream: LogStream) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(stream.writer())
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

async fn run(config: &WatchdogConfig, json: bool) -> u8 {
    let backend = NmcliBackend::new(config.timeouts);
    let prober = PingProber::new(config.timeouts);

    let report = ReconnectOrchestrator::new(&backend, &backend, &prober, config)
        .run()
        .await;

    if json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => error!(target: LOG_TAG, "failed to serialize run report: {}", e),
        }
    }
    report.exit_code()
}

async fn check(config: &WatchdogConfig) -> u8 {
    let backend = NmcliBackend::new(config.timeouts);
    let prober = PingProber::new(config.timeouts);

    let Some(iface) = backend.find_wireless_interface().await else {
        info!(target: LOG_TAG, "no wifi interface found");
        return 1;
    };

    let checker = ConnectivityChecker::new(&backend, &prober, config);
    match checker.reachable_target(&iface).await {
        Some(target) => {
            info!(target: LOG_TAG, "online via {} ({} reachable)", iface, target);
            0
        }
        None => {
            info!(target: LOG_TAG, "offline via {}", iface);
            2
        }
    }
}

async fn enforce(config: &WatchdogConfig) -> u8 {
    let backend = NmcliBackend::new(config.timeouts);

    if backend.find_wireless_interface().await.is_none() {
        info!(target: LOG_TAG, "no wifi interface found");
        return 1;
    }

    let report = PolicyEnforcer::new(&backend, config.preferred_priority)
        .enforce(&config.desired_network)
        .await;
    log_policy_result(&report);
    0
}

fn log_policy_result(report: &PolicyReport) {
    if !report.is_clean() {
        error!(
            target: LOG_TAG,
            "auto-connect policy only partly applied ({} failure(s))",
            report.failures.len()
        );
    }
}

fn log_config_error(e: &Error) {
    error!(target: LOG_TAG, "{}", e);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug, LogStream::for_cli(&cli));

    let config = match WatchdogConfig::resolve(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            log_config_error(&e);
            return ExitCode::from(2);
        }
    };
    tracing::debug!("Starting {} v{} with {:?}", APP_NAME, VERSION, config);

    let code = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, cli.json).await,
        Command::Check => check(&config).await,
        Command::Enforce => enforce(&config).await,
    };
    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn test_json_moves_logs_to_stderr() {
        let cli = Cli::try_parse_from(["wifi-heartbeat", "--json", "run"]).unwrap();
        assert_eq!(LogStream::for_cli(&cli), LogStream::Stderr);

        let cli = Cli::try_parse_from(["wifi-heartbeat"]).unwrap();
        assert_eq!(LogStream::for_cli(&cli), LogStream::Stdout);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_error_lines_carry_log_tag() {
        let out = capture(|| {
            log_config_error(&Error::InvalidConfig("invalid probe target ''".to_string()));
        });
        assert!(out.contains("ERROR wifi-heartbeat: Invalid configuration"), "{out}");

        let report = PolicyReport {
            failures: vec![Error::ProfileNotFound("Guest".to_string())],
            ..PolicyReport::default()
        };
        let out = capture(|| log_policy_result(&report));
        assert!(out.contains("ERROR wifi-heartbeat: auto-connect policy only partly applied"), "{out}");
    }
}

// Wifi Heartbeat - Bounded Command Execution
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! External command execution with a hard time bound.
//!
//! Every tool the watchdog drives (nmcli, ip, ping) goes through [`Cmd`].
//! A command that outlives its bound is killed and reported as
//! [`Error::CommandTimeout`].

use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::models::{Error, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Best description of why the command failed.
    pub fn failure_reason(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            match self.status {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            }
        }
    }
}

/// A command line with optional secret arguments.
#[derive(Clone)]
pub struct Cmd {
    program: &'static str,
    args: Vec<String>,
    secret_args: Vec<usize>,
}

impl Cmd {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            args: Vec::new(),
            secret_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an argument that must never show up in logs or errors.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    #[cfg(test)]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run the command and capture its output.
    ///
    /// Fails only if the process cannot be spawned or exceeds `bound`; a
    /// non-zero exit is returned as a normal [`CommandOutput`].
    pub async fn output(&self, bound: Duration) -> Result<CommandOutput> {
        debug!("Running: {} (bound {}s)", self, bound.as_secs());

        let child = Command::new(self.program)
            .args(&self.args)
            // Tool output is parsed, keep it untranslated
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(bound, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::CommandSpawn {
                    command: self.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                debug!("Timed out: {}", self);
                return Err(Error::CommandTimeout {
                    command: self.to_string(),
                    after: bound,
                });
            }
        };

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        debug!("{} exited with {:?}", self.program, output.status);
        Ok(output)
    }

    /// Run the command and return its stdout, treating a non-zero exit as an error.
    pub async fn run(&self, bound: Duration) -> Result<String> {
        let output = self.output(bound).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(Error::command_failed(self.to_string(), output.failure_reason()))
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&i) {
                f.write_str(" <redacted>")?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cmd({})", self)
    }
}

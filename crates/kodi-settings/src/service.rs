//! Managed-service control and one-shot system commands.
//!
//! Every invocation is a parameterized argv spawn; values are never
//! interpolated into a shell string. Privilege elevation is an explicit,
//! per-call property realized through the configured elevation binary.

use crate::config::EngineConfig;
use crate::error::ProcessError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

/// Keep captured stderr bounded in error reports.
const MAX_STDERR_BYTES: usize = 4 * 1024;

/// Process-control surface of the engine. The reconciler holds an
/// implementation injected at construction; tests substitute a recorder.
#[async_trait]
pub trait ServiceControl {
    async fn start(&self) -> Result<(), ProcessError>;
    async fn stop(&self) -> Result<(), ProcessError>;
    async fn restart(&self) -> Result<(), ProcessError>;

    /// Run a one-shot system command (ownership fix-ups, ALSA reload).
    async fn run_once(
        &self,
        program: &str,
        args: &[&str],
        elevated: bool,
    ) -> Result<(), ProcessError>;
}

/// Production implementation driving the managed unit through systemctl.
pub struct SystemdControl {
    unit: String,
    systemctl_bin: String,
    sudo_bin: String,
    timeout_secs: u64,
}

impl SystemdControl {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            unit: cfg.unit.clone(),
            systemctl_bin: cfg.systemctl_bin.clone(),
            sudo_bin: cfg.sudo_bin.clone(),
            timeout_secs: cfg.command_timeout_secs,
        }
    }

    async fn systemctl(&self, verb: &str) -> Result<(), ProcessError> {
        info!("systemctl {} {}", verb, self.unit);
        // The unit is controlled from an unprivileged context.
        self.exec(&self.systemctl_bin, &[verb, &self.unit], true).await
    }

    /// Spawn a process under the configured timeout. A hung external
    /// command must not hang the engine indefinitely.
    async fn exec(
        &self,
        program: &str,
        args: &[&str],
        elevated: bool,
    ) -> Result<(), ProcessError> {
        let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if elevated {
            argv.push(&self.sudo_bin);
        }
        argv.push(program);
        argv.extend_from_slice(args);

        let command = argv.join(" ");
        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(argv[0])
                .args(&argv[1..])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // When the bounded wait expires the output future is
                // dropped; the child must not linger orphaned.
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| ProcessError::Timeout {
            command: command.clone(),
            timeout_secs: self.timeout_secs,
        })?
        .map_err(|source| ProcessError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessError::ExitNonZero {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: truncate_stderr(&output.stderr),
            })
        }
    }
}

#[async_trait]
impl ServiceControl for SystemdControl {
    async fn start(&self) -> Result<(), ProcessError> {
        self.systemctl("start").await
    }

    async fn stop(&self) -> Result<(), ProcessError> {
        self.systemctl("stop").await
    }

    async fn restart(&self) -> Result<(), ProcessError> {
        self.systemctl("restart").await
    }

    async fn run_once(
        &self,
        program: &str,
        args: &[&str],
        elevated: bool,
    ) -> Result<(), ProcessError> {
        self.exec(program, args, elevated).await
    }
}

fn truncate_stderr(bytes: &[u8]) -> String {
    let slice = if bytes.len() > MAX_STDERR_BYTES {
        &bytes[..MAX_STDERR_BYTES]
    } else {
        bytes
    };
    String::from_utf8_lossy(slice).trim().to_string()
}

//! `wg` / `wg-quick` command implementation

use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};
use wgsync_fs::NormalizedPath;

use super::{LiveStatus, ReloadOutcome, WireGuardControl, parse_dump};
use crate::{Error, Result};

/// Diagnostics `wg` prints for an interface that is not up.
const INACTIVE_MARKERS: [&str; 2] = ["No such device", "Unable to access interface"];

/// Runs the WireGuard tools as child processes, each bounded by a timeout.
#[derive(Debug, Clone)]
pub struct WgCommand {
    wg_binary: String,
    wg_quick_binary: String,
    timeout: Duration,
}

impl Default for WgCommand {
    fn default() -> Self {
        Self::new("wg", "wg-quick", Duration::from_secs(5))
    }
}

impl WgCommand {
    pub fn new(wg_binary: impl Into<String>, wg_quick_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            wg_binary: wg_binary.into(),
            wg_quick_binary: wg_quick_binary.into(),
            timeout,
        }
    }

    async fn run(&self, interface: &str, binary: &str, args: &[&str], stdin: Option<&[u8]>) -> Result<Output> {
        debug!(binary, ?args, "running WireGuard command");

        let mut command = Command::new(binary);
        command
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let execute = async {
            let mut child = command.spawn()?;
            if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(input).await?;
            }
            child.wait_with_output().await
        };

        match tokio::time::timeout(self.timeout, execute).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::CommandNotFound {
                binary: binary.to_string(),
            }),
            Ok(Err(e)) => Err(Error::upstream(format!("failed to run {}: {}", binary, e))),
            Err(_) => {
                warn!(binary, interface, timeout = ?self.timeout, "WireGuard command timed out");
                Err(Error::Timeout {
                    interface: interface.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

fn is_inactive(stderr: &str) -> bool {
    INACTIVE_MARKERS.iter().any(|marker| stderr.contains(marker))
}

fn failure(binary: &str, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::upstream(format!(
        "{} exited with {}: {}",
        binary,
        output.status,
        stderr.trim()
    ))
}

#[async_trait]
impl WireGuardControl for WgCommand {
    async fn query(&self, interface: &str) -> Result<LiveStatus> {
        let output = self
            .run(interface, &self.wg_binary, &["show", interface, "dump"], None)
            .await?;

        if !output.status.success() {
            if is_inactive(&String::from_utf8_lossy(&output.stderr)) {
                debug!(interface, "interface is not running");
                return Ok(LiveStatus::Inactive);
            }
            return Err(failure(&self.wg_binary, &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(LiveStatus::Active(parse_dump(interface, &stdout)?))
    }

    async fn reload(&self, interface: &str, config_path: &NormalizedPath) -> Result<ReloadOutcome> {
        let path = config_path.to_native();
        let path = path.to_string_lossy();

        let stripped = self
            .run(interface, &self.wg_quick_binary, &["strip", &*path], None)
            .await?;
        if !stripped.status.success() {
            return Err(failure(&self.wg_quick_binary, &stripped));
        }

        let synced = self
            .run(
                interface,
                &self.wg_binary,
                &["syncconf", interface, "/dev/stdin"],
                Some(&stripped.stdout),
            )
            .await?;

        if !synced.status.success() {
            if is_inactive(&String::from_utf8_lossy(&synced.stderr)) {
                info!(interface, "interface not running, reload skipped");
                return Ok(ReloadOutcome::Skipped);
            }
            return Err(failure(&self.wg_binary, &synced));
        }

        info!(interface, "reloaded running interface");
        Ok(ReloadOutcome::Reloaded)
    }
}

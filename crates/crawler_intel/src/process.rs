use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::debug;

/// Runs an install command to completion inside `cwd`, bounded by `budget`.
/// Returns an error string (stderr, or a timeout/spawn message) on non-zero
/// exit or timeout.
pub async fn run_install(command: &str, cwd: &std::path::Path, budget: Duration) -> Result<(), String> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| "empty install command".to_string())?;
    let args: Vec<&str> = parts.collect();

    let mut cmd = Command::new(program);
    cmd.args(&args).current_dir(cwd).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|e| format!("spawn failed: {e}"))?;
    let output = timeout(budget, child.wait_with_output())
        .await
        .map_err(|_| format!("install exceeded {}s", budget.as_secs()))?
        .map_err(|e| format!("install wait failed: {e}"))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}

/// Spawns the candidate's run command with piped stdio, ready for MCP
/// handshake over stdin/stdout. Stderr is piped separately so callers can
/// inspect it for auth-like failure messages without it interleaving with
/// JSON-RPC traffic on stdout.
pub fn spawn_server(command: &str, cwd: &std::path::Path) -> std::io::Result<Child> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty run command"))?;
    let args: Vec<&str> = parts.collect();

    Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
}

/// Terminates a subprocess gracefully: SIGTERM, then SIGKILL if it hasn't
/// exited within `grace`. On non-Unix, goes straight to a hard kill.
pub async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
    }

    if timeout(grace, child.wait()).await.is_ok() {
        return;
    }

    debug!("subprocess did not exit within grace period, sending SIGKILL");
    let _ = child.kill().await;
    let _ = child.wait().await;
}

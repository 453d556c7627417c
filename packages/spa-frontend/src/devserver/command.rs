//! Dev-server launcher that runs a shell command.
//!
//! The command runs in the project folder. Its output is relayed to the log
//! line by line and scanned for the first local URL, which becomes the dev
//! server's base URL.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DevServerHandle, DevServerLauncher, LaunchedDevServer};
use crate::error::{FrontendError, Result};

const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;
const GRACEFUL_STOP_SECS: u64 = 5;

lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap();
    static ref LOCAL_URL_RE: Regex = Regex::new(
        r"https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1?\])(?::\d+)?(?:/[^\s]*)?"
    )
    .unwrap();
}

/// Starts the dev server through the platform shell.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    startup_timeout: Duration,
}

impl CommandLauncher {
    pub fn new(startup_timeout: Duration) -> Self {
        Self { startup_timeout }
    }
}

impl Default for CommandLauncher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS))
    }
}

#[async_trait]
impl DevServerLauncher for CommandLauncher {
    async fn start(&self, folder: &Path, command: &str) -> Result<LaunchedDevServer> {
        let child = shell_command(command)
            .current_dir(folder)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FrontendError::DevServerStart(format!("Failed to spawn '{}': {}", command, e)))?;
        // Owned by the handle from here on, so a cancelled launch still takes
        // the whole process group down.
        let mut handle = CommandHandle {
            child,
            output: Vec::new(),
        };

        let (url_tx, mut url_rx) = mpsc::channel(2);
        if let Some(stdout) = handle.child.stdout.take() {
            handle
                .output
                .push(tokio::spawn(relay_output(stdout, "stdout", url_tx.clone())));
        }
        if let Some(stderr) = handle.child.stderr.take() {
            handle
                .output
                .push(tokio::spawn(relay_output(stderr, "stderr", url_tx.clone())));
        }
        // Only the relay tasks hold senders now, so the channel closes when
        // the process closes its output.
        drop(url_tx);

        match tokio::time::timeout(self.startup_timeout, url_rx.recv()).await {
            Ok(Some(base_url)) => Ok(LaunchedDevServer {
                handle: Box::new(handle),
                base_url,
            }),
            Ok(None) => {
                let status = handle.child.wait().await?;
                Err(FrontendError::DevServerStart(format!(
                    "'{}' exited before reporting a URL ({})",
                    command, status
                )))
            }
            Err(_) => {
                tracing::warn!(command = %command, "Dev server did not report a URL in time");
                terminate(&mut handle.child).await?;
                Err(FrontendError::DevServerTimeout(self.startup_timeout))
            }
        }
    }
}

/// Handle to a dev server spawned by [`CommandLauncher`].
pub struct CommandHandle {
    child: Child,
    output: Vec<JoinHandle<()>>,
}

#[async_trait]
impl DevServerHandle for CommandHandle {
    async fn stop(mut self: Box<Self>) -> Result<()> {
        terminate(&mut self.child).await
    }
}

impl Drop for CommandHandle {
    fn drop(&mut self) {
        for task in &self.output {
            task.abort();
        }

        kill_group(&self.child);
    }
}

/// `kill_on_drop` only reaches the shell; the server it started lives on in
/// the group. `id()` is `None` once the leader has been reaped.
#[cfg(unix)]
fn kill_group(child: &Child) {
    if let Some(pid) = child.id() {
        tracing::debug!(pid = pid, "Killing dev server process group on drop");
        // SAFETY: signalling a process group we created has no memory effects.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut cmd = std::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    // Own process group, so package-manager wrappers can be stopped together
    // with the server they spawn.
    cmd.process_group(0);
    Command::from(cmd)
}

#[cfg(not(unix))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(unix)]
async fn terminate(child: &mut Child) -> Result<()> {
    if let Some(pid) = child.id() {
        let group = pid as libc::pid_t;
        // SAFETY: signalling a process group we created has no memory effects.
        unsafe {
            libc::killpg(group, libc::SIGTERM);
        }

        let graceful = Duration::from_secs(GRACEFUL_STOP_SECS);
        if let Ok(status) = tokio::time::timeout(graceful, child.wait()).await {
            let status = status?;
            tracing::debug!(status = %status, "Dev server exited");
            return Ok(());
        }

        tracing::warn!(pid = pid, "Dev server ignored SIGTERM, killing");
        unsafe {
            libc::killpg(group, libc::SIGKILL);
        }
    }

    child.kill().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) -> Result<()> {
    child.kill().await?;
    Ok(())
}

/// Logs every output line and reports the first local URL found.
async fn relay_output<R>(stream: R, source: &'static str, urls: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut announced = false;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = strip_ansi(&String::from_utf8_lossy(&buf));
                let line = line.trim_end();
                tracing::debug!(stream = source, "[dev-server] {}", line);

                if !announced {
                    if let Some(url) = find_local_url(line) {
                        announced = true;
                        let _ = urls.try_send(url);
                    }
                }
            }
            Err(e) => {
                tracing::debug!(stream = source, error = %e, "Dev server output closed");
                break;
            }
        }
    }
}

fn strip_ansi(line: &str) -> String {
    ANSI_RE.replace_all(line, "").into_owned()
}

/// Finds the first loopback URL in a line of dev-server output.
///
/// `0.0.0.0` is a bind address, not a destination, so it is rewritten to
/// `127.0.0.1`.
fn find_local_url(line: &str) -> Option<String> {
    let found = LOCAL_URL_RE.find(line)?.as_str();
    let found = found.trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | '\'' | '"'));
    Some(found.replacen("0.0.0.0", "127.0.0.1", 1))
}

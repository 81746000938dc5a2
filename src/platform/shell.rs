//! Last-resort deletion through the OS shell.
//!
//! Each fallback spawns an external process and waits for it with a hard
//! timeout; a process still running at the deadline is killed so a hung
//! utility can never hang the deletion engine.
//!
//! Windows ships two stages (`del /F /Q`, then PowerShell `Remove-Item -Force`).
//! Other targets ship none; the engine then simply skips the final rung.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A platform capability able to force-delete a single file.
pub trait PlatformFallback: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Attempt to delete `path`, giving up after `timeout`.
    fn force_delete(&self, path: &Path, timeout: Duration) -> io::Result<()>;
}

/// Shell utilities usable as a [`PlatformFallback`].
#[derive(Debug, Clone)]
pub enum ShellFallback {
    /// `cmd /C del /F /Q "<path>"`
    CmdDel,
    /// `powershell -NoProfile -NonInteractive -Command Remove-Item -LiteralPath '<path>' -Force`
    PowerShellRemoveItem,
    /// Arbitrary program; the path is appended as the final argument.
    Program { program: OsString, args: Vec<OsString> },
}

impl ShellFallback {
    fn command(&self, path: &Path) -> Command {
        match self {
            ShellFallback::CmdDel => {
                let mut cmd = Command::new("cmd");
                #[cfg(windows)]
                {
                    use std::os::windows::process::CommandExt;
                    // cmd.exe does its own parsing; hand it the quoted path verbatim.
                    cmd.raw_arg("/C del /F /Q");
                    cmd.raw_arg(format!("\"{}\"", path.display()));
                }
                #[cfg(not(windows))]
                {
                    cmd.args(["/C", "del", "/F", "/Q"]).arg(path);
                }
                cmd
            }
            ShellFallback::PowerShellRemoveItem => {
                let literal = path.display().to_string().replace('\'', "''");
                let mut cmd = Command::new("powershell");
                cmd.args(["-NoProfile", "-NonInteractive", "-Command"]).arg(format!(
                    "Remove-Item -LiteralPath '{literal}' -Force -ErrorAction Stop"
                ));
                cmd
            }
            ShellFallback::Program { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args).arg(path);
                cmd
            }
        }
    }
}

impl PlatformFallback for ShellFallback {
    fn name(&self) -> &str {
        match self {
            ShellFallback::CmdDel => "cmd-del",
            ShellFallback::PowerShellRemoveItem => "powershell-remove-item",
            ShellFallback::Program { .. } => "program",
        }
    }

    fn force_delete(&self, path: &Path, timeout: Duration) -> io::Result<()> {
        debug!(fallback = self.name(), path = %path.display(), ?timeout, "shell delete");
        let status = run_with_timeout(self.command(path), timeout)?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{} exited with {status}", self.name())))
        }
    }
}

/// One rung of the shell stage: a fallback and the timeout it runs under.
#[derive(Clone)]
pub struct FallbackStep {
    pub fallback: Arc<dyn PlatformFallback>,
    pub timeout: Duration,
}

impl fmt::Debug for FallbackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackStep")
            .field("fallback", &self.fallback.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Fallbacks for the current target: two Windows stages, none elsewhere.
pub fn default_fallbacks(primary: Duration, escalated: Duration) -> Vec<FallbackStep> {
    if cfg!(windows) {
        vec![
            FallbackStep {
                fallback: Arc::new(ShellFallback::CmdDel),
                timeout: primary,
            },
            FallbackStep {
                fallback: Arc::new(ShellFallback::PowerShellRemoveItem),
                timeout: escalated,
            },
        ]
    } else {
        let _ = (primary, escalated);
        Vec::new()
    }
}

/// Spawn `cmd` with null stdio and wait at most `timeout` for it to exit.
/// On expiry the child is killed and reaped, and `TimedOut` is returned.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> io::Result<ExitStatus> {
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    let mut child = cmd.spawn()?;
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        let now = Instant::now();
        if now >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            warn!(?timeout, "external delete command timed out; killed");
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("command timed out after {timeout:?}"),
            ));
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

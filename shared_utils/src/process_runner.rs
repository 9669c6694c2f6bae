//! External process runner with output draining and cancellation.
//!
//! Both stdout and stderr are piped and consumed on their own threads, so a
//! chatty tool can never fill a pipe buffer and stall. The parent polls the
//! child and kills it as soon as the shared [`CancelToken`] trips.
//!
//! On Unix the child leads its own process group, so a cancel also reaches
//! anything a wrapper script started (`sh` launching the real binary).
//!
//! ```ignore
//! use shared_utils::process_runner::{run_command, CancelToken};
//! use std::process::Command;
//!
//! let cancel = CancelToken::new();
//! let mut cmd = Command::new("maketx");
//! cmd.arg("-o").arg("out.tx").arg("in.exr");
//! let output = run_command(&mut cmd, &cancel)?;
//! if !output.success() {
//!     eprintln!("{}", output.stderr);
//! }
//! ```

use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long a killed process gets to release its pipes before its output
/// is abandoned.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Captured result of one child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal or killed.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub cancelled: bool,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == Some(0)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            debug!(error = %e, bytes = buf.len(), "Pipe read ended early");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a drain thread. With a deadline, a thread still blocked on a pipe
/// held open by a stray process is left behind and yields nothing.
fn collect(handle: Option<JoinHandle<String>>, deadline: Option<Instant>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    if let Some(deadline) = deadline {
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                debug!("Output pipe still open after kill, dropping its contents");
                return String::new();
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
    handle.join().unwrap_or_default()
}

/// A spawned child whose output is being drained in the background.
pub struct ManagedProcess {
    child: Child,
    stdout_thread: Option<JoinHandle<String>>,
    stderr_thread: Option<JoinHandle<String>>,
    started: Instant,
}

impl ManagedProcess {
    /// Spawn `cmd` with piped stdout/stderr and a closed stdin.
    pub fn spawn(cmd: &mut Command) -> Result<Self> {
        debug!(command = ?cmd, "Spawning external process");

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn process: {:?}", cmd.get_program()))?;

        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        Ok(Self {
            child,
            stdout_thread,
            stderr_thread,
            started: Instant::now(),
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.child
            .try_wait()
            .context("Failed to check process status")
    }

    /// Kill the child and, on Unix, every process in its group.
    pub fn kill(&mut self) -> Result<()> {
        #[cfg(unix)]
        {
            let pgid = self.child.id() as libc::pid_t;
            // SAFETY: plain syscall; the group was created at spawn and a
            // negative pid addresses exactly that group.
            if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
                return Ok(());
            }
            debug!(
                pid = pgid,
                error = %std::io::Error::last_os_error(),
                "Process group kill failed, killing the child alone"
            );
        }
        self.child.kill().context("Failed to kill process")
    }

    /// Wait for the child, killing it if `cancel` trips first.
    pub fn wait_cancellable(mut self, cancel: &CancelToken) -> Result<ProcessOutput> {
        let mut cancelled = false;

        let status = loop {
            if let Some(status) = self.try_wait()? {
                break status;
            }
            if cancel.is_cancelled() {
                cancelled = true;
                if let Err(e) = self.kill() {
                    warn!(pid = self.id(), error = %e, "Failed to kill cancelled process");
                }
                break self.child.wait().context("Failed to reap killed process")?;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let deadline = cancelled.then(|| Instant::now() + DRAIN_GRACE);
        let stdout = collect(self.stdout_thread.take(), deadline);
        let stderr = collect(self.stderr_thread.take(), deadline);

        Ok(ProcessOutput {
            exit_code: if cancelled { None } else { status.code() },
            stdout,
            stderr,
            duration: self.started.elapsed(),
            cancelled,
        })
    }
}

/// Spawn and wait in one step.
pub fn run_command(cmd: &mut Command, cancel: &CancelToken) -> Result<ProcessOutput> {
    ManagedProcess::spawn(cmd)?.wait_cancellable(cancel)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_captures_both_streams() {
        let out = run_command(&mut sh("echo hello; echo oops >&2"), &CancelToken::new()).unwrap();
        assert!(out.success());
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_non_zero_exit_is_not_success() {
        let out = run_command(&mut sh("exit 3"), &CancelToken::new()).unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.cancelled);
    }

    #[test]
    fn test_large_stderr_does_not_deadlock() {
        let script = "i=0; while [ $i -lt 4000 ]; do echo 'line of diagnostic output padding' >&2; i=$((i+1)); done";
        let out = run_command(&mut sh(script), &CancelToken::new()).unwrap();
        assert!(out.success());
        assert!(out.stderr.lines().count() >= 4000);
    }

    #[test]
    fn test_cancel_kills_running_process() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let out = run_command(&mut sh("exec sleep 30"), &cancel).unwrap();
        handle.join().unwrap();

        assert!(out.cancelled);
        assert!(!out.success());
        assert_eq!(out.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_cancel_reaches_wrapped_process() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 2; touch '{}'; echo done", marker.display());

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            trigger.cancel();
        });

        let started = Instant::now();
        let out = run_command(&mut sh(&script), &cancel).unwrap();
        handle.join().unwrap();

        assert!(out.cancelled);
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert!(!out.stdout.contains("done"));

        thread::sleep(Duration::from_millis(2500));
        assert!(!marker.exists(), "the wrapped sleep outlived the cancel");
    }

    /// Hands out one chunk, then fails like a broken pipe.
    struct FailingPipe(Option<&'static [u8]>);

    impl Read for FailingPipe {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.take() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                None => Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone")),
            }
        }
    }

    #[test]
    fn test_drain_keeps_output_read_before_error() {
        let text = drain(FailingPipe(Some(b"maketx: reading"))).join().unwrap();
        assert_eq!(text, "maketx: reading");
    }

    #[test]
    fn test_spawn_missing_binary_errors() {
        let mut cmd = Command::new("definitely_not_a_texture_tool_xyz");
        assert!(run_command(&mut cmd, &CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}

//! Command executor trait and the OS-backed implementation.
//!
//! The [`CommandExecutor`] trait is the only place processes are spawned.
//! It streams output lines back over a channel and returns the exit status;
//! buffering, callbacks and console output live in the runner, so they can
//! be tested against a fake executor.
//!
//! [`SystemExecutor`] drains stdout and stderr on their own threads while the
//! calling thread relays their lines and waits for the child, so a chatty
//! child never blocks on a full pipe buffer.
//!
//! ## Timeouts
//!
//! The reader threads are detached. A shell child can leave a grandchild
//! behind that still holds the pipes open after the shell itself is killed;
//! the deadline bounds [`SystemExecutor`] regardless, and the orphaned
//! readers exit once their pipe closes or their next line finds nobody
//! listening. The grandchild itself is not signalled.

use super::quote;
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

/// Exit status reported when the program could not be found.
pub const STATUS_NOT_FOUND: i32 = 127;
/// Exit status reported when the program could not be executed.
pub const STATUS_NOT_EXECUTABLE: i32 = 126;
/// Exit status reported when the command ran past its timeout.
pub const STATUS_TIMED_OUT: i32 = 124;

/// Everything needed to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub exe: String,
    pub argv: Vec<String>,
    /// Added to (or overriding) the inherited environment.
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub shell: bool,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(exe: impl Into<String>) -> Self {
        Self {
            exe: exe.into(),
            argv: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            shell: true,
            timeout: None,
        }
    }

    /// The command line as the platform shell will see it.
    #[cfg(not(windows))]
    pub fn command_line(&self) -> String {
        quote::command_line(&self.exe, &self.argv)
    }

    /// The command line as the platform shell will see it.
    #[cfg(windows)]
    pub fn command_line(&self) -> String {
        quote::cmd_command_line(&self.exe, &self.argv)
    }
}

/// A line of child output, tagged with the stream it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Stdout(String),
    Stderr(String),
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for child process: {0}")]
    Wait(io::Error),
    #[error("command timed out after {0:?}")]
    TimedOut(Duration),
    #[error("command executor panicked")]
    Panicked,
}

impl ExecError {
    /// Exit status reported for this failure.
    pub fn status(&self) -> i32 {
        match self {
            ExecError::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => STATUS_NOT_FOUND,
                io::ErrorKind::PermissionDenied => STATUS_NOT_EXECUTABLE,
                _ => 1,
            },
            ExecError::TimedOut(_) => STATUS_TIMED_OUT,
            ExecError::Wait(_) | ExecError::Panicked => 1,
        }
    }
}

/// Runs one command to completion.
///
/// Implementations send every output line on `events` in the order it was
/// read from its stream, and drop all senders before returning.
pub trait CommandExecutor: Sync {
    fn execute(&self, spec: &CommandSpec, events: Sender<ExecEvent>) -> Result<i32, ExecError>;
}

/// Spawns real processes through `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, spec: &CommandSpec, events: Sender<ExecEvent>) -> Result<i32, ExecError> {
        let mut command = build_command(spec);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = %spec.command_line(), shell = spec.shell, cwd = ?spec.cwd, "spawning");
        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.exe.clone(),
            source,
        })?;
        let deadline = spec.timeout.map(Deadline::new);

        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            spawn_reader(pipe, tx.clone(), ExecEvent::Stdout);
        }
        if let Some(pipe) = child.stderr.take() {
            spawn_reader(pipe, tx.clone(), ExecEvent::Stderr);
        }
        // Readers hold the remaining senders; the channel closes at EOF.
        drop(tx);

        loop {
            let received = match &deadline {
                Some(deadline) => rx.recv_timeout(deadline.remaining()),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match (received, &deadline) {
                (Ok(event), _) => {
                    // The runner stopped listening; keep draining so the child can exit.
                    let _ = events.send(event);
                }
                (Err(RecvTimeoutError::Disconnected), _) => break,
                (Err(RecvTimeoutError::Timeout), Some(deadline)) => {
                    kill_and_reap(&mut child);
                    return Err(ExecError::TimedOut(deadline.limit));
                }
                (Err(RecvTimeoutError::Timeout), None) => {}
            }
        }

        let status = wait_child(&mut child, deadline.as_ref())?;
        Ok(exit_code(status))
    }
}

/// A timeout and the instant it expires.
struct Deadline {
    limit: Duration,
    at: Instant,
}

impl Deadline {
    fn new(limit: Duration) -> Self {
        Self {
            limit,
            at: Instant::now() + limit,
        }
    }

    fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

fn spawn_reader<R>(pipe: R, tx: Sender<ExecEvent>, wrap: fn(String) -> ExecEvent)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || forward_lines(pipe, &tx, wrap));
}

fn build_command(spec: &CommandSpec) -> Command {
    let mut command = if spec.shell {
        shell_command(&spec.command_line())
    } else {
        let mut command = Command::new(&spec.exe);
        command.args(&spec.argv);
        command
    };
    command.envs(&spec.env);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    command
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;
    // `cmd` parses its own command line; the standard argument escaping
    // would wrap the whole line in another layer of quotes.
    let mut command = Command::new("cmd");
    command.arg("/C").raw_arg(line);
    command
}

/// Wait for the child, killing it when the deadline passes or waiting fails.
fn wait_child(child: &mut Child, deadline: Option<&Deadline>) -> Result<ExitStatus, ExecError> {
    let waited = match deadline {
        Some(deadline) => match child.wait_timeout(deadline.remaining()) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => Err(ExecError::TimedOut(deadline.limit)),
            Err(e) => Err(ExecError::Wait(e)),
        },
        None => child.wait().map_err(ExecError::Wait),
    };
    if waited.is_err() {
        kill_and_reap(child);
    }
    waited
}

fn kill_and_reap(child: &mut Child) {
    // Either call fails only when the child is already gone.
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Send each line of `pipe` until EOF. Line endings are stripped and invalid
/// UTF-8 is replaced rather than dropped.
fn forward_lines<R: Read>(pipe: R, tx: &Sender<ExecEvent>, wrap: fn(String) -> ExecEvent) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.ends_with(b"\n") {
                    buf.pop();
                    if buf.ends_with(b"\r") {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "pipe read failed");
                break;
            }
        }
    }
}

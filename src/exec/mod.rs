//! External command runner.
//!
//! Build steps shell out to tools (copiers, CSS compilers, generators)
//! through [`ProcessRunner::run`]. One [`ProcessOptions`] value goes in and
//! one [`ProcessOutput`] comes out; a failed command is a non-zero `status`,
//! never an `Err`. That includes commands that could not be started at all.
//!
//! ## Output Handling
//!
//! Each stream has an [`OutputMode`]:
//!
//! | Mode | Appended to output | Console | Callback |
//! |------|--------------------|---------|----------|
//! | `Silent` | yes | no | no |
//! | `Log` | yes | yes, unless `quiet` | no |
//! | `Callback(f)` | yes | no | yes, once per line |
//!
//! `quiet` silences the console entirely: logged lines, progress markers and
//! the dry-run command echo. Lines are still collected and callbacks still
//! fire.
//!
//! When a command cannot be run to completion (it failed to start, timed
//! out, or the executor died), a description is delivered as one more
//! stderr line through `on_error`.
//!
//! ## Progress
//!
//! [`ProgressMode`] drives a heartbeat at the runner's progress interval for
//! as long as the child runs, independent of output arriving. The heartbeat
//! is part of the collection loop, so it stops when the loop ends.
//!
//! ## Dry Run
//!
//! With `dryrun` set nothing is spawned. The command line is echoed (unless
//! `quiet`) and an empty, successful output is returned immediately.

pub mod console;
pub mod executor;
pub mod quote;

pub use console::{Console, StdConsole};
pub use executor::{CommandExecutor, CommandSpec, ExecError, ExecEvent, SystemExecutor};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time between progress heartbeats.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// What to do with each line of a child stream.
#[derive(Default)]
pub enum OutputMode {
    /// Collect only.
    #[default]
    Silent,
    /// Collect and echo to the console.
    Log,
    /// Collect and hand each line to the callback as it arrives.
    Callback(Box<dyn FnMut(&str) + Send>),
}

impl OutputMode {
    pub fn callback(f: impl FnMut(&str) + Send + 'static) -> Self {
        OutputMode::Callback(Box::new(f))
    }
}

impl From<bool> for OutputMode {
    fn from(log: bool) -> Self {
        if log { OutputMode::Log } else { OutputMode::Silent }
    }
}

impl fmt::Debug for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Silent => f.write_str("Silent"),
            OutputMode::Log => f.write_str("Log"),
            OutputMode::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Heartbeat behavior while the child runs.
#[derive(Default)]
pub enum ProgressMode {
    #[default]
    Off,
    /// Write the progress marker to the console.
    Marker,
    Callback(Box<dyn FnMut() + Send>),
}

impl ProgressMode {
    pub fn callback(f: impl FnMut() + Send + 'static) -> Self {
        ProgressMode::Callback(Box::new(f))
    }
}

impl From<bool> for ProgressMode {
    fn from(marker: bool) -> Self {
        if marker { ProgressMode::Marker } else { ProgressMode::Off }
    }
}

impl fmt::Debug for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressMode::Off => f.write_str("Off"),
            ProgressMode::Marker => f.write_str("Marker"),
            ProgressMode::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// One command invocation and how to report on it.
#[derive(Debug)]
pub struct ProcessOptions {
    pub exe: String,
    pub argv: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub on_data: OutputMode,
    pub on_error: OutputMode,
    pub on_progress: ProgressMode,
    pub dryrun: bool,
    pub quiet: bool,
    /// Run through `sh -c` (`cmd /C` on windows). On by default.
    pub shell: bool,
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    pub fn new(exe: impl Into<String>) -> Self {
        Self {
            exe: exe.into(),
            argv: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            on_data: OutputMode::Silent,
            on_error: OutputMode::Silent,
            on_progress: ProgressMode::Off,
            dryrun: false,
            quiet: false,
            shell: true,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn on_data(mut self, mode: impl Into<OutputMode>) -> Self {
        self.on_data = mode.into();
        self
    }

    pub fn on_error(mut self, mode: impl Into<OutputMode>) -> Self {
        self.on_error = mode.into();
        self
    }

    pub fn on_progress(mut self, mode: impl Into<ProgressMode>) -> Self {
        self.on_progress = mode.into();
        self
    }

    pub fn dryrun(mut self, dryrun: bool) -> Self {
        self.dryrun = dryrun;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_parts(self) -> (CommandSpec, Handlers) {
        let spec = CommandSpec {
            exe: self.exe,
            argv: self.argv,
            env: self.env,
            cwd: self.cwd,
            shell: self.shell,
            timeout: self.timeout,
        };
        let handlers = Handlers {
            on_data: self.on_data,
            on_error: self.on_error,
            on_progress: self.on_progress,
            quiet: self.quiet,
        };
        (spec, handlers)
    }
}

/// Collected result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Stdout lines in emission order.
    pub output: Vec<String>,
    /// Stderr lines in emission order, plus a message if the command could
    /// not be run to completion.
    pub errors: Vec<String>,
    pub status: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

struct Handlers {
    on_data: OutputMode,
    on_error: OutputMode,
    on_progress: ProgressMode,
    quiet: bool,
}

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

impl Handlers {
    fn line<C: Console>(&mut self, console: &C, stream: Stream, line: String, out: &mut ProcessOutput) {
        let (mode, sink) = match stream {
            Stream::Out => (&mut self.on_data, &mut out.output),
            Stream::Err => (&mut self.on_error, &mut out.errors),
        };
        match mode {
            OutputMode::Callback(f) => f(&line),
            OutputMode::Log if !self.quiet => match stream {
                Stream::Out => console.out(&line),
                Stream::Err => console.err(&line),
            },
            OutputMode::Log | OutputMode::Silent => {}
        }
        sink.push(line);
    }

    fn progress_enabled(&self) -> bool {
        match self.on_progress {
            ProgressMode::Off => false,
            ProgressMode::Marker => !self.quiet,
            ProgressMode::Callback(_) => true,
        }
    }

    fn tick<C: Console>(&mut self, console: &C) {
        match &mut self.on_progress {
            ProgressMode::Callback(f) => f(),
            ProgressMode::Marker if !self.quiet => console.progress(),
            ProgressMode::Marker | ProgressMode::Off => {}
        }
    }
}

/// Fixed-rate deadline tracker for progress ticks.
struct Heartbeat {
    interval: Duration,
    next: Option<Instant>,
}

impl Heartbeat {
    fn new(interval: Duration, enabled: bool) -> Self {
        Self {
            interval,
            next: enabled.then(|| Instant::now() + interval),
        }
    }

    /// Time left until the next tick, or `None` when disabled.
    fn remaining(&self) -> Option<Duration> {
        self.next
            .map(|next| next.saturating_duration_since(Instant::now()))
    }

    fn due(&mut self) -> bool {
        match self.next {
            Some(next) if Instant::now() >= next => {
                self.next = Some(Instant::now() + self.interval);
                true
            }
            _ => false,
        }
    }
}

/// Runs commands through an executor, reporting to a console.
pub struct ProcessRunner<E = SystemExecutor, C = StdConsole> {
    executor: E,
    console: C,
    progress_interval: Duration,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::with_parts(SystemExecutor, StdConsole::default())
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor, C: Console> ProcessRunner<E, C> {
    pub fn with_parts(executor: E, console: C) -> Self {
        Self {
            executor,
            console,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Run one command to completion and collect its output.
    pub fn run(&self, options: ProcessOptions) -> ProcessOutput {
        let dryrun = options.dryrun;
        let (spec, mut handlers) = options.into_parts();

        if dryrun {
            let line = spec.command_line();
            debug!(command = %line, "dry run");
            if !handlers.quiet {
                self.console.command(&line);
            }
            return ProcessOutput::default();
        }

        let mut result = ProcessOutput::default();
        let (tx, rx) = mpsc::channel();
        let executor = &self.executor;
        let spec = &spec;

        let outcome = thread::scope(|scope| {
            let worker = scope.spawn(move || executor.execute(spec, tx));
            let mut heartbeat = Heartbeat::new(self.progress_interval, handlers.progress_enabled());

            loop {
                let received = match heartbeat.remaining() {
                    Some(wait) => rx.recv_timeout(wait),
                    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                match received {
                    Ok(ExecEvent::Stdout(line)) => {
                        handlers.line(&self.console, Stream::Out, line, &mut result)
                    }
                    Ok(ExecEvent::Stderr(line)) => {
                        handlers.line(&self.console, Stream::Err, line, &mut result)
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                if heartbeat.due() {
                    handlers.tick(&self.console);
                }
            }

            worker.join().unwrap_or(Err(ExecError::Panicked))
        });

        match outcome {
            Ok(status) => {
                debug!(command = %spec.exe, status, "command finished");
                result.status = status;
            }
            Err(err) => {
                warn!(command = %spec.exe, error = %err, "command failed to run");
                result.status = err.status();
                handlers.line(&self.console, Stream::Err, err.to_string(), &mut result);
            }
        }
        result
    }

    /// Run independent commands in parallel. Results keep the input order.
    pub fn run_all(&self, batch: Vec<ProcessOptions>) -> Vec<ProcessOutput> {
        batch.into_par_iter().map(|options| self.run(options)).collect()
    }
}

/// Run one command with the system executor and the standard console.
pub fn run(options: ProcessOptions) -> ProcessOutput {
    ProcessRunner::new().run(options)
}

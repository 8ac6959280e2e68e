//! Shared test utilities for the yaspp test suite.
//!
//! Provides a sample navigation store, small builders for nav values, and
//! fakes for the process runner's two seams: a scripted [`CommandExecutor`]
//! and a console that records what would have been printed.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let runner = ProcessRunner::with_parts(
//!     ScriptedExecutor::exit(0).stdout("hello"),
//!     RecordingConsole::default(),
//! );
//! let output = runner.run(ProcessOptions::new("echo").on_data(true));
//! assert_eq!(runner.console().lines(), vec![ConsoleLine::Out("hello".into())]);
//! ```

use std::io;
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::exec::{CommandExecutor, CommandSpec, Console, ExecError, ExecEvent};
use crate::nav::{LocaleTitles, NavData, NavGroup, NavItem, NavItemData, NavSectionData};

// =========================================================================
// Navigation fixtures
// =========================================================================

fn locale(pairs: &[(&str, &str)]) -> LocaleTitles {
    pairs
        .iter()
        .map(|(lang, title)| (lang.to_string(), title.to_string()))
        .collect()
}

/// A plain page item with no translations.
pub fn nav_item(id: &str, title: &str) -> NavItem {
    NavItem {
        id: id.to_string(),
        data: NavItemData {
            kind: "page".to_string(),
            title: title.to_string(),
            url: format!("/{id}"),
            locale: LocaleTitles::new(),
            icon: None,
            target: None,
        },
    }
}

pub fn group(items: &[&str]) -> NavGroup {
    NavGroup {
        items: items.iter().map(|s| s.to_string()).collect(),
    }
}

/// A small valid navigation store:
///
/// ```text
/// main (group)
/// ├── basics (section, he)
/// │   ├── intro (he)
/// │   └── setup
/// └── more (group)
///     └── links (section)
///         └── repo (he, external)
/// ```
pub fn sample_nav() -> NavData {
    let mut data = NavData::default();

    data.items.insert(
        "intro".into(),
        NavItemData {
            kind: "page".into(),
            title: "Introduction".into(),
            url: "/docs/intro".into(),
            locale: locale(&[("he", "מבוא")]),
            icon: None,
            target: None,
        },
    );
    data.items.insert(
        "setup".into(),
        NavItemData {
            kind: "page".into(),
            title: "Setup".into(),
            url: "/docs/setup".into(),
            locale: LocaleTitles::new(),
            icon: None,
            target: None,
        },
    );
    data.items.insert(
        "repo".into(),
        NavItemData {
            kind: "link".into(),
            title: "Repository".into(),
            url: "https://example.com/yaspp".into(),
            locale: locale(&[("he", "מאגר")]),
            icon: Some("github".into()),
            target: Some("_blank".into()),
        },
    );

    data.sections.insert(
        "basics".into(),
        NavSectionData {
            title: "Basics".into(),
            locale: locale(&[("he", "יסודות")]),
            items: vec!["intro".into(), "setup".into()],
        },
    );
    data.sections.insert(
        "links".into(),
        NavSectionData {
            title: "Links".into(),
            locale: LocaleTitles::new(),
            items: vec!["repo".into()],
        },
    );

    data.groups.insert("main".into(), group(&["basics", "more"]));
    data.groups.insert("more".into(), group(&["links"]));
    data
}

// =========================================================================
// Process runner fakes
// =========================================================================

/// How a [`ScriptedExecutor`] finishes.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Exit(i32),
    SpawnFails(io::ErrorKind),
    TimesOut(Duration),
    Panics,
}

/// Executor that records each command and replays scripted output.
///
/// Uses Mutex (not RefCell) so it is Sync and works with `run_all`.
pub struct ScriptedExecutor {
    events: Vec<ExecEvent>,
    outcome: ScriptedOutcome,
    hold: Duration,
    echo_args: bool,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedExecutor {
    pub fn new(outcome: ScriptedOutcome) -> Self {
        Self {
            events: Vec::new(),
            outcome,
            hold: Duration::ZERO,
            echo_args: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn exit(status: i32) -> Self {
        Self::new(ScriptedOutcome::Exit(status))
    }

    /// Exits 0 after writing each argument as a stdout line.
    pub fn echo_args() -> Self {
        Self {
            echo_args: true,
            ..Self::exit(0)
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.events.push(ExecEvent::Stdout(line.to_string()));
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.events.push(ExecEvent::Stderr(line.to_string()));
        self
    }

    /// Keep "running" this long after the scripted output.
    pub fn hold(mut self, duration: Duration) -> Self {
        self.hold = duration;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, spec: &CommandSpec, events: Sender<ExecEvent>) -> Result<i32, ExecError> {
        self.calls.lock().unwrap().push(spec.clone());

        if let ScriptedOutcome::SpawnFails(kind) = &self.outcome {
            return Err(ExecError::Spawn {
                program: spec.exe.clone(),
                source: io::Error::from(*kind),
            });
        }

        let echoed = self
            .echo_args
            .then(|| spec.argv.iter().cloned().map(ExecEvent::Stdout).collect::<Vec<_>>())
            .unwrap_or_default();
        for event in echoed.into_iter().chain(self.events.iter().cloned()) {
            let _ = events.send(event);
        }
        if !self.hold.is_zero() {
            thread::sleep(self.hold);
        }

        match &self.outcome {
            ScriptedOutcome::Exit(status) => Ok(*status),
            ScriptedOutcome::TimesOut(limit) => Err(ExecError::TimedOut(*limit)),
            ScriptedOutcome::Panics => panic!("scripted executor panic"),
            ScriptedOutcome::SpawnFails(_) => unreachable!(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Out(String),
    Err(String),
    Progress,
    Command(String),
}

/// Console that records lines instead of printing them.
#[derive(Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.lock().unwrap().clone()
    }
}

impl Console for RecordingConsole {
    fn out(&self, line: &str) {
        self.lines.lock().unwrap().push(ConsoleLine::Out(line.to_string()));
    }

    fn err(&self, line: &str) {
        self.lines.lock().unwrap().push(ConsoleLine::Err(line.to_string()));
    }

    fn progress(&self) {
        self.lines.lock().unwrap().push(ConsoleLine::Progress);
    }

    fn command(&self, command_line: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(ConsoleLine::Command(command_line.to_string()));
    }
}

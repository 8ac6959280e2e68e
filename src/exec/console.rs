//! Console capability handed to the process runner.
//!
//! The runner never prints on its own: every visible line goes through a
//! [`Console`], so tests can record output instead of scraping stdout.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Marker printed on each progress heartbeat by [`StdConsole`].
pub const PROGRESS_MARKER: &str = ".";

pub trait Console: Send + Sync {
    /// A line the child wrote to stdout.
    fn out(&self, line: &str);
    /// A line the child wrote to stderr.
    fn err(&self, line: &str);
    /// One progress heartbeat.
    fn progress(&self);
    /// The command line a dry run would have executed.
    fn command(&self, command_line: &str);
}

/// Writes to the process's own stdout/stderr.
///
/// Progress markers accumulate on one stdout line. The next line printed on
/// either stream starts on a fresh line.
#[derive(Debug, Default)]
pub struct StdConsole {
    marker_open: AtomicBool,
}

impl StdConsole {
    fn write_marker(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(PROGRESS_MARKER.as_bytes())?;
        w.flush()?;
        self.marker_open.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Terminate a run of progress markers, if one is open.
    fn end_marker_line(&self, w: &mut impl Write) -> io::Result<()> {
        if self.marker_open.swap(false, Ordering::Relaxed) {
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}

// Console write failures are not worth failing the command over.
impl Console for StdConsole {
    fn out(&self, line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = self.end_marker_line(&mut stdout);
        let _ = writeln!(stdout, "{line}");
    }

    fn err(&self, line: &str) {
        let _ = self.end_marker_line(&mut io::stdout().lock());
        let _ = writeln!(io::stderr().lock(), "{line}");
    }

    fn progress(&self) {
        let _ = self.write_marker(&mut io::stdout().lock());
    }

    fn command(&self, command_line: &str) {
        let mut stdout = io::stdout().lock();
        let _ = self.end_marker_line(&mut stdout);
        let _ = writeln!(stdout, "$ {command_line}");
    }
}

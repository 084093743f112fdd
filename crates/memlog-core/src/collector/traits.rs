//! Abstractions for running the external device-bridge tool.
//!
//! The `CommandRunner` trait lets the collector talk to a real `adb` binary
//! or to a scripted mock, so collection logic can be tested without a device.

use std::fmt;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::util::format_interval;

/// Failure of a single external command invocation.
///
/// Every variant is transient from the sampler's point of view: the cycle is
/// skipped and retried on the next tick.
#[derive(Debug)]
pub enum CommandError {
    /// The executable could not be found.
    NotFound(String),
    /// Spawning the process or reading its pipes failed.
    Io(io::Error),
    /// The process exited unsuccessfully. `code` is `None` when it was
    /// terminated by a signal.
    NonZeroExit { code: Option<i32>, stderr: String },
    /// The tool did not finish within the allotted time and was killed.
    TimedOut(Duration),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotFound(program) => write!(f, "executable '{}' not found", program),
            CommandError::Io(e) => write!(f, "I/O error: {}", e),
            CommandError::NonZeroExit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exited with status {}", code)?,
                    None => write!(f, "terminated by signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            CommandError::TimedOut(timeout) => {
                write!(f, "tool unresponsive after {}", format_interval(*timeout))
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Io(e)
    }
}

/// Runs an external program and captures its standard output as text.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, waiting at most `timeout`.
    ///
    /// # Returns
    /// Standard output decoded as UTF-8 (invalid sequences replaced), or a
    /// [`CommandError`] for a missing executable, I/O failure, unsuccessful
    /// exit or timeout.
    fn run(&self, program: &str, args: &[String], timeout: Duration)
    -> Result<String, CommandError>;
}

/// Real implementation backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// How often a running child is checked for completion.
    const POLL_STEP: Duration = Duration::from_millis(50);

    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, CommandError> {
        debug!("Running: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    CommandError::NotFound(program.to_string())
                } else {
                    CommandError::Io(e)
                }
            })?;

        // Pipes are drained concurrently so a chatty child never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let deadline = started + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CommandError::Io(e));
                }
            }
            if Instant::now() >= deadline {
                // Reader threads are left detached: a grandchild may still hold the pipes.
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut(timeout));
            }
            thread::sleep(Self::POLL_STEP.min(deadline.saturating_duration_since(Instant::now())));
        };
        trace!("{} finished in {:?} with {}", program, started.elapsed(), status);

        // The pipes stay open while any grandchild that inherited them is alive.
        let stdout = collect(&stdout, deadline, timeout)?;
        let stderr = collect(&stderr, deadline, timeout)?;

        if !status.success() {
            return Err(CommandError::NonZeroExit {
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // Nobody is listening once the caller has timed out.
        let _ = tx.send(result);
    });
    rx
}

fn collect(
    pipe: &Receiver<io::Result<Vec<u8>>>,
    deadline: Instant,
    timeout: Duration,
) -> Result<Vec<u8>, CommandError> {
    match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => Ok(result?),
        Err(RecvTimeoutError::Timeout) => {
            debug!("Output pipe still open after {}", format_interval(timeout));
            Err(CommandError::TimedOut(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other("pipe reader panicked").into())
        }
    }
}

//! In-memory command runner that replays scripted output.

use crate::collector::traits::{CommandError, CommandRunner};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Successful run printing the given text.
    Stdout(String),
    /// Unsuccessful exit with the given code and stderr.
    Exit { code: i32, stderr: String },
    /// Behave as if the executable does not exist.
    NotFound,
    /// Behave as if the tool hung past its timeout.
    TimedOut,
}

impl MockResponse {
    fn into_result(self, program: &str, timeout: Duration) -> Result<String, CommandError> {
        match self {
            MockResponse::Stdout(text) => Ok(text),
            MockResponse::Exit { code, stderr } => Err(CommandError::NonZeroExit {
                code: Some(code),
                stderr,
            }),
            MockResponse::NotFound => Err(CommandError::NotFound(program.to_string())),
            MockResponse::TimedOut => Err(CommandError::TimedOut(timeout)),
        }
    }
}

/// Command runner for tests.
///
/// Responses are keyed by the space-joined argument list (the program name is
/// ignored). A queued response is used once and takes priority over the
/// fixed one registered for the same arguments. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct MockRunner {
    fixed: HashMap<String, MockResponse>,
    queued: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockRunner {
    /// Creates a runner with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the response returned every time `args` is run.
    pub fn respond(&mut self, args: &[&str], response: MockResponse) {
        self.fixed.insert(args.join(" "), response);
    }

    /// Shorthand for a fixed successful response.
    pub fn respond_stdout(&mut self, args: &[&str], stdout: impl Into<String>) {
        self.respond(args, MockResponse::Stdout(stdout.into()));
    }

    /// Queues a one-shot response for `args`.
    pub fn enqueue(&self, args: &[&str], response: MockResponse) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.entry(args.join(" ")).or_default().push_back(response);
        }
    }

    /// Returns every argument list this runner was invoked with, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Returns the number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, CommandError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }

        let key = args.join(" ");
        let queued = self
            .queued
            .lock()
            .ok()
            .and_then(|mut q| q.get_mut(&key).and_then(VecDeque::pop_front));

        let response = queued
            .or_else(|| self.fixed.get(&key).cloned())
            .unwrap_or_else(|| MockResponse::Exit {
                code: 1,
                stderr: format!("no mock response for '{}'", key),
            });

        response.into_result(program, timeout)
    }
}

//! The polling loop: dump, extract, append, echo, sleep.
//!
//! Failures come in two levels. Setting up the sink ([`InitError`]) is fatal
//! and happens before a `Sampler` exists. Inside the loop a failed dump
//! ([`CycleError`]) skips the cycle and a failed write is only reported; the
//! loop keeps its schedule in both cases.
//!
//! [`InitError`]: crate::storage::InitError

use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::collector::{Collector, CommandRunner, CycleError};
use crate::storage::{CsvSink, Sample};
use crate::util::local_timestamp;

/// Sampler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Text written in place of a metric that was not found.
    pub missing: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            missing: "0".to_string(),
        }
    }
}

/// Counters accumulated over the sampler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub cycles: u64,
    pub rows_written: u64,
    pub skipped_cycles: u64,
    pub write_failures: u64,
}

/// Drives collection and output.
///
/// `E` receives the echo of every sample, the same line the CSV file gets; it is stdout unless
/// replaced with [`Sampler::with_echo`].
pub struct Sampler<R: CommandRunner, E: Write = Stdout> {
    collector: Collector<R>,
    sink: CsvSink,
    config: SamplerConfig,
    echo: E,
    clock: fn() -> String,
    stats: SamplerStats,
}

impl<R: CommandRunner> Sampler<R, Stdout> {
    pub fn new(collector: Collector<R>, sink: CsvSink, config: SamplerConfig) -> Self {
        Self {
            collector,
            sink,
            config,
            echo: io::stdout(),
            clock: local_timestamp,
            stats: SamplerStats::default(),
        }
    }
}

impl<R: CommandRunner, E: Write> Sampler<R, E> {
    /// Replaces the echo destination.
    pub fn with_echo<W: Write>(self, echo: W) -> Sampler<R, W> {
        Sampler {
            collector: self.collector,
            sink: self.sink,
            config: self.config,
            echo,
            clock: self.clock,
            stats: self.stats,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    pub fn collector(&self) -> &Collector<R> {
        &self.collector
    }

    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    pub fn echo(&self) -> &E {
        &self.echo
    }

    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    /// Runs one cycle without sleeping.
    ///
    /// A dump failure is logged once and returned; nothing is written. A
    /// failed CSV write is logged and the sample is still echoed and returned.
    pub fn run_cycle(&mut self) -> Result<Sample, CycleError> {
        self.stats.cycles += 1;

        let dumps = match self.collector.collect_dumps() {
            Ok(dumps) => dumps,
            Err(e) => {
                warn!("{}", e);
                self.stats.skipped_cycles += 1;
                return Err(e);
            }
        };

        let sample = Sample::from_dumps((self.clock)(), &dumps.app, &dumps.system);
        let missing = self.config.missing.as_str();

        match self.sink.append(&sample, missing) {
            Ok(()) => self.stats.rows_written += 1,
            Err(e) => {
                warn!("Failed to write record to {}: {}", self.sink.path().display(), e);
                self.stats.write_failures += 1;
            }
        }

        let echoed = sample
            .to_line(missing)
            .map_err(io::Error::from)
            .and_then(|line| writeln!(self.echo, "{}", line))
            .and_then(|()| self.echo.flush());
        if let Err(e) = echoed {
            debug!("Failed to echo sample: {}", e);
        }

        Ok(sample)
    }

    /// Runs cycles until `running` is cleared, sleeping the configured
    /// interval after each one.
    pub fn run(&mut self, running: &AtomicBool) -> SamplerStats {
        while running.load(Ordering::SeqCst) {
            self.run_cycle().ok();
            sleep_interruptible(self.config.interval, running);
        }
        self.stats
    }
}

/// Sleeps for `duration`, waking early once `running` is cleared.
///
/// Returns `false` when interrupted.
pub fn sleep_interruptible(duration: Duration, running: &AtomicBool) -> bool {
    let step = Duration::from_millis(100);
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let sleep_time = remaining.min(step);
        std::thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
    running.load(Ordering::SeqCst)
}

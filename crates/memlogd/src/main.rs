//! memlogd - Android app memory sampler.
//!
//! Polls `adb shell dumpsys meminfo` for one package and for the whole
//! device, and appends PSS total, Java heap and free RAM to a CSV file.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use memlog_core::collector::{BridgeConfig, Collector, DEFAULT_PACKAGE, SystemRunner};
use memlog_core::sampler::{Sampler, SamplerConfig};
use memlog_core::storage::CsvSink;
use memlog_core::util::{format_interval, parse_interval};

/// Android app memory sampler.
#[derive(Parser, Debug)]
#[command(name = "memlogd", about = "Android app memory sampler", version)]
struct Args {
    /// Package name of the app to sample.
    #[arg(short, long, env = "MEMLOG_PACKAGE", default_value = DEFAULT_PACKAGE)]
    package: String,

    /// CSV file to write. Truncated on start.
    #[arg(short, long, env = "MEMLOG_OUTPUT", default_value = "memory_log.csv")]
    output: PathBuf,

    /// Time between samples (e.g. "5s", "500ms", "2m", or bare seconds).
    #[arg(short, long, env = "MEMLOG_INTERVAL", default_value = "5s", value_parser = parse_interval)]
    interval: Duration,

    /// Path to the adb executable.
    #[arg(long, env = "MEMLOG_ADB", default_value = "adb")]
    adb: String,

    /// Serial of the device to query when several are attached.
    #[arg(short, long, env = "ANDROID_SERIAL")]
    serial: Option<String>,

    /// Maximum time a single adb invocation may take.
    #[arg(long, env = "MEMLOG_TIMEOUT", default_value = "30s", value_parser = parse_interval)]
    timeout: Duration,

    /// Text written for a metric that is not present in the dump.
    #[arg(long, default_value = "0")]
    missing: String,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            adb_path: self.adb.clone(),
            serial: self.serial.clone(),
            package: self.package.clone(),
            timeout: self.timeout,
        }
    }

    fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: self.interval,
            missing: self.missing.clone(),
        }
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
/// Logs go to stderr; stdout carries the banner and the sample echo.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["memlogd", "memlog_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Startup banner printed to stdout.
fn banner(package: &str, output: &str, interval: Duration) -> String {
    format!(
        "Starting memory log for '{}'.\n   Logging to '{}' every {}. Press Ctrl+C to stop.",
        package,
        output,
        format_interval(interval)
    )
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("memlogd {} starting", env!("CARGO_PKG_VERSION"));
    debug!(
        "Config: adb={}, serial={}, timeout={}, missing='{}'",
        args.adb,
        args.serial.as_deref().unwrap_or("<auto>"),
        format_interval(args.timeout),
        args.missing
    );

    let sink = match CsvSink::create(&args.output) {
        Ok(sink) => sink,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{}",
        banner(&args.package, &args.output.display().to_string(), args.interval)
    );

    let collector = Collector::new(SystemRunner::new(), args.bridge_config());
    let mut sampler = Sampler::new(collector, sink, args.sampler_config());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let stats = sampler.run(&running);

    info!(
        "Stopped after {} cycles: {} rows written, {} skipped, {} write failures",
        stats.cycles, stats.rows_written, stats.skipped_cycles, stats.write_failures
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn args_explicit_flags() {
        let args = Args::try_parse_from([
            "memlogd",
            "-p",
            "com.example.app",
            "-o",
            "/tmp/mem.csv",
            "-i",
            "1m30s",
            "--adb",
            "/opt/platform-tools/adb",
            "-s",
            "emulator-5554",
            "--timeout",
            "10s",
            "--missing",
            "NA",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        let bridge = args.bridge_config();
        assert_eq!(bridge.package, "com.example.app");
        assert_eq!(bridge.adb_path, "/opt/platform-tools/adb");
        assert_eq!(bridge.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(bridge.timeout, Duration::from_secs(10));

        let sampler = args.sampler_config();
        assert_eq!(sampler.interval, Duration::from_secs(90));
        assert_eq!(sampler.missing, "NA");
        assert_eq!(args.output, PathBuf::from("/tmp/mem.csv"));
    }

    #[test]
    fn args_reject_zero_interval() {
        let result = Args::try_parse_from(["memlogd", "--interval", "0s"]);
        assert!(result.is_err());
    }

    #[test]
    fn args_reject_unknown_unit() {
        let result = Args::try_parse_from(["memlogd", "--timeout", "3d"]);
        assert!(result.is_err());
    }

    #[test]
    fn banner_mentions_package_output_and_interval() {
        let text = banner(
            "com.google.android.youtube",
            "memory_log.csv",
            Duration::from_secs(5),
        );
        assert_eq!(
            text,
            "Starting memory log for 'com.google.android.youtube'.\n   \
             Logging to 'memory_log.csv' every 5s. Press Ctrl+C to stop."
        );
    }
}

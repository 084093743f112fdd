//! Collector that fetches the two memory dumps for one sampling cycle.

use std::fmt;
use std::time::Duration;

use crate::collector::traits::{CommandError, CommandRunner};

/// Package sampled when none is configured.
pub const DEFAULT_PACKAGE: &str = "com.google.android.youtube";

/// How the device bridge is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Path or name of the `adb` executable.
    pub adb_path: String,
    /// Device serial passed as `-s`; `None` lets `adb` pick the only device.
    pub serial: Option<String>,
    /// Application package whose memory is sampled.
    pub package: String,
    /// Upper bound for a single invocation.
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            serial: None,
            package: DEFAULT_PACKAGE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Raw text of both dumps taken in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeminfoDumps {
    pub app: String,
    pub system: String,
}

/// A cycle that could not produce a sample.
///
/// Recoverable: the sampler reports it and tries again on the next tick.
#[derive(Debug)]
pub enum CycleError {
    /// The app-scoped dump failed.
    AppDump(CommandError),
    /// The system-wide dump failed.
    SystemDump(CommandError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::AppDump(e) => {
                write!(f, "could not get app meminfo (is the app running?): {}", e)
            }
            CycleError::SystemDump(e) => write!(f, "could not get system meminfo: {}", e),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::AppDump(e) | CycleError::SystemDump(e) => Some(e),
        }
    }
}

/// Fetches memory dumps from a device through a [`CommandRunner`].
pub struct Collector<R: CommandRunner> {
    runner: R,
    config: BridgeConfig,
}

impl<R: CommandRunner> Collector<R> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `runner` - Command runner (real or mock)
    /// * `config` - How to reach the device and which package to sample
    pub fn new(runner: R, config: BridgeConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        if let Some(serial) = &self.config.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.extend(["shell", "dumpsys", "meminfo"].map(String::from));
        args
    }

    /// Arguments for the app-scoped dump.
    pub fn app_args(&self) -> Vec<String> {
        let mut args = self.base_args();
        args.push(self.config.package.clone());
        args
    }

    /// Arguments for the system-wide dump.
    pub fn system_args(&self) -> Vec<String> {
        self.base_args()
    }

    /// Runs `dumpsys meminfo <package>` on the device.
    pub fn app_meminfo(&self) -> Result<String, CommandError> {
        self.runner
            .run(&self.config.adb_path, &self.app_args(), self.config.timeout)
    }

    /// Runs the system-wide `dumpsys meminfo` on the device.
    pub fn system_meminfo(&self) -> Result<String, CommandError> {
        self.runner
            .run(&self.config.adb_path, &self.system_args(), self.config.timeout)
    }

    /// Fetches both dumps, app first. The system dump is not attempted when
    /// the app dump fails.
    pub fn collect_dumps(&self) -> Result<MeminfoDumps, CycleError> {
        let app = self.app_meminfo().map_err(CycleError::AppDump)?;
        let system = self.system_meminfo().map_err(CycleError::SystemDump)?;
        Ok(MeminfoDumps { app, system })
    }
}

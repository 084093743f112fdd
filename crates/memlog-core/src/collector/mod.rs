//! Memory dump collection through the Android device bridge.
//!
//! # Architecture
//!
//! ```text
//! Collector
//!  ├── app dump:    adb [-s SERIAL] shell dumpsys meminfo <package>
//!  └── system dump: adb [-s SERIAL] shell dumpsys meminfo
//!          │
//!   CommandRunner (trait)
//!    ├── SystemRunner  spawns the real tool, bounded by a timeout
//!    └── MockRunner    scripted output for tests (fixtures in `mock`)
//! ```
//!
//! The raw text is handed to [`dumpsys`] for metric extraction.
//!
//! # Usage
//!
//! ```
//! use memlog_core::collector::{BridgeConfig, Collector, MockRunner};
//!
//! let collector = Collector::new(MockRunner::typical_device(), BridgeConfig::default());
//! let dumps = collector.collect_dumps().unwrap();
//! assert!(dumps.app.contains("MEMINFO"));
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod dumpsys;
pub mod mock;
pub mod traits;

pub use collector::{BridgeConfig, Collector, CycleError, DEFAULT_PACKAGE, MeminfoDumps};
pub use mock::{MockResponse, MockRunner};
pub use traits::{CommandError, CommandRunner, SystemRunner};

//! memlog-core — shared library for the memlog sampler.
//!
//! Provides:
//! - `collector` — `adb` command runner, `dumpsys meminfo` extraction
//! - `storage` — sample model and the CSV sink
//! - `sampler` — the polling loop tying collector and sink together
//! - `util` — interval parsing/formatting and timestamps

pub mod collector;
pub mod sampler;
pub mod storage;
pub mod util;

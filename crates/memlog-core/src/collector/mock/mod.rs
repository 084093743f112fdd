//! Mock command runner for testing.
//!
//! This module provides `MockRunner` and pre-built `dumpsys meminfo`
//! scenarios for testing collectors without a connected device.

mod runner;
mod scenarios;

pub use runner::{MockResponse, MockRunner};
pub use scenarios::{
    APP_MEMINFO_NO_LABELS, APP_MEMINFO_TYPICAL, APP_NOT_RUNNING, SYSTEM_MEMINFO_TYPICAL,
};

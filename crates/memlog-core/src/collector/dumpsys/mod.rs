//! Metric extraction from `dumpsys meminfo` text.

pub mod parser;

pub use parser::{
    AppMeminfo, FREE_RAM, JAVA_HEAP, MetricPattern, PSS_TOTAL, SystemMeminfo, extract_first,
    parse_app_meminfo, parse_system_meminfo,
};

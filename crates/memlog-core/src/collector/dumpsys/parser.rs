//! Parsers for `dumpsys meminfo` output.
//!
//! These are pure functions over the captured text, so they are tested with
//! plain string inputs. Each metric is a labelled digit run; the first match
//! in document order wins and the digits are kept verbatim.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::storage::model::Metric;

/// A literal label followed by whitespace and a run of decimal digits.
#[derive(Debug, Clone)]
pub struct MetricPattern {
    label: &'static str,
    regex: Regex,
}

impl MetricPattern {
    /// Compiles the pattern `<label>\s+(\d+)`.
    ///
    /// The label is matched literally. Whitespace and digit classes are
    /// ASCII-only, so `١٢٣` or a no-break space never count.
    pub fn new(label: &'static str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(r"{}(?-u:\s)+([0-9]+)", regex::escape(label)))?;
        Ok(Self { label, regex })
    }

    /// Returns the literal label this pattern looks for.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

fn builtin(label: &'static str) -> MetricPattern {
    MetricPattern::new(label).expect("escaped label always forms a valid regex")
}

/// Total PSS of the app, from the `TOTAL` row of the app dump.
pub static PSS_TOTAL: LazyLock<MetricPattern> = LazyLock::new(|| builtin("TOTAL"));

/// Java heap PSS, from the app summary.
pub static JAVA_HEAP: LazyLock<MetricPattern> = LazyLock::new(|| builtin("Java Heap:"));

/// Free RAM, from the system-wide dump.
pub static FREE_RAM: LazyLock<MetricPattern> = LazyLock::new(|| builtin("Free RAM:"));

/// Returns the digits captured by the first match of `pattern` in `text`.
///
/// No numeric parsing happens: `"000123"` stays `"000123"` and values wider
/// than any integer type are kept as-is. No match yields [`Metric::Missing`].
pub fn extract_first(text: &str, pattern: &MetricPattern) -> Metric {
    match pattern.regex.captures(text).and_then(|caps| caps.get(1)) {
        Some(digits) => Metric::Value(digits.as_str().to_string()),
        None => {
            debug!("No '{}' value found in dump", pattern.label);
            Metric::Missing
        }
    }
}

/// Metrics taken from the app-scoped dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppMeminfo {
    pub pss_total_kb: Metric,
    pub java_heap_kb: Metric,
}

/// Metrics taken from the system-wide dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMeminfo {
    pub free_ram_kb: Metric,
}

/// Parses `dumpsys meminfo <package>` output.
pub fn parse_app_meminfo(text: &str) -> AppMeminfo {
    AppMeminfo {
        pss_total_kb: extract_first(text, &PSS_TOTAL),
        java_heap_kb: extract_first(text, &JAVA_HEAP),
    }
}

/// Parses system-wide `dumpsys meminfo` output.
pub fn parse_system_meminfo(text: &str) -> SystemMeminfo {
    SystemMeminfo {
        free_ram_kb: extract_first(text, &FREE_RAM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{
        APP_MEMINFO_NO_LABELS, APP_MEMINFO_TYPICAL, APP_NOT_RUNNING, SYSTEM_MEMINFO_TYPICAL,
    };

    fn value(s: &str) -> Metric {
        Metric::Value(s.to_string())
    }

    #[test]
    fn test_extract_first_simple() {
        assert_eq!(extract_first("TOTAL    12345", &PSS_TOTAL), value("12345"));
        assert_eq!(extract_first("Java Heap:    6789", &JAVA_HEAP), value("6789"));
        assert_eq!(extract_first("Free RAM:   54321", &FREE_RAM), value("54321"));
    }

    #[test]
    fn test_extract_first_takes_first_occurrence() {
        let text = "header\n   TOTAL   111   222\n   TOTAL   333\n";
        assert_eq!(extract_first(text, &PSS_TOTAL), value("111"));
    }

    #[test]
    fn test_extract_first_no_match_is_missing() {
        assert_eq!(extract_first("", &PSS_TOTAL), Metric::Missing);
        assert_eq!(extract_first("TOTAL PSS: n/a", &PSS_TOTAL), Metric::Missing);
        // Whitespace is required between label and digits.
        assert_eq!(extract_first("Free RAM:123", &FREE_RAM), Metric::Missing);
        // Label match is case-sensitive.
        assert_eq!(extract_first("java heap:  42", &JAVA_HEAP), Metric::Missing);
    }

    #[test]
    fn test_extract_first_spans_newlines_and_tabs() {
        assert_eq!(extract_first("Java Heap:\t\n  77", &JAVA_HEAP), value("77"));
    }

    #[test]
    fn test_extract_first_keeps_digits_verbatim() {
        assert_eq!(extract_first("TOTAL 000123", &PSS_TOTAL), value("000123"));
        let huge = "TOTAL 123456789012345678901234567890";
        assert_eq!(
            extract_first(huge, &PSS_TOTAL),
            value("123456789012345678901234567890")
        );
    }

    #[test]
    fn test_extract_first_ignores_non_ascii_digits_and_spaces() {
        assert_eq!(extract_first("TOTAL ١٢٣", &PSS_TOTAL), Metric::Missing);
        assert_eq!(extract_first("TOTAL\u{a0}123", &PSS_TOTAL), Metric::Missing);
    }

    #[test]
    fn test_metric_pattern_escapes_label() {
        let pattern = MetricPattern::new("Heap (kB):").unwrap();
        assert_eq!(pattern.label(), "Heap (kB):");
        assert_eq!(extract_first("Heap (kB):  512", &pattern), value("512"));
        assert_eq!(extract_first("Heap kB:  512", &pattern), Metric::Missing);
    }

    #[test]
    fn test_parse_app_meminfo_typical() {
        let info = parse_app_meminfo(APP_MEMINFO_TYPICAL);
        assert_eq!(info.pss_total_kb, value("187654"));
        assert_eq!(info.java_heap_kb, value("31234"));
    }

    #[test]
    fn test_parse_app_meminfo_not_running() {
        let info = parse_app_meminfo(APP_NOT_RUNNING);
        assert_eq!(info, AppMeminfo::default());
    }

    #[test]
    fn test_parse_app_meminfo_without_labels() {
        let info = parse_app_meminfo(APP_MEMINFO_NO_LABELS);
        assert!(info.pss_total_kb.is_missing());
        assert!(info.java_heap_kb.is_missing());
    }

    #[test]
    fn test_parse_system_meminfo_typical() {
        let info = parse_system_meminfo(SYSTEM_MEMINFO_TYPICAL);
        assert_eq!(info.free_ram_kb, value("3456789"));
    }
}

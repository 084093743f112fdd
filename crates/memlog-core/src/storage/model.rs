//! Sample structures written to the CSV time series.

use csv::WriterBuilder;
use serde::Serialize;

use crate::collector::dumpsys::{parse_app_meminfo, parse_system_meminfo};

/// An extracted metric value.
///
/// Absence is kept explicit instead of being folded into zero; the sink
/// decides how a missing value is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Metric {
    /// Non-empty run of ASCII digits, kept verbatim.
    Value(String),
    /// The label was not found in the dump.
    #[default]
    Missing,
}

impl Metric {
    pub fn is_missing(&self) -> bool {
        matches!(self, Metric::Missing)
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Metric::Value(v) => Some(v.as_str()),
            Metric::Missing => None,
        }
    }

    /// Returns the digits, or `missing` when absent.
    pub fn render<'a>(&'a self, missing: &'a str) -> &'a str {
        self.as_deref().unwrap_or(missing)
    }
}

/// One poll cycle's worth of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub pss_total_kb: Metric,
    pub java_heap_kb: Metric,
    pub system_free_ram_kb: Metric,
}

impl Sample {
    /// Builds a sample from the app-scoped and system-wide dump texts.
    pub fn from_dumps(timestamp: impl Into<String>, app_text: &str, system_text: &str) -> Self {
        let app = parse_app_meminfo(app_text);
        let system = parse_system_meminfo(system_text);
        Self {
            timestamp: timestamp.into(),
            pss_total_kb: app.pss_total_kb,
            java_heap_kb: app.java_heap_kb,
            system_free_ram_kb: system.free_ram_kb,
        }
    }

    /// Borrowed CSV row with missing metrics rendered as `missing`.
    pub fn row<'a>(&'a self, missing: &'a str) -> Row<'a> {
        Row {
            timestamp: &self.timestamp,
            pss_total_kb: self.pss_total_kb.render(missing),
            java_heap_kb: self.java_heap_kb.render(missing),
            system_free_ram_kb: self.system_free_ram_kb.render(missing),
        }
    }

    /// The four CSV fields in column order.
    pub fn to_record<'a>(&'a self, missing: &'a str) -> [&'a str; 4] {
        let row = self.row(missing);
        [
            row.timestamp,
            row.pss_total_kb,
            row.java_heap_kb,
            row.system_free_ram_kb,
        ]
    }

    /// The record as one CSV line without terminator, quoted exactly as the
    /// sink writes it. Echoed to the console.
    pub fn to_line(&self, missing: &str) -> csv::Result<String> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(self.row(missing))?;
        let mut bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Serialized form of a [`Sample`]; field names match the CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Row<'a> {
    #[serde(rename = "Timestamp")]
    pub timestamp: &'a str,
    #[serde(rename = "PSS_Total_kB")]
    pub pss_total_kb: &'a str,
    #[serde(rename = "Java_Heap_kB")]
    pub java_heap_kb: &'a str,
    #[serde(rename = "System_Free_RAM_kB")]
    pub system_free_ram_kb: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{APP_MEMINFO_NO_LABELS, SYSTEM_MEMINFO_TYPICAL};

    #[test]
    fn test_sample_from_dumps_concrete_row() {
        let sample = Sample::from_dumps(
            "2024-01-01 00:00:00",
            "        TOTAL    12345\n           Java Heap:    6789\n",
            " Free RAM:   54321 kB\n",
        );
        assert_eq!(sample.to_line("0").unwrap(), "2024-01-01 00:00:00,12345,6789,54321");
    }

    #[test]
    fn test_sample_missing_labels_render_as_zero() {
        let sample = Sample::from_dumps(
            "2024-01-01 00:00:05",
            APP_MEMINFO_NO_LABELS,
            SYSTEM_MEMINFO_TYPICAL,
        );
        assert!(sample.pss_total_kb.is_missing());
        assert!(sample.java_heap_kb.is_missing());
        assert_eq!(sample.to_line("0").unwrap(), "2024-01-01 00:00:05,0,0,3456789");
    }

    #[test]
    fn test_sample_all_missing() {
        let sample = Sample::from_dumps("2024-01-01 00:00:10", "", "");
        assert_eq!(
            sample.to_record("0"),
            ["2024-01-01 00:00:10", "0", "0", "0"]
        );
    }

    #[test]
    fn test_sample_custom_missing_marker() {
        let sample = Sample::from_dumps("2024-01-01 00:00:15", "TOTAL 1", "");
        assert_eq!(sample.to_line("NA").unwrap(), "2024-01-01 00:00:15,1,NA,NA");
    }

    #[test]
    fn test_line_quotes_marker_with_separator() {
        let sample = Sample::from_dumps("2024-01-01 00:00:25", "TOTAL 5", "");
        assert_eq!(
            sample.to_line("n,a").unwrap(),
            "2024-01-01 00:00:25,5,\"n,a\",\"n,a\""
        );
    }

    #[test]
    fn test_record_fields_are_digits_or_zero() {
        let sample = Sample::from_dumps(
            "2024-01-01 00:00:20",
            "TOTAL 987\nJava Heap: x",
            "Free RAM:  42",
        );
        let record = sample.to_record("0");
        assert_eq!(record.len(), 4);
        for field in &record[1..] {
            assert!(!field.is_empty());
            assert!(field.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_metric_render() {
        assert_eq!(Metric::Value("7".to_string()).render("0"), "7");
        assert_eq!(Metric::Missing.render("0"), "0");
        assert_eq!(Metric::Missing.as_deref(), None);
        assert_eq!(Metric::default(), Metric::Missing);
    }
}

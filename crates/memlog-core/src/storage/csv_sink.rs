//! Append-only CSV output.
//!
//! The file is truncated and given its header once at startup; afterwards
//! every sample becomes one row, flushed immediately so the file on disk is
//! always current.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use tracing::debug;

use crate::storage::model::Sample;

/// Column names, in order.
pub const HEADER: [&str; 4] = [
    "Timestamp",
    "PSS_Total_kB",
    "Java_Heap_kB",
    "System_Free_RAM_kB",
];

/// The sink could not be set up. Sampling must not start.
#[derive(Debug)]
pub enum InitError {
    /// Creating the output file (or its directory) failed.
    CreateFile { path: PathBuf, source: io::Error },
    /// Writing or flushing the header row failed.
    WriteHeader { path: PathBuf, source: io::Error },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::CreateFile { path, source } => {
                write!(f, "failed to create output file {}: {}", path.display(), source)
            }
            InitError::WriteHeader { path, source } => {
                write!(f, "failed to write header to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::CreateFile { source, .. } | InitError::WriteHeader { source, .. } => {
                Some(source)
            }
        }
    }
}

/// CSV file receiving one row per sample.
///
/// Owns the file handle; it is closed when the sink is dropped.
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: u64,
}

impl CsvSink {
    /// Creates or truncates `path` and writes the header.
    ///
    /// Missing parent directories are created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, InitError> {
        let path = path.into();

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| InitError::CreateFile {
                path: path.clone(),
                source,
            })?;
        }

        let file = File::create(&path).map_err(|source| InitError::CreateFile {
            path: path.clone(),
            source,
        })?;

        // Header is written by hand so it exists even before the first sample.
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        let header_result = writer
            .write_record(HEADER)
            .map_err(io::Error::from)
            .and_then(|()| writer.flush());
        if let Err(source) = header_result {
            return Err(InitError::WriteHeader { path, source });
        }

        debug!("CSV sink ready at {}", path.display());
        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    /// Wraps an already open file without truncating it or writing a header.
    #[cfg(test)]
    pub(crate) fn from_file(path: impl Into<PathBuf>, file: File) -> Self {
        Self {
            path: path.into(),
            writer: WriterBuilder::new().has_headers(false).from_writer(file),
            rows_written: 0,
        }
    }

    /// Appends one row and flushes it to disk.
    pub fn append(&mut self, sample: &Sample, missing: &str) -> io::Result<()> {
        self.writer.serialize(sample.row(missing))?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of data rows written (the header is not counted).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::Metric;
    use tempfile::TempDir;

    fn sample(ts: &str, pss: &str, heap: Option<&str>, free: &str) -> Sample {
        Sample {
            timestamp: ts.to_string(),
            pss_total_kb: Metric::Value(pss.to_string()),
            java_heap_kb: heap.map_or(Metric::Missing, |h| Metric::Value(h.to_string())),
            system_free_ram_kb: Metric::Value(free.to_string()),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_create_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory_log.csv");
        let sink = CsvSink::create(&path).unwrap();

        assert_eq!(sink.rows_written(), 0);
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Timestamp,PSS_Total_kB,Java_Heap_kB,System_Free_RAM_kB\n"
        );
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory_log.csv");
        fs::write(&path, "stale,data\n1,2\n").unwrap();

        let _sink = CsvSink::create(&path).unwrap();
        assert_eq!(read_rows(&path), vec![HEADER.map(String::from).to_vec()]);
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("device").join("mem.csv");
        CsvSink::create(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_create_fails_when_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let err = CsvSink::create(dir.path()).err().unwrap();
        assert!(matches!(err, InitError::CreateFile { .. }));
        assert!(err.to_string().starts_with("failed to create output file"));
    }

    #[test]
    fn test_append_is_flushed_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory_log.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        sink.append(&sample("2024-01-01 00:00:00", "12345", Some("6789"), "54321"), "0")
            .unwrap();

        // Read while the sink is still open.
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Timestamp,PSS_Total_kB,Java_Heap_kB,System_Free_RAM_kB\n\
             2024-01-01 00:00:00,12345,6789,54321\n"
        );
        assert_eq!(sink.rows_written(), 1);
    }

    #[test]
    fn test_round_trip_preserves_order_and_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memory_log.csv");
        let samples = vec![
            sample("2024-01-01 00:00:00", "187654", Some("31234"), "3456789"),
            sample("2024-01-01 00:00:05", "000190", None, "3450000"),
            sample("2024-01-01 00:00:10", "191000", Some("32001"), "0"),
        ];

        {
            let mut sink = CsvSink::create(&path).unwrap();
            for s in &samples {
                sink.append(s, "0").unwrap();
            }
            assert_eq!(sink.rows_written(), 3);
        }

        let rows = read_rows(&path);
        assert_eq!(rows.len(), samples.len() + 1);
        assert_eq!(rows[0], HEADER);
        for (row, s) in rows[1..].iter().zip(&samples) {
            assert_eq!(*row, s.to_record("0"));
        }
        assert_eq!(rows[2][2], "0");
    }
}

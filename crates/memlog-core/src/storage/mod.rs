//! Sample model and the append-only CSV sink.

pub mod csv_sink;
pub mod model;

pub use csv_sink::{CsvSink, HEADER, InitError};
pub use model::{Metric, Row, Sample};

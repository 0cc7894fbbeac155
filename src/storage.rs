//! Flat-file persistence for fetched series.

use crate::error::RoboError;
use crate::model::{Series, CANDLE_COLUMNS};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::info;

/// Appends series rows to a CSV file.
///
/// The first write creates the file with a header row; later writes append
/// rows only.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every candle in `series`, returning the number of rows written.
    pub fn write(&self, series: &Series) -> Result<usize, RoboError> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            info!(path = %self.path.display(), "creating series file");
            wtr.write_record(CANDLE_COLUMNS)?;
        }
        for candle in series {
            wtr.serialize(candle)?;
        }
        wtr.flush()?;

        info!(path = %self.path.display(), rows = series.len(), "series saved");
        Ok(series.len())
    }
}

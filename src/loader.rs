//! CSV loading and saving

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Reads raw export tables from CSV.
///
/// Dates are left as strings; parsing them is the transform stage's job,
/// which knows the accepted formats and the error policy.
#[derive(Debug, Clone)]
pub struct DataLoader {
    infer_schema_rows: usize,
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_rows: 100,
        }
    }

    /// Builder method to set how many rows drive schema inference
    pub fn with_infer_schema_rows(mut self, rows: usize) -> Self {
        self.infer_schema_rows = rows;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_rows))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ChurnError::DataError(format!("failed to read CSV: {e}")))?;
        info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );
        Ok(df)
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes tables to CSV
pub struct DataSaver;

impl DataSaver {
    /// Save a table to a CSV file with a header row
    pub fn save_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| ChurnError::DataError(format!("failed to write CSV: {e}")))?;
        info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            "saved CSV"
        );
        Ok(())
    }
}

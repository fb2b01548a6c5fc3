//! Raw export column mapping

use crate::config::ColumnMap;
use crate::error::{ChurnError, Result};
use polars::prelude::*;
use tracing::debug;

/// Renames raw export columns to canonical names and drops everything else.
///
/// The output column order follows the mapping order, so downstream stages
/// can rely on a stable canonical schema regardless of how the export was
/// produced.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    map: ColumnMap,
}

impl ColumnMapper {
    pub fn new(map: ColumnMap) -> Self {
        Self { map }
    }

    /// Project the raw table onto the canonical schema.
    ///
    /// Fails with a schema error if any mapped raw column is absent. Row
    /// count and cell values are untouched.
    pub fn map(&self, df: &DataFrame) -> Result<DataFrame> {
        let missing: Vec<&str> = self
            .map
            .entries()
            .iter()
            .map(|(raw, _)| raw.as_str())
            .filter(|raw| df.column(raw).is_err())
            .collect();
        if !missing.is_empty() {
            return Err(ChurnError::SchemaError(format!(
                "raw table is missing mapped column(s): {}",
                missing.join(", ")
            )));
        }

        let mut columns: Vec<Column> = Vec::with_capacity(self.map.len());
        for (raw, canonical) in self.map.entries() {
            let mut series = df
                .column(raw)
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .as_materialized_series()
                .clone();
            series.rename(canonical.as_str().into());
            columns.push(series.into());
        }

        let mapped = DataFrame::new(columns).map_err(|e| ChurnError::DataError(e.to_string()))?;
        debug!(
            raw_columns = df.width(),
            mapped_columns = mapped.width(),
            "mapped raw export onto canonical schema"
        );
        Ok(mapped)
    }

    /// Canonical column names the mapped table will carry, in order
    pub fn canonical_columns(&self) -> Vec<&str> {
        self.map.canonical_columns()
    }
}

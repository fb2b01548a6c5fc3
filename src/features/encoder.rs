//! One-hot encoding with a persisted category vocabulary
//!
//! The vocabulary is captured at fit time and reused for every transform, so
//! a table that happens to be missing a category still produces the full set
//! of indicator columns and two tables encoded by the same fitted encoder
//! always agree on column names and order.

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One-hot encoder over a fitted category vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Source columns in fit order
    columns: Vec<String>,
    /// Alphabetically sorted categories per source column
    vocabulary: HashMap<String, Vec<String>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            vocabulary: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Capture the category vocabulary of the given string columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns.clear();
        self.vocabulary.clear();

        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| ChurnError::MissingColumn(col_name.clone()))?
                .as_materialized_series();
            let ca = series.str().map_err(|_| {
                ChurnError::DataError(format!(
                    "column `{col_name}` is not a string column, cannot one-hot encode"
                ))
            })?;

            let categories: BTreeSet<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            if categories.is_empty() {
                return Err(ChurnError::InsufficientData(format!(
                    "column `{col_name}` has no observed categories to encode"
                )));
            }

            self.columns.push(col_name.clone());
            self.vocabulary
                .insert(col_name.clone(), categories.into_iter().collect());
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted source column with its indicator columns.
    ///
    /// Indicator columns are appended in fit order by source, alphabetical
    /// within a source, and named `{column}_{category}`. A value outside the
    /// fitted vocabulary is an error, never a silent all-zeros row.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let indicators = self.encode_column(df, col_name)?;
            for series in indicators {
                result = result
                    .with_column(series)
                    .map_err(|e| ChurnError::DataError(e.to_string()))?
                    .clone();
            }
            result = result
                .drop(col_name)
                .map_err(|e| ChurnError::DataError(e.to_string()))?;
        }
        Ok(result)
    }

    /// Fit the vocabulary and encode in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Indicator series for one fitted source column, in vocabulary order
    pub fn encode_column(&self, df: &DataFrame, col_name: &str) -> Result<Vec<Series>> {
        let categories = self
            .vocabulary
            .get(col_name)
            .ok_or(ChurnError::ModelNotFitted)?;
        let series = df
            .column(col_name)
            .map_err(|_| ChurnError::MissingColumn(col_name.to_string()))?
            .as_materialized_series();
        let ca = series.str().map_err(|_| {
            ChurnError::DataError(format!(
                "column `{col_name}` is not a string column, cannot one-hot encode"
            ))
        })?;

        for value in ca.into_iter().flatten() {
            if !categories.iter().any(|c| c == value) {
                return Err(ChurnError::UnknownCategory {
                    column: col_name.to_string(),
                    value: value.to_string(),
                });
            }
        }

        let mut indicators = Vec::with_capacity(categories.len());
        for category in categories {
            let name = format!("{col_name}_{category}");
            let values: Vec<i64> = ca
                .into_iter()
                .map(|opt| match opt {
                    Some(v) if v == category.as_str() => 1,
                    _ => 0,
                })
                .collect();
            indicators.push(Series::new(name.into(), values));
        }
        Ok(indicators)
    }

    /// Fitted source columns in fit order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sorted categories captured for a source column
    pub fn categories(&self, col_name: &str) -> Option<&[String]> {
        self.vocabulary.get(col_name).map(|v| v.as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

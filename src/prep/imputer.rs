//! Missing-value imputation
//!
//! Fill rules are declared per column group, and groups are disjoint by
//! construction of the rule set, so the result never depends on the order
//! rules are applied in. Mean fills are always computed from the original
//! input values.

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How to replace missing values in a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillRule {
    /// Replace missing numeric values with zero
    Zero,

    /// Replace missing string values with a fixed category
    Category(String),

    /// Replace missing boolean values with false
    False,

    /// Replace missing numeric values with the mean of the known values,
    /// rounded to the nearest integer
    RoundedMean,
}

/// Disjoint groups of columns, each with one fill rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputeRuleSet {
    groups: Vec<(Vec<String>, FillRule)>,
}

impl ImputeRuleSet {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Builder method to add a column group with a fill rule.
    ///
    /// A column already covered by an earlier group keeps its earlier rule;
    /// the duplicate is dropped from the new group.
    pub fn with_group<I, S>(mut self, columns: I, rule: FillRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let covered: Vec<String> = self
            .groups
            .iter()
            .flat_map(|(cols, _)| cols.iter().cloned())
            .collect();
        let fresh: Vec<String> = columns
            .into_iter()
            .map(Into::into)
            .filter(|c| !covered.contains(c))
            .collect();
        if !fresh.is_empty() {
            self.groups.push((fresh, rule));
        }
        self
    }

    /// Default rules for the canonical customer table
    pub fn churn_defaults() -> Self {
        Self::new()
            .with_group(
                [
                    "pageviews",
                    "admins",
                    "contractdays",
                    "timescontacted",
                    "sessions",
                    "assoccontacts",
                    "associateddeals",
                ],
                FillRule::Zero,
            )
            .with_group(
                ["FF", "associatedpredictionlead", "strategic"],
                FillRule::Category("No".to_string()),
            )
            .with_group(["publiclytraded"], FillRule::False)
            .with_group(["callcycle"], FillRule::Category("Yearly".to_string()))
            .with_group(["gauge"], FillRule::Category("Green".to_string()))
            .with_group(
                ["industry", "origsource"],
                FillRule::Category("Unknown".to_string()),
            )
            .with_group(["employees", "MRR"], FillRule::RoundedMean)
    }

    pub fn groups(&self) -> &[(Vec<String>, FillRule)] {
        &self.groups
    }

    /// All columns covered by any rule
    pub fn covered_columns(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|(cols, _)| cols.iter().map(|c| c.as_str()))
            .collect()
    }
}

impl Default for ImputeRuleSet {
    fn default() -> Self {
        Self::churn_defaults()
    }
}

/// Applies an [`ImputeRuleSet`] to a table.
///
/// Columns named by a rule but absent from the table are skipped, so a rule
/// set can be broader than any one table. Uncovered columns pass through
/// unchanged, missing values included.
#[derive(Debug, Clone)]
pub struct Imputer {
    rules: ImputeRuleSet,
}

impl Imputer {
    pub fn new(rules: ImputeRuleSet) -> Self {
        Self { rules }
    }

    /// Fill missing values according to the rule set.
    ///
    /// Row count and column order are preserved. Numeric fill targets are
    /// cast to f64 before filling.
    pub fn impute(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for (columns, rule) in self.rules.groups() {
            for col_name in columns {
                if df.column(col_name).is_err() {
                    continue;
                }
                let series = df
                    .column(col_name)
                    .map_err(|e| ChurnError::DataError(e.to_string()))?
                    .as_materialized_series();

                let filled = match rule {
                    FillRule::Zero => Self::fill_numeric(series, 0.0)?,
                    FillRule::Category(value) => Self::fill_category(series, value)?,
                    FillRule::False => Self::fill_false(series)?,
                    FillRule::RoundedMean => {
                        // Mean of the known values from the input table, before
                        // any fill has touched it.
                        let value = Self::rounded_mean(series)?;
                        debug!(column = %col_name, fill = value, "rounded mean fill");
                        Self::fill_numeric(series, value)?
                    }
                };

                result = result
                    .with_column(filled)
                    .map_err(|e| ChurnError::DataError(e.to_string()))?
                    .clone();
            }
        }

        Ok(result)
    }

    fn as_float(series: &Series) -> Result<Float64Chunked> {
        let is_numeric = matches!(
            series.dtype(),
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        );
        if !is_numeric {
            return Err(ChurnError::DataError(format!(
                "column `{}` is not numeric, cannot apply a numeric fill",
                series.name()
            )));
        }
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
        Ok(casted
            .f64()
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone())
    }

    fn fill_numeric(series: &Series, value: f64) -> Result<Series> {
        let ca = Self::as_float(series)?;
        let filled: Float64Chunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(value)))
            .collect();
        Ok(filled.with_name(series.name().clone()).into_series())
    }

    fn fill_category(series: &Series, value: &str) -> Result<Series> {
        let ca = series.str().map_err(|_| {
            ChurnError::DataError(format!(
                "column `{}` is not a string column, cannot apply a category fill",
                series.name()
            ))
        })?;
        let filled: StringChunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(value).to_string()))
            .collect();
        Ok(filled.with_name(series.name().clone()).into_series())
    }

    fn fill_false(series: &Series) -> Result<Series> {
        let ca = series.bool().map_err(|_| {
            ChurnError::DataError(format!(
                "column `{}` is not boolean, cannot apply a false fill",
                series.name()
            ))
        })?;
        let filled: BooleanChunked = ca
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(false)))
            .collect();
        Ok(filled.with_name(series.name().clone()).into_series())
    }

    fn rounded_mean(series: &Series) -> Result<f64> {
        let ca = Self::as_float(series)?;
        let mean = ca.mean().ok_or_else(|| {
            ChurnError::InsufficientData(format!(
                "column `{}` has no known values to compute a mean fill from",
                series.name()
            ))
        })?;
        Ok(mean.round())
    }
}

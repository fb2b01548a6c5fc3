//! Feature matrix construction
//!
//! Assembles the numeric design matrix a classifier consumes from a cleaned
//! table. Column order is deterministic: base features in selection order,
//! then higher-order terms, then interactions, then one-hot indicators.

use crate::error::{ChurnError, Result};
use crate::features::{FeatureMatrix, OneHotEncoder};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which table columns become model features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureSet {
    /// Every table column except the label
    All,
    /// An explicit list of feature columns, in order
    Named(Vec<String>),
}

impl FeatureSet {
    pub fn named<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(columns.into_iter().map(Into::into).collect())
    }
}

/// Options for matrix construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixOptions {
    /// Standardize every feature column to zero mean and unit variance
    pub standardize: bool,

    /// Powers to expand, as (column, max_power); powers 2..=max_power are
    /// emitted as `{column}_{power}`
    pub higher_order_terms: Vec<(String, u32)>,

    /// Pairwise products, emitted as `{left} {right}` in list order
    pub interaction_terms: Vec<(String, String)>,

    /// One-hot indicator to omit as the reference level, as (column, category)
    pub drop_reference: Option<(String, String)>,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            standardize: false,
            higher_order_terms: Vec::new(),
            interaction_terms: Vec::new(),
            drop_reference: Some(("callcycle".to_string(), "Yearly".to_string())),
        }
    }
}

impl MatrixOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable standardization
    pub fn with_standardize(mut self, enabled: bool) -> Self {
        self.standardize = enabled;
        self
    }

    /// Builder method to add a higher-order expansion for a column
    pub fn with_higher_order(mut self, column: impl Into<String>, max_power: u32) -> Self {
        self.higher_order_terms.push((column.into(), max_power));
        self
    }

    /// Builder method to add an interaction product
    pub fn with_interaction(
        mut self,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.interaction_terms.push((left.into(), right.into()));
        self
    }

    /// Builder method to set or clear the reference level to drop
    pub fn with_drop_reference(mut self, reference: Option<(String, String)>) -> Self {
        self.drop_reference = reference;
        self
    }
}

/// Builds feature matrices with a fitted one-hot vocabulary.
///
/// Fit once on the training table, then build matrices for any table with
/// the same schema; the encoder vocabulary guarantees identical columns.
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    options: MatrixOptions,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl MatrixBuilder {
    pub fn new(options: MatrixOptions) -> Self {
        Self {
            options,
            encoder: OneHotEncoder::new(),
            is_fitted: false,
        }
    }

    pub fn options(&self) -> &MatrixOptions {
        &self.options
    }

    /// Capture the one-hot vocabulary of the categorical feature columns
    pub fn fit(&mut self, df: &DataFrame, features: &FeatureSet, label: &str) -> Result<&mut Self> {
        self.check_inputs(df, label)?;
        let base = self.resolve_base(df, features, label)?;
        let categorical = categorical_columns(df, &base);
        self.encoder.fit(df, &categorical)?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Assemble the feature matrix, label vector, and column names
    pub fn build(
        &self,
        df: &DataFrame,
        features: &FeatureSet,
        label: &str,
    ) -> Result<FeatureMatrix> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        self.check_inputs(df, label)?;
        if df.height() == 0 {
            return Err(ChurnError::InsufficientData(
                "table has no rows to build a matrix from".to_string(),
            ));
        }

        let base = self.resolve_base(df, features, label)?;
        let categorical = categorical_columns(df, &base);

        let mut names: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for col_name in &base {
            if categorical.contains(col_name) {
                continue;
            }
            names.push(col_name.clone());
            columns.push(float_column(df, col_name)?);
        }

        for (base_col, max_power) in &self.options.higher_order_terms {
            let values = float_column(df, base_col)?;
            for power in 2..=*max_power {
                names.push(format!("{base_col}_{power}"));
                columns.push(values.iter().map(|v| v.powi(power as i32)).collect());
            }
        }

        for (left, right) in &self.options.interaction_terms {
            let a = float_column(df, left)?;
            let b = float_column(df, right)?;
            names.push(format!("{left} {right}"));
            columns.push(a.iter().zip(b.iter()).map(|(x, y)| x * y).collect());
        }

        let drop_name = self
            .options
            .drop_reference
            .as_ref()
            .map(|(source, category)| format!("{source}_{category}"));
        for col_name in &categorical {
            if self.encoder.categories(col_name).is_none() {
                return Err(ChurnError::DataError(format!(
                    "column `{col_name}` is not in the fitted vocabulary; refit the builder"
                )));
            }
            for series in self.encoder.encode_column(df, col_name)? {
                if drop_name.as_deref() == Some(series.name().as_str()) {
                    continue;
                }
                let ca = series
                    .i64()
                    .map_err(|e| ChurnError::DataError(e.to_string()))?;
                names.push(series.name().to_string());
                columns.push(ca.into_iter().map(|opt| opt.unwrap_or(0) as f64).collect());
            }
        }

        if columns.is_empty() {
            return Err(ChurnError::ConfigError(
                "feature selection produced no columns".to_string(),
            ));
        }

        if self.options.standardize {
            for (name, column) in names.iter().zip(columns.iter_mut()) {
                standardize(name, column)?;
            }
        }

        let y = Array1::from_vec(label_values(df, label)?);
        let n_rows = df.height();
        let n_cols = columns.len();
        let x = Array2::from_shape_fn((n_rows, n_cols), |(i, j)| columns[j][i]);

        debug!(
            rows = n_rows,
            features = n_cols,
            standardized = self.options.standardize,
            "assembled feature matrix"
        );
        Ok(FeatureMatrix { x, y, names })
    }

    /// Fit the vocabulary and build in one step
    pub fn fit_build(
        &mut self,
        df: &DataFrame,
        features: &FeatureSet,
        label: &str,
    ) -> Result<FeatureMatrix> {
        self.fit(df, features, label)?;
        self.build(df, features, label)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn resolve_base(
        &self,
        df: &DataFrame,
        features: &FeatureSet,
        label: &str,
    ) -> Result<Vec<String>> {
        match features {
            FeatureSet::All => Ok(df
                .get_column_names()
                .iter()
                .map(|n| n.as_str().to_string())
                .filter(|n| n.as_str() != label)
                .collect()),
            FeatureSet::Named(cols) => {
                for col in cols {
                    if df.column(col).is_err() {
                        return Err(ChurnError::MissingColumn(col.clone()));
                    }
                }
                Ok(cols.clone())
            }
        }
    }

    fn check_inputs(&self, df: &DataFrame, label: &str) -> Result<()> {
        if df.column(label).is_err() {
            return Err(ChurnError::MissingColumn(label.to_string()));
        }
        for (base_col, _) in &self.options.higher_order_terms {
            if df.column(base_col).is_err() {
                return Err(ChurnError::MissingColumn(base_col.clone()));
            }
        }
        for (left, right) in &self.options.interaction_terms {
            if df.column(left).is_err() {
                return Err(ChurnError::MissingColumn(left.clone()));
            }
            if df.column(right).is_err() {
                return Err(ChurnError::MissingColumn(right.clone()));
            }
        }
        Ok(())
    }
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::new(MatrixOptions::default())
    }
}

/// String-typed columns among the base selection, in selection order
fn categorical_columns(df: &DataFrame, base: &[String]) -> Vec<String> {
    base.iter()
        .filter(|name| {
            df.column(name)
                .map(|c| c.dtype() == &DataType::String)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ChurnError::MissingColumn(name.to_string()))?;
    let is_numeric = matches!(
        column.dtype(),
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
            | DataType::Boolean
    );
    if !is_numeric {
        return Err(ChurnError::DataError(format!(
            "column `{name}` is not numeric and cannot enter the matrix directly"
        )));
    }
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    let ca = casted
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    if ca.null_count() > 0 {
        return Err(ChurnError::DataError(format!(
            "column `{name}` contains missing values; impute before building the matrix"
        )));
    }
    Ok(ca.into_iter().map(|opt| opt.unwrap_or(0.0)).collect())
}

fn label_values(df: &DataFrame, label: &str) -> Result<Vec<i64>> {
    let column = df
        .column(label)
        .map_err(|_| ChurnError::MissingColumn(label.to_string()))?;
    let casted = column
        .as_materialized_series()
        .cast(&DataType::Int64)
        .map_err(|_| {
            ChurnError::DataError(format!("label column `{label}` is not numeric"))
        })?;
    let ca = casted
        .i64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?;
    if ca.null_count() > 0 {
        return Err(ChurnError::DataError(format!(
            "label column `{label}` contains missing values"
        )));
    }
    Ok(ca.into_iter().map(|opt| opt.unwrap_or(0)).collect())
}

/// Center and scale in place using the sample standard deviation
fn standardize(name: &str, values: &mut [f64]) -> Result<()> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() < 2 {
        0.0
    } else {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    };
    let std = variance.sqrt();
    if std == 0.0 {
        return Err(ChurnError::ZeroVariance(name.to_string()));
    }
    for value in values.iter_mut() {
        *value = (*value - mean) / std;
    }
    Ok(())
}

//! Derived churn features
//!
//! Runs after imputation, so every input column this stage reads is expected
//! to be free of missing values unless noted otherwise. Adds the engineered
//! columns, recodes categorical flags to integers, and drops the raw columns
//! they replace.

use crate::config::TransformOptions;
use crate::error::{ChurnError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::debug;

/// Annual contact frequency for each call cadence label
pub const CALL_CYCLE_FREQUENCY: [(&str, i64); 6] = [
    ("Monthly", 12),
    ("Quarterly", 4),
    ("Yearly", 1),
    ("Half Year", 2),
    ("Every Other Month", 6),
    ("None", 0),
];

/// Contract status that marks a churned customer
pub const CANCELLED_STATUS: &str = "CANCELLED";

/// Yes/No flag columns recoded to 1/0
pub const YES_NO_COLUMNS: [&str; 3] = ["FF", "associatedpredictionlead", "strategic"];

const BOOLEAN_COLUMNS: [&str; 1] = ["publiclytraded"];
const COMPETITOR_DELIMITER: char = ';';
const DAYS_PER_QUARTER: f64 = 365.0 / 4.0;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

/// Derives the engineered churn features from a canonical customer table
#[derive(Debug, Clone)]
pub struct FeatureTransformer {
    options: TransformOptions,
}

impl FeatureTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    /// Apply the full derivation sequence.
    ///
    /// Adds `callcycle_numeric`, `competingProducts`, `churn`,
    /// `daysAsCustomer`, `callsPerQuarter`, and optionally `sessionsPerDay`.
    /// Drops `contracttype` and both date columns once their derived
    /// replacements exist.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        result = self.recode_call_cycle(&result)?;
        result = self.count_competitors(&result)?;
        result = self.derive_churn_label(&result)?;
        result = self.binarize_competitor_use(&result)?;
        result = self.recode_yes_no(&result)?;
        result = self.recode_booleans(&result)?;
        result = self.derive_tenure(&result)?;
        result = self.derive_rates(&result)?;
        debug!(
            rows = result.height(),
            columns = result.width(),
            "derived churn features"
        );
        Ok(result)
    }

    /// Map each call cadence label to its annual contact count.
    ///
    /// The raw `callcycle` column is kept for one-hot encoding downstream.
    fn recode_call_cycle(&self, df: &DataFrame) -> Result<DataFrame> {
        let ca = required_str(df, "callcycle")?;
        let mut recoded: Vec<i64> = Vec::with_capacity(ca.len());
        for opt in ca.into_iter() {
            match opt {
                Some(label) => match call_cycle_frequency(label) {
                    Some(freq) => recoded.push(freq),
                    None => {
                        return Err(ChurnError::UnknownCategory {
                            column: "callcycle".to_string(),
                            value: label.to_string(),
                        })
                    }
                },
                None => return Err(missing_values_error("callcycle")),
            }
        }
        let mut result = df.clone();
        result = result
            .with_column(Series::new("callcycle_numeric".into(), recoded))
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
        Ok(result)
    }

    /// Count semicolon-delimited competitor entries.
    ///
    /// Missing, empty, and literal "0" sources count as zero competitors.
    fn count_competitors(&self, df: &DataFrame) -> Result<DataFrame> {
        let ca = required_str(df, "usecompetitors")?;
        let counts: Vec<i64> = ca
            .into_iter()
            .map(|opt| match opt {
                None => 0,
                Some(s) if s.trim().is_empty() || s == "0" => 0,
                Some(s) => s.split(COMPETITOR_DELIMITER).count() as i64,
            })
            .collect();
        let mut result = df.clone();
        result = result
            .with_column(Series::new("competingProducts".into(), counts))
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
        Ok(result)
    }

    /// Derive the binary churn label from the contract status, then drop the
    /// status column so it cannot leak into the feature set.
    fn derive_churn_label(&self, df: &DataFrame) -> Result<DataFrame> {
        let ca = required_str(df, "contracttype")?;
        let labels: Vec<i64> = ca
            .into_iter()
            .map(|opt| match opt {
                Some(CANCELLED_STATUS) => 1,
                _ => 0,
            })
            .collect();
        let mut result = df.clone();
        result = result
            .with_column(Series::new("churn".into(), labels))
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
        result = result
            .drop("contracttype")
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
        Ok(result)
    }

    /// Collapse the competitor list to a presence flag, in place
    fn binarize_competitor_use(&self, df: &DataFrame) -> Result<DataFrame> {
        let ca = required_str(df, "usecompetitors")?;
        let flags: Vec<i64> = ca
            .into_iter()
            .map(|opt| match opt {
                None => 0,
                Some(s) if s.trim().is_empty() || s == "0" => 0,
                Some(_) => 1,
            })
            .collect();
        let mut result = df.clone();
        result = result
            .with_column(Series::new("usecompetitors".into(), flags))
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
        Ok(result)
    }

    /// Recode Yes/No flag columns to 1/0, in place
    fn recode_yes_no(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for col_name in YES_NO_COLUMNS {
            let ca = required_str(&result, col_name)?.clone();
            let mut recoded: Vec<i64> = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                match opt {
                    Some("Yes") => recoded.push(1),
                    Some("No") => recoded.push(0),
                    Some(other) => {
                        return Err(ChurnError::UnknownCategory {
                            column: col_name.to_string(),
                            value: other.to_string(),
                        })
                    }
                    None => return Err(missing_values_error(col_name)),
                }
            }
            result = result
                .with_column(Series::new(col_name.into(), recoded))
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .clone();
        }
        Ok(result)
    }

    /// Recode boolean columns to 1/0, in place
    fn recode_booleans(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for col_name in BOOLEAN_COLUMNS {
            let series = required(&result, col_name)?.as_materialized_series();
            let ca = series
                .bool()
                .map_err(|_| {
                    ChurnError::DataError(format!("column `{col_name}` is not boolean"))
                })?
                .clone();
            let mut recoded: Vec<i64> = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                match opt {
                    Some(true) => recoded.push(1),
                    Some(false) => recoded.push(0),
                    None => return Err(missing_values_error(col_name)),
                }
            }
            result = result
                .with_column(Series::new(col_name.into(), recoded))
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .clone();
        }
        Ok(result)
    }

    /// Compute customer tenure in days against the evaluation date.
    ///
    /// The first deal date is the anchor; rows without one fall back to the
    /// account creation date. Tenure must be non-negative. Both date columns
    /// are dropped once `daysAsCustomer` exists.
    fn derive_tenure(&self, df: &DataFrame) -> Result<DataFrame> {
        let first_deal = required_str(df, "firstdealDT")?;
        let created = required_str(df, "createDT")?;

        let mut tenure: Vec<i64> = Vec::with_capacity(df.height());
        for (deal_opt, created_opt) in first_deal.into_iter().zip(created.into_iter()) {
            let (raw, source_column) = match (deal_opt, created_opt) {
                (Some(s), _) if !s.trim().is_empty() => (s, "firstdealDT"),
                (_, Some(s)) if !s.trim().is_empty() => (s, "createDT"),
                _ => {
                    return Err(ChurnError::InvalidDate {
                        column: "firstdealDT".to_string(),
                        reason: "missing with no creation date fallback".to_string(),
                    })
                }
            };
            let anchor = parse_date(raw).ok_or_else(|| ChurnError::InvalidDate {
                column: source_column.to_string(),
                reason: format!("unparseable date `{raw}`"),
            })?;
            let days = (self.options.as_of - anchor).num_days();
            if days < 0 {
                return Err(ChurnError::InvalidDate {
                    column: source_column.to_string(),
                    reason: format!(
                        "date `{raw}` is after the evaluation date {}",
                        self.options.as_of
                    ),
                });
            }
            tenure.push(days);
        }

        let mut result = df.clone();
        result = result
            .with_column(Series::new("daysAsCustomer".into(), tenure))
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();
        result = result
            .drop("firstdealDT")
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
        result = result
            .drop("createDT")
            .map_err(|e| ChurnError::DataError(e.to_string()))?;
        Ok(result)
    }

    /// Derive per-tenure activity rates.
    ///
    /// A zero-day tenure yields a zero rate rather than a division.
    fn derive_rates(&self, df: &DataFrame) -> Result<DataFrame> {
        let days = required(df, "daysAsCustomer")?
            .as_materialized_series()
            .i64()
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();

        let mut result = df.clone();
        let calls = rate_series(
            &required_float(df, "timescontacted")?,
            &days,
            "callsPerQuarter",
            DAYS_PER_QUARTER,
        );
        result = result
            .with_column(calls)
            .map_err(|e| ChurnError::DataError(e.to_string()))?
            .clone();

        if self.options.sessions_per_day {
            let sessions = rate_series(
                &required_float(df, "sessions")?,
                &days,
                "sessionsPerDay",
                1.0,
            );
            result = result
                .with_column(sessions)
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .clone();
        }
        Ok(result)
    }
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| ChurnError::SchemaError(format!("transform requires column `{name}`")))
}

fn required_str<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    required(df, name)?
        .as_materialized_series()
        .str()
        .map_err(|_| ChurnError::DataError(format!("column `{name}` is not a string column")))
}

fn required_float(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let casted = required(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|_| ChurnError::DataError(format!("column `{name}` is not numeric")))?;
    Ok(casted
        .f64()
        .map_err(|e| ChurnError::DataError(e.to_string()))?
        .clone())
}

fn missing_values_error(column: &str) -> ChurnError {
    ChurnError::DataError(format!(
        "column `{column}` contains missing values; run imputation first"
    ))
}

/// Annual contact count for a call cadence label, if known
pub fn call_cycle_frequency(label: &str) -> Option<i64> {
    CALL_CYCLE_FREQUENCY
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, freq)| *freq)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    None
}

fn rate_series(numerator: &Float64Chunked, days: &Int64Chunked, name: &str, scale: f64) -> Series {
    let values: Vec<f64> = numerator
        .into_iter()
        .zip(days.into_iter())
        .map(|(num, d)| {
            let days = d.unwrap_or(0);
            if days == 0 {
                0.0
            } else {
                num.unwrap_or(0.0) / days as f64 * scale
            }
        })
        .collect();
    Series::new(name.into(), values)
}

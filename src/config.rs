//! Pipeline configuration
//!
//! A [`PipelineConfig`] bundles the three inputs the cleaning stage needs:
//! the raw-to-canonical column mapping, the imputation rule set, and the
//! transform options (evaluation date plus optional features).

use crate::error::{ChurnError, Result};
use crate::prep::ImputeRuleSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Ordered mapping from raw export column names to canonical names.
///
/// The order of entries determines the column order of the cleaned table,
/// and any raw column not listed here is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Build a mapping from (raw, canonical) pairs, preserving order
    pub fn from_pairs<I, R, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
        R: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(raw, canonical)| (raw.into(), canonical.into()))
                .collect(),
        }
    }

    /// Parse a mapping from a JSON array of `["raw", "canonical"]` pairs
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<(String, String)> = serde_json::from_str(json)?;
        if entries.is_empty() {
            return Err(ChurnError::ConfigError(
                "column mapping must contain at least one entry".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// Load a mapping from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Default mapping for the customer CRM export
    pub fn customer_default() -> Self {
        Self::from_pairs([
            ("Number of Pageviews", "pageviews"),
            ("Number of Admins", "admins"),
            ("Contract Length (Days)", "contractdays"),
            ("Number of times contacted", "timescontacted"),
            ("Number of Sessions", "sessions"),
            ("Number of Associated Contacts", "assoccontacts"),
            ("Number of Associated Deals", "associateddeals"),
            ("Number of Employees", "employees"),
            ("MRR", "MRR"),
            ("FF Customer", "FF"),
            ("Associated Prediction Lead", "associatedpredictionlead"),
            ("Strategic Account", "strategic"),
            ("Is Publicly Traded", "publiclytraded"),
            ("Call Cycle", "callcycle"),
            ("Customer Gauge", "gauge"),
            ("Industry", "industry"),
            ("Original Source Type", "origsource"),
            ("Competitors in Use", "usecompetitors"),
            ("Contract Type", "contracttype"),
            ("First Deal Created Date", "firstdealDT"),
            ("Create Date", "createDT"),
        ])
    }

    /// The (raw, canonical) pairs in mapping order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Canonical column names in mapping order
    pub fn canonical_columns(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, c)| c.as_str()).collect()
    }

    /// Raw column names in mapping order
    pub fn raw_columns(&self) -> Vec<&str> {
        self.entries.iter().map(|(r, _)| r.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options for the derived-feature transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Date customer tenure is measured against
    pub as_of: NaiveDate,

    /// Whether to derive the sessionsPerDay rate column
    pub sessions_per_day: bool,
}

impl TransformOptions {
    /// Options with the given evaluation date and no optional features
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            sessions_per_day: false,
        }
    }

    /// Builder method to enable the sessionsPerDay rate column
    pub fn with_sessions_per_day(mut self, enabled: bool) -> Self {
        self.sessions_per_day = enabled;
        self
    }
}

/// Configuration for the full cleaning pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Raw-to-canonical column mapping
    pub column_map: ColumnMap,

    /// Per-column missing-value rules
    pub rules: ImputeRuleSet,

    /// Derived-feature options
    pub transform: TransformOptions,
}

impl PipelineConfig {
    /// Default churn configuration measured against the given date
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            column_map: ColumnMap::customer_default(),
            rules: ImputeRuleSet::churn_defaults(),
            transform: TransformOptions::new(as_of),
        }
    }

    /// Builder method to set the column mapping
    pub fn with_column_map(mut self, column_map: ColumnMap) -> Self {
        self.column_map = column_map;
        self
    }

    /// Builder method to set the imputation rules
    pub fn with_rules(mut self, rules: ImputeRuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Builder method to enable the sessionsPerDay rate column
    pub fn with_sessions_per_day(mut self, enabled: bool) -> Self {
        self.transform.sessions_per_day = enabled;
        self
    }
}

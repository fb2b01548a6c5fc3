//! Data preparation module
//!
//! Turns a raw CRM export into the engineered churn table in three stages:
//! - Column mapping onto the canonical schema
//! - Rule-based missing-value imputation
//! - Derived-feature transformation
//!
//! [`CleanPipeline`] runs the stages in that order; each stage is also
//! usable on its own.

mod imputer;
mod mapper;
mod transform;

pub use imputer::{FillRule, ImputeRuleSet, Imputer};
pub use mapper::ColumnMapper;
pub use transform::{
    call_cycle_frequency, FeatureTransformer, CALL_CYCLE_FREQUENCY, CANCELLED_STATUS,
    YES_NO_COLUMNS,
};

use crate::config::PipelineConfig;
use crate::error::Result;
use polars::prelude::*;
use tracing::info;

/// Full cleaning pipeline from raw export to engineered table
#[derive(Debug, Clone)]
pub struct CleanPipeline {
    mapper: ColumnMapper,
    imputer: Imputer,
    transformer: FeatureTransformer,
}

impl CleanPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            mapper: ColumnMapper::new(config.column_map),
            imputer: Imputer::new(config.rules),
            transformer: FeatureTransformer::new(config.transform),
        }
    }

    /// Map, impute, and transform a raw export table
    pub fn run(&self, raw: &DataFrame) -> Result<DataFrame> {
        let mapped = self.mapper.map(raw)?;
        let imputed = self.imputer.impute(&mapped)?;
        let cleaned = self.transformer.transform(&imputed)?;
        info!(
            rows = cleaned.height(),
            columns = cleaned.width(),
            "cleaned raw export"
        );
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnMap, PipelineConfig};
    use chrono::NaiveDate;

    fn canonical_df() -> DataFrame {
        df!(
            "pageviews" => &[Some(100i64), None],
            "admins" => &[Some(2i64), Some(1)],
            "contractdays" => &[Some(365i64), Some(30)],
            "timescontacted" => &[Some(12i64), None],
            "sessions" => &[Some(40i64), Some(3)],
            "assoccontacts" => &[Some(5i64), Some(2)],
            "associateddeals" => &[Some(3i64), Some(1)],
            "employees" => &[Some(50i64), None],
            "MRR" => &[Some(1000.0f64), Some(2000.0)],
            "FF" => &[Some("Yes"), None],
            "associatedpredictionlead" => &[Some("No"), Some("No")],
            "strategic" => &[None::<&str>, Some("Yes")],
            "publiclytraded" => &[Some(true), None],
            "callcycle" => &[Some("Monthly"), None],
            "gauge" => &[Some("Red"), None],
            "industry" => &[None::<&str>, Some("Software")],
            "origsource" => &[Some("Referral"), None],
            "usecompetitors" => &[Some("A;B"), None],
            "contracttype" => &[Some("ACTIVE"), Some("CANCELLED")],
            "firstdealDT" => &[Some("2020-01-02"), None],
            "createDT" => &[Some("2019-12-01"), Some("2020-05-31")],
        )
        .unwrap()
    }

    fn identity_map() -> ColumnMap {
        let df = canonical_df();
        ColumnMap::from_pairs(
            df.get_column_names()
                .iter()
                .map(|n| (n.as_str().to_string(), n.as_str().to_string())),
        )
    }

    #[test]
    fn test_pipeline_stage_order() {
        let as_of = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let config = PipelineConfig::new(as_of).with_column_map(identity_map());
        let pipeline = CleanPipeline::new(config);
        let cleaned = pipeline.run(&canonical_df()).unwrap();

        assert_eq!(cleaned.height(), 2);

        // Imputed cadence label flows into the derived column
        let numeric = cleaned.column("callcycle_numeric").unwrap().i64().unwrap();
        assert_eq!(numeric.get(1), Some(1));

        // Labels and rates exist, raw status and date columns do not
        assert!(cleaned.column("churn").is_ok());
        assert!(cleaned.column("callsPerQuarter").is_ok());
        assert!(cleaned.column("contracttype").is_err());
        assert!(cleaned.column("firstdealDT").is_err());

        // Zero fill ran before the rate derivation
        let calls = cleaned.column("callsPerQuarter").unwrap().f64().unwrap();
        assert_eq!(calls.get(1), Some(0.0));
    }

    #[test]
    fn test_pipeline_reports_schema_errors() {
        let as_of = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let config = PipelineConfig::new(as_of);
        let pipeline = CleanPipeline::new(config);
        // Canonical names do not match the raw export mapping
        let err = pipeline.run(&canonical_df()).unwrap_err();
        assert!(matches!(err, crate::error::ChurnError::SchemaError(_)));
    }
}

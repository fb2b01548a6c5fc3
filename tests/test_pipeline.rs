//! Integration test: raw export through cleaning, matrix building, and evaluation

use chrono::NaiveDate;
use churnflow::config::PipelineConfig;
use churnflow::eval::RocEvaluator;
use churnflow::features::{FeatureSet, MatrixBuilder, MatrixOptions};
use churnflow::model::LogisticRegression;
use churnflow::prep::CleanPipeline;
use churnflow::resample::Smote;
use polars::prelude::*;

/// Synthetic CRM export with `n_active` retained and `n_cancelled` churned
/// customers. Churned accounts are contacted rarely and hold few deals, so
/// the label is learnable from the engineered features.
fn raw_customers(n_active: usize, n_cancelled: usize) -> DataFrame {
    let n = n_active + n_cancelled;
    let active = |i: usize| i < n_active;

    let pageviews: Vec<i64> = (0..n).map(|i| (i * 7 % 90 + 10) as i64).collect();
    let admins: Vec<i64> = (0..n).map(|_| 2).collect();
    let contract_days: Vec<i64> = (0..n).map(|_| 365).collect();
    let contacted: Vec<i64> = (0..n)
        .map(|i| {
            if active(i) {
                20 + (i % 10) as i64
            } else {
                1 + (i % 3) as i64
            }
        })
        .collect();
    let sessions: Vec<i64> = (0..n).map(|i| (i % 40 + 5) as i64).collect();
    let contacts: Vec<i64> = (0..n)
        .map(|i| if active(i) { 4 + (i % 4) as i64 } else { 1 })
        .collect();
    let deals: Vec<i64> = (0..n)
        .map(|i| {
            if active(i) {
                5 + (i % 5) as i64
            } else {
                (i % 2) as i64
            }
        })
        .collect();
    let employees: Vec<i64> = (0..n).map(|i| (50 + i * 3) as i64).collect();
    let mrr: Vec<f64> = (0..n)
        .map(|i| {
            if active(i) {
                1000.0 + i as f64 * 25.0
            } else {
                120.0 + i as f64
            }
        })
        .collect();
    let ff: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Yes" } else { "No" }).collect();
    let lead: Vec<&str> = (0..n).map(|_| "No").collect();
    let strategic: Vec<&str> = (0..n)
        .map(|i| if active(i) { "Yes" } else { "No" })
        .collect();
    let public: Vec<bool> = (0..n).map(|i| i % 5 == 0).collect();
    let cadence: Vec<&str> = (0..n)
        .map(|i| {
            if active(i) {
                ["Monthly", "Quarterly"][i % 2]
            } else {
                ["Yearly", "None"][i % 2]
            }
        })
        .collect();
    let gauge: Vec<&str> = (0..n).map(|i| ["Green", "Yellow", "Red"][i % 3]).collect();
    let industry: Vec<&str> = (0..n).map(|i| ["Software", "Retail"][i % 2]).collect();
    let source: Vec<&str> = (0..n).map(|_| "Organic").collect();
    let competitors: Vec<Option<&str>> = (0..n)
        .map(|i| {
            if active(i) {
                None
            } else {
                Some("CompetitorA;CompetitorB")
            }
        })
        .collect();
    let contract_type: Vec<&str> = (0..n)
        .map(|i| if active(i) { "ACTIVE" } else { "CANCELLED" })
        .collect();
    let first_deal: Vec<&str> = (0..n)
        .map(|i| ["2019-01-15", "2019-03-20", "2018-11-05"][i % 3])
        .collect();
    let created: Vec<&str> = (0..n).map(|_| "2018-06-01").collect();

    df!(
        "Number of Pageviews" => pageviews,
        "Number of Admins" => admins,
        "Contract Length (Days)" => contract_days,
        "Number of times contacted" => contacted,
        "Number of Sessions" => sessions,
        "Number of Associated Contacts" => contacts,
        "Number of Associated Deals" => deals,
        "Number of Employees" => employees,
        "MRR" => mrr,
        "FF Customer" => ff,
        "Associated Prediction Lead" => lead,
        "Strategic Account" => strategic,
        "Is Publicly Traded" => public,
        "Call Cycle" => cadence,
        "Customer Gauge" => gauge,
        "Industry" => industry,
        "Original Source Type" => source,
        "Competitors in Use" => competitors,
        "Contract Type" => contract_type,
        "First Deal Created Date" => first_deal,
        "Create Date" => created,
    )
    .unwrap()
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()
}

/// Feature selection used by the `evaluate` and `train` commands
fn churn_features(standardize: bool) -> (FeatureSet, MatrixOptions) {
    let features = FeatureSet::named([
        "callsPerQuarter",
        "associateddeals",
        "callcycle_numeric",
    ]);
    let options = MatrixOptions::new()
        .with_standardize(standardize)
        .with_higher_order("callcycle_numeric", 2)
        .with_interaction("callsPerQuarter", "associateddeals")
        .with_interaction("assoccontacts", "associateddeals")
        .with_interaction("assoccontacts", "MRR");
    (features, options)
}

fn make_classifier() -> LogisticRegression {
    LogisticRegression::new()
        .with_balanced_weights(true)
        .with_max_iter(2000)
}

#[test]
fn test_cleaned_table_shape_and_label() {
    let raw = raw_customers(24, 24);
    let cleaned = CleanPipeline::new(PipelineConfig::new(as_of()))
        .run(&raw)
        .unwrap();

    assert_eq!(cleaned.height(), 48);
    // Raw export headers are gone, and so are the consumed source columns
    assert!(cleaned.column("Contract Type").is_err());
    assert!(cleaned.column("contracttype").is_err());
    assert!(cleaned.column("firstdealDT").is_err());

    let churn: Vec<i64> = cleaned
        .column("churn")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(churn.iter().sum::<i64>(), 24);

    let cadence = cleaned.column("callcycle_numeric").unwrap();
    for value in cadence.i64().unwrap().into_no_null_iter() {
        assert!([12, 4, 1, 0].contains(&value));
    }
}

#[test]
fn test_matrix_names_match_feature_setup() {
    let raw = raw_customers(24, 24);
    let cleaned = CleanPipeline::new(PipelineConfig::new(as_of()))
        .run(&raw)
        .unwrap();

    let (features, options) = churn_features(false);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&cleaned, &features, "churn").unwrap();

    assert_eq!(
        matrix.names,
        vec![
            "callsPerQuarter",
            "associateddeals",
            "callcycle_numeric",
            "callcycle_numeric_2",
            "callsPerQuarter associateddeals",
            "assoccontacts associateddeals",
            "assoccontacts MRR",
        ]
    );
    assert_eq!(matrix.n_samples(), 48);
    assert_eq!(matrix.y.iter().sum::<i64>(), 24);
}

#[test]
fn test_end_to_end_evaluation() {
    let raw = raw_customers(24, 24);
    let cleaned = CleanPipeline::new(PipelineConfig::new(as_of()))
        .run(&raw)
        .unwrap();

    let (features, options) = churn_features(true);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&cleaned, &features, "churn").unwrap();

    let evaluator = RocEvaluator::new(3, 1234);
    let roc = evaluator
        .evaluate(make_classifier, &matrix.x, &matrix.y)
        .unwrap();

    assert!(roc.auc > 0.95, "mean AUC was {}", roc.auc);
    assert_eq!(roc.fold_aucs.len(), 3);
    for fold_auc in &roc.fold_aucs {
        assert!(*fold_auc > 0.9, "fold AUC was {fold_auc}");
    }
}

#[test]
fn test_end_to_end_smote_evaluation() {
    let raw = raw_customers(36, 12);
    let cleaned = CleanPipeline::new(PipelineConfig::new(as_of()))
        .run(&raw)
        .unwrap();

    let (features, options) = churn_features(true);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&cleaned, &features, "churn").unwrap();

    let evaluator = RocEvaluator::new(3, 1234);
    let resampler = Smote::new();
    let a = evaluator
        .evaluate_resampled(make_classifier, &resampler, &matrix.x, &matrix.y)
        .unwrap();
    let b = evaluator
        .evaluate_resampled(make_classifier, &resampler, &matrix.x, &matrix.y)
        .unwrap();

    assert!(a.auc > 0.9, "mean AUC with SMOTE was {}", a.auc);
    assert_eq!(a.auc.to_bits(), b.auc.to_bits());
}

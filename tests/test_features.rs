//! Integration test: cleaned table to feature matrix

use churnflow::error::ChurnError;
use churnflow::features::{FeatureSet, MatrixBuilder, MatrixOptions, OneHotEncoder};
use polars::prelude::*;

fn cleaned_df() -> DataFrame {
    df!(
        "callsPerQuarter" => &[2.0f64, 8.0, 1.0, 4.0, 6.0, 3.0],
        "associateddeals" => &[1.0f64, 4.0, 1.0, 2.0, 3.0, 1.0],
        "callcycle_numeric" => &[12i64, 4, 1, 2, 6, 0],
        "callcycle" => &["Monthly", "Quarterly", "Yearly", "Half Year", "Every Other Month", "None"],
        "churn" => &[0i64, 0, 1, 0, 1, 0],
    )
    .unwrap()
}

#[test]
fn test_numeric_and_categorical_counts() {
    // Two numeric features plus one three-level categorical, no options,
    // expands to five feature columns
    let df = df!(
        "a" => &[1.0f64, 2.0, 3.0],
        "b" => &[4.0f64, 5.0, 6.0],
        "color" => &["red", "green", "blue"],
        "churn" => &[0i64, 1, 0],
    )
    .unwrap();
    let options = MatrixOptions::new().with_drop_reference(None);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&df, &FeatureSet::All, "churn").unwrap();

    assert_eq!(matrix.n_features(), 5);
    assert_eq!(
        matrix.names,
        vec!["a", "b", "color_blue", "color_green", "color_red"]
    );
    assert_eq!(matrix.y.to_vec(), vec![0, 1, 0]);
}

#[test]
fn test_column_order_base_power_interaction() {
    let df = df!(
        "A" => &[1.0f64, 2.0, 3.0],
        "B" => &[2.0f64, 4.0, 6.0],
        "churn" => &[0i64, 1, 0],
    )
    .unwrap();
    let options = MatrixOptions::new()
        .with_higher_order("A", 2)
        .with_interaction("A", "B");
    let mut builder = MatrixBuilder::new(options);
    let features = FeatureSet::named(["A", "B"]);
    let matrix = builder.fit_build(&df, &features, "churn").unwrap();

    assert_eq!(matrix.names, vec!["A", "B", "A_2", "A B"]);
    // Row 2: A = 3, B = 6, A_2 = 9, A B = 18
    assert_eq!(matrix.x[[2, 0]], 3.0);
    assert_eq!(matrix.x[[2, 1]], 6.0);
    assert_eq!(matrix.x[[2, 2]], 9.0);
    assert_eq!(matrix.x[[2, 3]], 18.0);
}

#[test]
fn test_reference_level_dropped() {
    let mut builder = MatrixBuilder::new(MatrixOptions::new());
    let features = FeatureSet::named(["callcycle_numeric", "callcycle"]);
    let matrix = builder.fit_build(&cleaned_df(), &features, "churn").unwrap();

    assert!(!matrix.names.iter().any(|n| n == "callcycle_Yearly"));
    assert!(matrix.names.iter().any(|n| n == "callcycle_Monthly"));
    // One numeric plus six cadence levels minus the reference
    assert_eq!(matrix.n_features(), 6);
}

#[test]
fn test_interaction_base_outside_feature_list() {
    // Interaction bases only need to exist in the table, not in the
    // selected feature columns
    let options = MatrixOptions::new()
        .with_drop_reference(None)
        .with_interaction("callsPerQuarter", "associateddeals");
    let mut builder = MatrixBuilder::new(options);
    let features = FeatureSet::named(["callcycle_numeric"]);
    let matrix = builder.fit_build(&cleaned_df(), &features, "churn").unwrap();

    assert_eq!(
        matrix.names,
        vec!["callcycle_numeric", "callsPerQuarter associateddeals"]
    );
    assert_eq!(matrix.x[[1, 1]], 32.0);
}

#[test]
fn test_fitted_vocabulary_aligns_tables() {
    let mut builder = MatrixBuilder::new(MatrixOptions::new().with_drop_reference(None));
    let features = FeatureSet::named(["callcycle"]);
    builder.fit(&cleaned_df(), &features, "churn").unwrap();

    // A slice of the table missing several cadence levels still produces
    // the full indicator set, zero-filled
    let subset = df!(
        "callcycle" => &["Monthly", "Monthly"],
        "churn" => &[0i64, 1],
    )
    .unwrap();
    let matrix = builder.build(&subset, &features, "churn").unwrap();
    assert_eq!(matrix.n_features(), 6);
    let monthly_idx = matrix.names.iter().position(|n| n == "callcycle_Monthly").unwrap();
    let yearly_idx = matrix.names.iter().position(|n| n == "callcycle_Yearly").unwrap();
    assert_eq!(matrix.x[[0, monthly_idx]], 1.0);
    assert_eq!(matrix.x[[0, yearly_idx]], 0.0);
}

#[test]
fn test_unseen_category_fails_loudly() {
    let mut builder = MatrixBuilder::new(MatrixOptions::new().with_drop_reference(None));
    let features = FeatureSet::named(["callcycle"]);
    builder.fit(&cleaned_df(), &features, "churn").unwrap();

    let unseen = df!(
        "callcycle" => &["Monthly", "Fortnightly"],
        "churn" => &[0i64, 1],
    )
    .unwrap();
    let err = builder.build(&unseen, &features, "churn").unwrap_err();
    assert!(matches!(
        err,
        ChurnError::UnknownCategory { ref value, .. } if value == "Fortnightly"
    ));
}

#[test]
fn test_missing_label_fails() {
    let df = df!("a" => &[1.0f64, 2.0]).unwrap();
    let mut builder = MatrixBuilder::new(MatrixOptions::new());
    let err = builder
        .fit_build(&df, &FeatureSet::named(["a"]), "churn")
        .unwrap_err();
    assert!(matches!(err, ChurnError::MissingColumn(ref c) if c == "churn"));
}

#[test]
fn test_standardize_constant_column_fails() {
    let df = df!(
        "a" => &[3.0f64, 3.0, 3.0, 3.0],
        "churn" => &[0i64, 1, 0, 1],
    )
    .unwrap();
    let options = MatrixOptions::new().with_standardize(true);
    let mut builder = MatrixBuilder::new(options);
    let err = builder
        .fit_build(&df, &FeatureSet::named(["a"]), "churn")
        .unwrap_err();
    assert!(matches!(err, ChurnError::ZeroVariance(ref c) if c == "a"));
}

#[test]
fn test_standardized_columns_centered() {
    let options = MatrixOptions::new()
        .with_drop_reference(None)
        .with_standardize(true);
    let mut builder = MatrixBuilder::new(options);
    let features = FeatureSet::named(["callsPerQuarter", "associateddeals"]);
    let matrix = builder.fit_build(&cleaned_df(), &features, "churn").unwrap();

    for j in 0..matrix.n_features() {
        let column: Vec<f64> = (0..matrix.n_samples()).map(|i| matrix.x[[i, j]]).collect();
        let mean: f64 = column.iter().sum::<f64>() / column.len() as f64;
        assert!(mean.abs() < 1e-12, "column {j} mean was {mean}");
    }
}

#[test]
fn test_encoder_round_trips_through_json() {
    let mut encoder = OneHotEncoder::new();
    encoder
        .fit(&cleaned_df(), &["callcycle".to_string()])
        .unwrap();

    let json = serde_json::to_string(&encoder).unwrap();
    let restored: OneHotEncoder = serde_json::from_str(&json).unwrap();
    assert_eq!(
        restored.categories("callcycle"),
        encoder.categories("callcycle")
    );

    // The restored vocabulary encodes a new table identically
    let subset = df!(
        "callcycle" => &["None", "Monthly"],
        "churn" => &[0i64, 1],
    )
    .unwrap();
    let a = encoder.transform(&subset).unwrap();
    let b = restored.transform(&subset).unwrap();
    assert_eq!(a.get_column_names(), b.get_column_names());
}

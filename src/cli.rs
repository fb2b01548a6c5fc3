//! Command line interface

use crate::config::{ColumnMap, PipelineConfig};
use crate::eval::RocEvaluator;
use crate::features::{FeatureSet, MatrixBuilder, MatrixOptions};
use crate::loader::{DataLoader, DataSaver};
use crate::model::LogisticRegression;
use crate::prep::CleanPipeline;
use crate::resample::Smote;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use std::path::{Path, PathBuf};
use std::time::Instant;

fn dim(s: &str) -> ColoredString {
    s.truecolor(110, 110, 110)
}

fn accent(s: &str) -> ColoredString {
    s.truecolor(250, 179, 135)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(166, 227, 161)
}

fn section(title: &str) {
    println!();
    println!("  {}", accent(title));
}

fn step_done(message: &str, elapsed: std::time::Duration) {
    println!("  {} {} {}", ok("✓"), message, dim(&format!("({elapsed:.1?})")));
}

#[derive(Parser)]
#[command(name = "churnflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer churn feature engineering and model evaluation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a raw CRM export and write the engineered table
    Clean {
        /// Path to the raw CSV export
        #[arg(short, long)]
        data: PathBuf,

        /// Where to write the cleaned CSV
        #[arg(short, long)]
        output: PathBuf,

        /// JSON file of ["raw", "canonical"] column mapping pairs
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Date tenure is measured against (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Also derive the sessionsPerDay rate column
        #[arg(long)]
        sessions_per_day: bool,
    },

    /// Cross-validated ROC evaluation of the churn model
    Evaluate {
        /// Path to the raw CSV export
        #[arg(short, long)]
        data: PathBuf,

        /// Number of stratified folds
        #[arg(long, default_value = "3")]
        folds: usize,

        /// Fold assignment seed
        #[arg(long, default_value = "1234")]
        seed: u64,

        /// Oversample each training partition with SMOTE
        #[arg(long)]
        smote: bool,

        /// Standardize feature columns
        #[arg(long)]
        standardize: bool,

        /// JSON file of ["raw", "canonical"] column mapping pairs
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Date tenure is measured against (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Also derive and use the sessionsPerDay feature
        #[arg(long)]
        sessions_per_day: bool,
    },

    /// Fit the churn model on the full table and report coefficients
    Train {
        /// Path to the raw CSV export
        #[arg(short, long)]
        data: PathBuf,

        /// Gradient descent iteration cap
        #[arg(long, default_value = "10000")]
        max_iter: usize,

        /// Standardize feature columns
        #[arg(long)]
        standardize: bool,

        /// JSON file of ["raw", "canonical"] column mapping pairs
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Date tenure is measured against (YYYY-MM-DD); defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Also derive and use the sessionsPerDay feature
        #[arg(long)]
        sessions_per_day: bool,
    },
}

fn build_config(
    mapping: Option<&Path>,
    as_of: Option<NaiveDate>,
    sessions_per_day: bool,
) -> Result<PipelineConfig> {
    let column_map = match mapping {
        Some(path) => ColumnMap::from_json_file(path)?,
        None => ColumnMap::customer_default(),
    };
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    Ok(PipelineConfig::new(as_of)
        .with_column_map(column_map)
        .with_sessions_per_day(sessions_per_day))
}

/// Feature selection and matrix options for the production churn model
fn churn_feature_setup(sessions_per_day: bool, standardize: bool) -> (FeatureSet, MatrixOptions) {
    let mut base = vec!["callsPerQuarter".to_string(), "associateddeals".to_string()];
    if sessions_per_day {
        base.push("sessionsPerDay".to_string());
    }
    base.push("callcycle_numeric".to_string());

    let options = MatrixOptions::new()
        .with_standardize(standardize)
        .with_higher_order("callcycle_numeric", 2)
        .with_interaction("callsPerQuarter", "associateddeals")
        .with_interaction("assoccontacts", "associateddeals")
        .with_interaction("assoccontacts", "MRR");
    (FeatureSet::Named(base), options)
}

pub fn cmd_clean(
    data: &Path,
    output: &Path,
    mapping: Option<&Path>,
    as_of: Option<NaiveDate>,
    sessions_per_day: bool,
) -> Result<()> {
    section("clean");

    let timer = Instant::now();
    let config = build_config(mapping, as_of, sessions_per_day)?;
    let raw = DataLoader::new().load_csv(data)?;
    step_done(
        &format!("loaded {} rows from {}", raw.height(), data.display()),
        timer.elapsed(),
    );

    let timer = Instant::now();
    let mut cleaned = CleanPipeline::new(config).run(&raw)?;
    step_done(
        &format!(
            "engineered table: {} rows x {} columns",
            cleaned.height(),
            cleaned.width()
        ),
        timer.elapsed(),
    );

    let timer = Instant::now();
    DataSaver::save_csv(&mut cleaned, output)?;
    step_done(&format!("wrote {}", output.display()), timer.elapsed());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_evaluate(
    data: &Path,
    folds: usize,
    seed: u64,
    smote: bool,
    standardize: bool,
    mapping: Option<&Path>,
    as_of: Option<NaiveDate>,
    sessions_per_day: bool,
) -> Result<()> {
    section("evaluate");

    let timer = Instant::now();
    let config = build_config(mapping, as_of, sessions_per_day)?;
    let raw = DataLoader::new().load_csv(data)?;
    let cleaned = CleanPipeline::new(config).run(&raw)?;
    step_done(&format!("cleaned {} rows", cleaned.height()), timer.elapsed());

    let timer = Instant::now();
    let (features, options) = churn_feature_setup(sessions_per_day, standardize);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&cleaned, &features, "churn")?;
    step_done(
        &format!(
            "built matrix: {} samples x {} features",
            matrix.n_samples(),
            matrix.n_features()
        ),
        timer.elapsed(),
    );

    let timer = Instant::now();
    let evaluator = RocEvaluator::new(folds, seed);
    let make_classifier =
        || LogisticRegression::new().with_balanced_weights(true).with_max_iter(2000);
    let roc = if smote {
        let resampler = Smote::new();
        evaluator.evaluate_resampled(make_classifier, &resampler, &matrix.x, &matrix.y)?
    } else {
        evaluator.evaluate(make_classifier, &matrix.x, &matrix.y)?
    };
    step_done(
        &format!(
            "evaluated {} folds{}",
            folds,
            if smote { " with SMOTE" } else { "" }
        ),
        timer.elapsed(),
    );

    section("results");
    for (fold, fold_auc) in roc.fold_aucs.iter().enumerate() {
        println!("  {} fold {}  auc {:.4}", dim("-"), fold, fold_auc);
    }
    println!("  {} mean auc {}", ok("✓"), accent(&format!("{:.4}", roc.auc)));
    Ok(())
}

pub fn cmd_train(
    data: &Path,
    max_iter: usize,
    standardize: bool,
    mapping: Option<&Path>,
    as_of: Option<NaiveDate>,
    sessions_per_day: bool,
) -> Result<()> {
    section("train");

    let timer = Instant::now();
    let config = build_config(mapping, as_of, sessions_per_day)?;
    let raw = DataLoader::new().load_csv(data)?;
    let cleaned = CleanPipeline::new(config).run(&raw)?;
    let (features, options) = churn_feature_setup(sessions_per_day, standardize);
    let mut builder = MatrixBuilder::new(options);
    let matrix = builder.fit_build(&cleaned, &features, "churn")?;
    step_done(
        &format!(
            "prepared {} samples x {} features",
            matrix.n_samples(),
            matrix.n_features()
        ),
        timer.elapsed(),
    );

    let timer = Instant::now();
    let mut model = LogisticRegression::new()
        .with_balanced_weights(true)
        .with_max_iter(max_iter);
    model.fit(&matrix.x, &matrix.y)?;
    let accuracy = model.score(&matrix.x, &matrix.y)?;
    step_done("fitted logistic regression", timer.elapsed());

    section("coefficients");
    if let Some(coefficients) = &model.coefficients {
        for (name, coefficient) in matrix.names.iter().zip(coefficients.iter()) {
            println!("  {} {:>12.6}  {}", dim("-"), coefficient, name);
        }
    }
    println!(
        "  {} {:>12.6}  (intercept)",
        dim("-"),
        model.intercept.unwrap_or(0.0)
    );
    println!(
        "  {} training accuracy {}",
        ok("✓"),
        accent(&format!("{accuracy:.4}"))
    );
    Ok(())
}

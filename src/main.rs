//! churnflow entry point

use churnflow::cli::{cmd_clean, cmd_evaluate, cmd_train, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churnflow=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Clean {
            data,
            output,
            mapping,
            as_of,
            sessions_per_day,
        } => cmd_clean(&data, &output, mapping.as_deref(), as_of, sessions_per_day)?,
        Commands::Evaluate {
            data,
            folds,
            seed,
            smote,
            standardize,
            mapping,
            as_of,
            sessions_per_day,
        } => cmd_evaluate(
            &data,
            folds,
            seed,
            smote,
            standardize,
            mapping.as_deref(),
            as_of,
            sessions_per_day,
        )?,
        Commands::Train {
            data,
            max_iter,
            standardize,
            mapping,
            as_of,
            sessions_per_day,
        } => cmd_train(
            &data,
            max_iter,
            standardize,
            mapping.as_deref(),
            as_of,
            sessions_per_day,
        )?,
    }
    Ok(())
}

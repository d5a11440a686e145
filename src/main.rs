//! Underwriter - Main Entry Point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use underwriter::data::load_csv;
use underwriter::server::{run_server, ServerConfig};
use underwriter::training::{train, TrainConfig};

#[derive(Parser)]
#[command(name = "underwriter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loan approval prediction: train and serve")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the pipeline on a CSV table and write the artifact
    Train {
        /// Training table (CSV with header)
        #[arg(short, long)]
        data: PathBuf,

        /// Output artifact path
        #[arg(short, long, default_value = "models/loan_pipeline.bin")]
        out: PathBuf,

        /// Label column with two outcomes
        #[arg(long, default_value = "Loan_Status")]
        label: String,

        /// Identifier column to drop before feature derivation
        #[arg(long, default_value = "Loan_ID")]
        id_column: String,

        /// Label value treated as approved
        #[arg(long, default_value = "Y")]
        positive: String,

        /// Cross-validation fold count
        #[arg(long, default_value = "4")]
        folds: usize,
    },

    /// Serve predictions from a trained artifact
    Serve {
        /// Artifact path
        #[arg(short, long, default_value = "models/loan_pipeline.bin")]
        artifact: PathBuf,

        /// Bind host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Bind port
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "underwriter=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            out,
            label,
            id_column,
            positive,
            folds,
        } => {
            let df = load_csv(&data)?;
            info!(rows = df.height(), columns = df.width(), "loaded training table");

            let config = TrainConfig {
                label_column: label,
                id_column: Some(id_column),
                positive_label: positive,
                folds,
                ..TrainConfig::default()
            };

            let artifact = train(&df, &config)?;
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            artifact.save(&out)?;
            info!(
                classifier = artifact.classifier.name(),
                out = %out.display(),
                "training complete"
            );
        }
        Commands::Serve {
            artifact,
            host,
            port,
        } => {
            let config = ServerConfig {
                host,
                port,
                artifact_path: artifact,
            };
            run_server(config).await?;
        }
    }

    Ok(())
}

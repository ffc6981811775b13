use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use session::ScreeningSession;
use shared::{
    domain::{Decision, RecordId},
    error::ApiException,
};
use storage::{ImportOutcome, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://screening_results.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the studies table from a CSV file if it is still empty.
    Import {
        #[arg(long, default_value = "cleaned_african_studies.csv")]
        source: PathBuf,
    },
    Stats,
    /// Print the next undecided study as JSON.
    Next,
    Decide {
        id: i64,
        decision: Decision,
    },
    Export {
        #[arg(long, default_value = "screening_results.csv")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Import { source } => match storage.initialize(&source).await? {
            ImportOutcome::Imported { rows } => println!("imported rows={rows}"),
            ImportOutcome::AlreadyPopulated { rows } => {
                println!("already populated rows={rows}")
            }
        },
        Command::Stats => {
            let counts = storage.counts().await?;
            println!(
                "total={} screened={} remaining={} included={} excluded={}",
                counts.total,
                counts.decided,
                counts.remaining(),
                counts.included,
                counts.excluded
            );
        }
        Command::Next => match storage.next_undecided().await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("All studies have been screened."),
        },
        Command::Decide { id, decision } => {
            let ctx = ScreeningSession::new(storage, PathBuf::new());
            let snapshot = session::decide(&ctx, RecordId(id), decision)
                .await
                .map_err(ApiException::from)?;
            let counts = snapshot.counts();
            println!(
                "recorded {decision} for id={id}; screened={} remaining={}",
                counts.decided,
                counts.remaining()
            );
        }
        Command::Export { path } => {
            let ctx = ScreeningSession::new(storage, path);
            let (report, _) = session::export(&ctx)
                .await
                .map_err(ApiException::from)?;
            println!("exported rows={} path={}", report.rows, report.path);
        }
    }

    Ok(())
}

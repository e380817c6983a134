use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rollcall::config::{Config, ConfigOverrides};
use rollcall::diff::compare;
use rollcall::output::csv::snapshot_to_csv;
use rollcall::output::json::render_json;
use rollcall::output::table::{render_events_table, render_snapshot_table};
use rollcall::run::{run_once, run_watch};
use rollcall::snapshot::store::build_store_chain;
use rollcall::source::{FileSource, SnapshotSource};
use tracing::warn;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "rollcall", about = "Attendance snapshot watcher")]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Override the primary stored-snapshot path
    #[arg(long)]
    store: Option<String>,
    /// Read the current snapshot from this file instead of the configured source
    #[arg(long)]
    from: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture, compare, notify and persist once
    Run,
    /// Repeat runs on a fixed interval
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
        #[arg(long, default_value_t = 1)]
        iterations: u32,
    },
    /// Print the stored baseline snapshot
    Show,
    /// Compare a snapshot file against the stored baseline without
    /// notifying or persisting
    Diff { file: PathBuf },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        source_path: cli.from.clone(),
        store_path: cli.store.clone(),
    });

    match &cli.command {
        Commands::Run => {
            run_once(&config).await?;
        }
        Commands::Watch {
            interval_secs,
            iterations,
        } => {
            run_watch(&config, *interval_secs, *iterations).await;
        }
        Commands::Show => {
            let stores = build_store_chain(&config);
            match stores.load().await {
                Some(snapshot) => match cli.output {
                    OutputFormat::Table => println!(
                        "{}",
                        render_snapshot_table(
                            &snapshot,
                            config.severity.thresholds(),
                            config.severity.parse_policy,
                        )
                    ),
                    OutputFormat::Json => println!("{}", render_json(&snapshot)?),
                    OutputFormat::Csv => println!("{}", snapshot_to_csv(&snapshot)?),
                },
                None => println!("No stored snapshot yet. Run `rollcall run` first."),
            }
        }
        Commands::Diff { file } => {
            let current = FileSource::new(file).fetch().await?;
            let previous = build_store_chain(&config).load().await;
            if previous.is_none() {
                println!("No stored snapshot yet; nothing to compare against.");
            }
            let comparison = compare(&current, previous.as_ref());
            match cli.output {
                OutputFormat::Table => println!("{}", render_events_table(&comparison)),
                OutputFormat::Json => println!("{}", render_json(&comparison)?),
                OutputFormat::Csv => {
                    warn!("CSV output for diff not implemented, using JSON");
                    println!("{}", render_json(&comparison)?);
                }
            }
        }
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
    }

    Ok(())
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wall_stats::config::Config;
use wall_stats::export::write_csv_file;
use wall_stats::{Fetcher, Field, Granularity, Statistic, Wall};

#[derive(Parser)]
#[command(name = "wall-stats")]
#[command(about = "Post statistics for a VK user or group wall")]
#[command(version)]
struct Cli {
    /// Numeric id of the user or group
    #[arg(value_parser = clap::value_parser!(i64).range(0..))]
    id: i64,

    /// The id belongs to a group
    #[arg(long)]
    group: bool,

    /// Only posts published on or after this date
    #[arg(long, value_name = "DD.MM.YYYY")]
    since: Option<String>,

    /// Period to aggregate by (year, month, day, hour); repeatable
    #[arg(long = "period", short = 'p', value_name = "PERIOD", default_value = "month")]
    periods: Vec<Granularity>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Also write the posts to this CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Comma-separated post fields to put in the CSV
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "id,text,attachments,links,likes,comments,reposts"
    )]
    fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let fetcher = Fetcher::new(&config)?;
    let mut wall = Wall::new(cli.id, cli.since.clone(), cli.group);

    info!(
        owner_id = wall.owner_id(),
        cutoff = wall.cutoff(),
        "Collecting wall statistics"
    );

    let mut stdout = std::io::stdout();
    for &granularity in &cli.periods {
        let statistics = wall.statistics(&fetcher, granularity).await;
        print_report(&mut stdout, granularity, &statistics, cli.format)?;
    }

    if let Some(path) = &cli.csv {
        let posts = wall.posts(&fetcher).await;
        write_csv_file(posts, &cli.fields, path)?;
    }

    Ok(())
}

fn print_report(
    out: &mut impl Write,
    granularity: Granularity,
    statistics: &[Statistic],
    format: Format,
) -> Result<()> {
    match format {
        Format::Json => {
            let report = serde_json::json!({
                "period": granularity,
                "statistics": statistics,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Format::Table => {
            writeln!(out, "Statistic in {granularity}")?;
            writeln!(
                out,
                "{:<16} {:>8} {:>10} {:>10} {:>10}",
                "period", "posts", "likes", "comments", "reposts"
            )?;
            for stat in statistics {
                writeln!(
                    out,
                    "{:<16} {:>8} {:>10.2} {:>10.2} {:>10.2}",
                    stat.period,
                    stat.post_count,
                    stat.average_likes,
                    stat.average_comments,
                    stat.average_reposts
                )?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries the report
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

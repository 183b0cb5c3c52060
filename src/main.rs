mod cli;

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use btcpulse::config::{self, Config};
use btcpulse::dashboard::{self, DashboardData, ReadPolicy, TimeRange};
use btcpulse::db;
use btcpulse::sync::{self, SchemaStatus, StageOutcome};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Sync => handle_sync().await,
        Commands::Init => handle_init(),
        Commands::Dashboard { range, btc, usd } => handle_dashboard(&range, btc, usd),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run one sync invocation and report per-stage outcomes.
async fn handle_sync() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    let report = sync::run(&config).await?;

    match &report.schema {
        SchemaStatus::Provisioned(schema) => println!(
            "{} Schema: articles {}, candles {}",
            "✓".green().bold(),
            schema.articles.as_str(),
            schema.candles.as_str()
        ),
        SchemaStatus::Failed(msg) => {
            println!("{} Schema provisioning failed: {}", "⚠".yellow().bold(), msg)
        }
    }
    print_stage("Articles", &report.articles);
    print_stage("Candles", &report.candles);

    if report.success() {
        println!("\n{} Sync complete", "✓".green().bold());
        Ok(())
    } else {
        Err(anyhow!("sync failed: {}", report.failure_messages().join("; ")))
    }
}

fn print_stage(name: &str, outcome: &StageOutcome) {
    match outcome {
        StageOutcome::Completed {
            inserted,
            skipped_duplicates,
        } => {
            println!(
                "{} {}: inserted {}, skipped {} duplicate(s)",
                "✓".green().bold(),
                name,
                inserted.to_string().green(),
                skipped_duplicates.to_string().yellow()
            );
        }
        StageOutcome::Failed(msg) => {
            println!("{} {}: {}", "✗".red().bold(), name, msg.red());
        }
    }
}

/// Provision the schema explicitly, printing the typed per-table outcome.
fn handle_init() -> Result<()> {
    let db_path = config::db_path_from_env().context("invalid configuration")?;
    let conn = db::open_db(&db_path)?;
    let report = db::provision_schema(&conn)?;

    println!(
        "{} articles table: {}",
        "✓".green().bold(),
        report.articles.as_str()
    );
    println!(
        "{} candles table: {}",
        "✓".green().bold(),
        report.candles.as_str()
    );
    Ok(())
}

/// Render the dashboard projection as terminal tables.
fn handle_dashboard(range: &str, btc: Option<f64>, usd: Option<f64>) -> Result<()> {
    use tabled::{settings::Style, Table, Tabled};

    let range = TimeRange::parse(range)
        .ok_or_else(|| anyhow!("unknown range '{}', expected 1d|2d|3d|7d|max|recent", range))?;

    let db_path = config::db_path_from_env().context("invalid configuration")?;
    let conn = db::open_db(&db_path)?;
    let data = DashboardData::load(&conn, range, ReadPolicy::AlwaysFresh, Utc::now())?;

    println!("{}", "Bitcoin Dashboard".bold());
    match data.window {
        Some((start, end)) => println!(
            "Range {} | {} to {} (CET)\n",
            data.range,
            dashboard::to_display_time(start).format("%Y-%m-%d %H:%M"),
            dashboard::to_display_time(end).format("%Y-%m-%d %H:%M"),
        ),
        None => {
            println!("\n{} No market data found for this range", "⚠".yellow().bold());
            return Ok(());
        }
    }

    #[derive(Tabled)]
    struct StatsRow {
        #[tabled(rename = "Close")]
        close: String,
        #[tabled(rename = "High")]
        high: String,
        #[tabled(rename = "Low")]
        low: String,
        #[tabled(rename = "Volume (BTC)")]
        volume: String,
        #[tabled(rename = "Change")]
        change: String,
    }

    if let Some(stats) = &data.stats {
        let change = match stats.percent_change {
            Some(pct) if pct >= Decimal::ZERO => format!("▲ +{:.2}%", pct).green().to_string(),
            Some(pct) => format!("▼ {:.2}%", pct).red().to_string(),
            None => "-".to_string(),
        };
        let row = StatsRow {
            close: format!("${:.2}", stats.latest_close),
            high: format!("${:.2}", stats.high),
            low: format!("${:.2}", stats.low),
            volume: format!("{:.3}", stats.volume),
            change,
        };
        let table = Table::new([row]).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    let (positive, neutral, negative) = data.sentiment.percentages();
    println!(
        "\nSentiment over {} article(s): {} | {} | {}",
        data.sentiment.total,
        format!("Positive {:.0}%", positive).green(),
        format!("Neutral {:.0}%", neutral).yellow(),
        format!("Negative {:.0}%", negative).red(),
    );

    #[derive(Tabled)]
    struct ArticleRow {
        #[tabled(rename = "Time (CET)")]
        time: String,
        #[tabled(rename = "Sentiment")]
        sentiment: String,
        #[tabled(rename = "Title")]
        title: String,
    }

    if !data.articles.is_empty() {
        let rows: Vec<ArticleRow> = data
            .articles
            .iter()
            .rev()
            .take(10)
            .map(|article| ArticleRow {
                time: article
                    .datetime
                    .map(|dt| {
                        dashboard::to_display_time(dt.and_utc())
                            .format("%m-%d %H:%M")
                            .to_string()
                    })
                    .unwrap_or_else(|| "N/A".to_string()),
                sentiment: article.sentiment.as_str().to_string(),
                title: article.title.clone(),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("\n{}", table);
    }

    if let Some(close) = data.latest_close() {
        if let Some(amount) = btc.and_then(Decimal::from_f64_retain) {
            println!(
                "\n{} BTC ≈ ${:.2} USD",
                amount,
                dashboard::btc_to_usd(amount, close)
            );
        }
        if let Some(amount) = usd.and_then(Decimal::from_f64_retain) {
            match dashboard::usd_to_btc(amount, close) {
                Some(btc_value) => println!("\n${:.2} ≈ {:.8} BTC", amount, btc_value),
                None => println!("\n{} Latest close is zero, cannot convert", "⚠".yellow()),
            }
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "btcpulse")]
#[command(version, about = "Bitcoin news and market-data sync with a read-only dashboard")]
#[command(
    long_about = "Scrapes Bitcoin news articles and Binance candles on a schedule, deduplicates \
them into a local SQLite store, labels article sentiment, and renders a read-only dashboard."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one sync invocation: provision, scrape articles, fetch candles
    Sync,

    /// Create the database schema if missing, reporting per-table outcomes
    Init,

    /// Render the dashboard for a time range
    Dashboard {
        /// Time range: 1d, 2d, 3d, 7d, max, or recent (last 1000 points)
        #[arg(long, default_value = "recent")]
        range: String,

        /// Convert this BTC amount to USD at the latest filtered close
        #[arg(long, conflicts_with = "usd")]
        btc: Option<f64>,

        /// Convert this USD amount to BTC at the latest filtered close
        #[arg(long, conflicts_with = "btc")]
        usd: Option<f64>,
    },
}

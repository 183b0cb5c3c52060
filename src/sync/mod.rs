//! Sync orchestration
//!
//! One invocation runs sequentially: provision schema, scrape + label +
//! dedupe + insert articles, fetch + dedupe + insert candles. Single
//! connection, no retries, no cross-stage transaction. Each stage reports
//! its own outcome so a partial failure is distinguishable from a total one.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{self, Article, Candle, SchemaReport};
use crate::market;
use crate::scraping::{self, utoday};

/// Articles are written in fixed-size batches; a failed batch is skipped.
pub const ARTICLE_BATCH_SIZE: usize = 10;

/// Outcome of one ingestion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed {
        inserted: usize,
        skipped_duplicates: usize,
    },
    Failed(String),
}

impl StageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

/// Outcome of the provisioning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    Provisioned(SchemaReport),
    Failed(String),
}

/// Per-stage report for one invocation.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub schema: SchemaStatus,
    pub articles: StageOutcome,
    pub candles: StageOutcome,
}

impl SyncReport {
    /// True iff neither ingestion stage failed. A provisioning failure on
    /// its own is not fatal (later queries fail loudly if it mattered).
    pub fn success(&self) -> bool {
        !self.articles.is_failure() && !self.candles.is_failure()
    }

    /// Error texts of the failed parts, for the invocation boundary.
    pub fn failure_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if let StageOutcome::Failed(msg) = &self.articles {
            messages.push(format!("articles: {}", msg));
        }
        if let StageOutcome::Failed(msg) = &self.candles {
            messages.push(format!("candles: {}", msg));
        }
        messages
    }
}

/// Run one full sync invocation.
pub async fn run(config: &Config) -> Result<SyncReport> {
    let mut conn = db::open_db(&config.db_path)?;

    let schema = match db::provision_schema(&conn) {
        Ok(report) => SchemaStatus::Provisioned(report),
        Err(e) => {
            // proceed optimistically; reads/writes below fail loudly if
            // the schema truly is missing
            warn!("Schema provisioning failed: {:#}", e);
            SchemaStatus::Failed(format!("{:#}", e))
        }
    };

    let client = scraping::build_client()?;

    let articles = match sync_articles(&mut conn, &client, utoday::SEARCH_URL).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Article ingestion failed: {:#}", e);
            StageOutcome::Failed(format!("{:#}", e))
        }
    };

    let candles = match sync_candles(&mut conn, &client, &config.market_endpoint).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Market-data ingestion failed: {:#}", e);
            StageOutcome::Failed(format!("{:#}", e))
        }
    };

    Ok(SyncReport {
        schema,
        articles,
        candles,
    })
}

/// Split scraped articles into new ones and a duplicate count, using the
/// normalized (title, datetime) key against existing rows.
pub fn partition_new_articles(
    scraped: Vec<Article>,
    existing: &HashSet<(String, Option<String>)>,
) -> (Vec<Article>, usize) {
    let total = scraped.len();
    let fresh: Vec<Article> = scraped
        .into_iter()
        .filter(|article| !existing.contains(&article.dedup_key()))
        .collect();
    let duplicates = total - fresh.len();
    (fresh, duplicates)
}

/// Keep only candles strictly newer than the latest stored open_time, so
/// the boundary row returned by a startTime query is never reinserted.
pub fn filter_new_candles(
    fetched: Vec<Candle>,
    latest: Option<DateTime<Utc>>,
) -> (Vec<Candle>, usize) {
    let total = fetched.len();
    let fresh: Vec<Candle> = match latest {
        Some(boundary) => fetched
            .into_iter()
            .filter(|candle| candle.open_time > boundary)
            .collect(),
        None => fetched,
    };
    let duplicates = total - fresh.len();
    (fresh, duplicates)
}

async fn sync_articles(
    conn: &mut Connection,
    client: &Client,
    search_url: &str,
) -> Result<StageOutcome> {
    let scraped = scraping::scrape_articles(client, search_url).await?;
    let existing = db::existing_article_keys(conn)?;
    let (fresh, skipped_duplicates) = partition_new_articles(scraped, &existing);

    if fresh.is_empty() {
        info!("No new articles to insert");
        return Ok(StageOutcome::Completed {
            inserted: 0,
            skipped_duplicates,
        });
    }

    let mut inserted = 0;
    for batch in fresh.chunks(ARTICLE_BATCH_SIZE) {
        match db::insert_articles(conn, batch) {
            Ok(n) => inserted += n,
            Err(e) => warn!(
                "Failed to insert batch of {} articles, continuing: {:#}",
                batch.len(),
                e
            ),
        }
    }

    info!(
        "Inserted {} new articles ({} duplicates skipped)",
        inserted, skipped_duplicates
    );
    Ok(StageOutcome::Completed {
        inserted,
        skipped_duplicates,
    })
}

async fn sync_candles(
    conn: &mut Connection,
    client: &Client,
    endpoint: &str,
) -> Result<StageOutcome> {
    let latest = db::latest_open_time(conn)?;
    let fetched = market::fetch_klines(client, endpoint, latest).await?;
    let (fresh, skipped_duplicates) = filter_new_candles(fetched, latest);

    if fresh.is_empty() {
        info!("No new candles to insert");
        return Ok(StageOutcome::Completed {
            inserted: 0,
            skipped_duplicates,
        });
    }

    let inserted = db::insert_candles(conn, &fresh)?;
    info!(
        "Inserted {} new candles ({} boundary/duplicate rows skipped)",
        inserted, skipped_duplicates
    );
    Ok(StageOutcome::Completed {
        inserted,
        skipped_duplicates,
    })
}

// Web scraping module for the Bitcoin news source
// Plain HTTP + HTML parsing; the search page renders server-side.

pub mod utoday;

pub use utoday::scrape_articles;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client shared by the scrape run and the market-data fetch.
/// Desktop User-Agent (the news site serves bots a stub) and a per-request
/// timeout; no retries anywhere in the ingestion path.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

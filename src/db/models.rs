use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils;

/// Coarse sentiment label derived from a polarity score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Unknown => "unknown",
        }
    }
}

impl FromStr for Sentiment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            "unknown" => Ok(Sentiment::Unknown),
            _ => Err(()),
        }
    }
}

/// One scraped news article
///
/// `datetime` is naive second-precision (timezone stripped during
/// normalization) and `None` when the publish date could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub title: String,
    pub link: String,
    pub author: String,
    pub datetime: Option<NaiveDateTime>,
    pub content: String,
    pub sentiment: Sentiment,
}

impl Article {
    /// Normalized (title, datetime) pair used purely for duplicate
    /// detection: title lowercased and trimmed, datetime reformatted to the
    /// canonical second-precision string.
    pub fn dedup_key(&self) -> (String, Option<String>) {
        (
            normalize_title(&self.title),
            self.datetime
                .map(|dt| dt.format(utils::CANONICAL_FORMAT).to_string()),
        )
    }
}

/// Lowercase and trim a title for dedup comparison.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// One fixed-interval OHLCV candle from the market-data endpoint
///
/// `open_time` is the primary key and the sole dedup key. `ignore_field`
/// is an opaque passthrough from the upstream 12-column array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
    pub quote_asset_volume: Decimal,
    pub number_of_trades: i64,
    pub taker_buy_base_asset_volume: Decimal,
    pub taker_buy_quote_asset_volume: Decimal,
    pub ignore_field: String,
}

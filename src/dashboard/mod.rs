//! Read-only dashboard projection
//!
//! Pure read path over the two tables: one mutually exclusive time window
//! bounds the candle stats and the article sentiment panel together, so
//! both views stay in sync. No caching: every load re-reads the store.

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::{self, Article, Candle, Sentiment};

/// Default window: the most recent candles when no range button is active.
pub const DEFAULT_POINT_LIMIT: usize = 1000;

/// Fixed display timezone (CET).
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

/// Convert a stored UTC timestamp to display time.
pub fn to_display_time(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    ts.with_timezone(&display_offset())
}

/// Mutually exclusive time-range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Most recent `DEFAULT_POINT_LIMIT` candles (the default).
    Recent,
    /// Last N days, counted back from "now".
    Days(u8),
    /// Everything stored.
    Max,
}

impl TimeRange {
    /// Parse a range button name: `1d`, `2d`, `3d`, `7d`, `max`, `recent`.
    pub fn parse(raw: &str) -> Option<TimeRange> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recent" => Some(TimeRange::Recent),
            "1d" => Some(TimeRange::Days(1)),
            "2d" => Some(TimeRange::Days(2)),
            "3d" => Some(TimeRange::Days(3)),
            "7d" => Some(TimeRange::Days(7)),
            "max" => Some(TimeRange::Max),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::Recent => write!(f, "recent"),
            TimeRange::Days(n) => write!(f, "{}d", n),
            TimeRange::Max => write!(f, "max"),
        }
    }
}

/// Read policy for dashboard loads. The view must always reflect the
/// latest write, so the only policy is a full refetch per load; the
/// parameter keeps that decision explicit at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPolicy {
    AlwaysFresh,
}

/// Aggregate stats over the filtered window only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub latest_close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    /// Percent change first close -> last close; `None` when undefined.
    pub percent_change: Option<Decimal>,
}

/// Sentiment counts over articles inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentimentSplit {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentSplit {
    /// Percent (positive, neutral, negative); zeros when empty.
    pub fn percentages(&self) -> (f64, f64, f64) {
        if self.total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let total = self.total as f64;
        (
            100.0 * self.positive as f64 / total,
            100.0 * self.neutral as f64 / total,
            100.0 * self.negative as f64 / total,
        )
    }
}

/// Convert BTC to USD at the given close price.
pub fn btc_to_usd(amount: Decimal, close: Decimal) -> Decimal {
    amount * close
}

/// Convert USD to BTC at the given close price; `None` at a zero close.
pub fn usd_to_btc(amount: Decimal, close: Decimal) -> Option<Decimal> {
    if close.is_zero() {
        None
    } else {
        Some(amount / close)
    }
}

/// One loaded dashboard snapshot.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub range: TimeRange,
    /// UTC window shared by candles and articles; `None` when no candle
    /// falls inside the range.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub candles: Vec<Candle>,
    pub articles: Vec<Article>,
    pub stats: Option<Stats>,
    pub sentiment: SentimentSplit,
}

impl DashboardData {
    /// Load a fresh snapshot. Both tables are re-read in full on every
    /// call; filtering happens in memory, exactly mirroring what was just
    /// written.
    pub fn load(
        conn: &Connection,
        range: TimeRange,
        _policy: ReadPolicy,
        now: DateTime<Utc>,
    ) -> Result<DashboardData> {
        let all_candles = db::all_candles(conn)?;
        let all_articles = db::all_articles(conn)?;
        Ok(Self::project(all_candles, all_articles, range, now))
    }

    /// Pure projection over already-fetched rows.
    pub fn project(
        all_candles: Vec<Candle>,
        all_articles: Vec<Article>,
        range: TimeRange,
        now: DateTime<Utc>,
    ) -> DashboardData {
        let candles: Vec<Candle> = match range {
            TimeRange::Recent => {
                let skip = all_candles.len().saturating_sub(DEFAULT_POINT_LIMIT);
                all_candles.into_iter().skip(skip).collect()
            }
            TimeRange::Days(days) => {
                let cutoff = now - chrono::Duration::days(i64::from(days));
                all_candles
                    .into_iter()
                    .filter(|c| c.open_time >= cutoff)
                    .collect()
            }
            TimeRange::Max => all_candles,
        };

        let window = match (range, candles.first(), candles.last()) {
            (TimeRange::Days(days), Some(_), _) => {
                Some((now - chrono::Duration::days(i64::from(days)), now))
            }
            (_, Some(first), Some(last)) => Some((first.open_time, last.open_time)),
            _ => None,
        };

        let articles: Vec<Article> = match window {
            Some((start, end)) => all_articles
                .into_iter()
                .filter(|article| {
                    article
                        .datetime
                        .map(|dt| {
                            let ts = dt.and_utc();
                            ts >= start && ts <= end
                        })
                        .unwrap_or(false)
                })
                .collect(),
            None => Vec::new(),
        };

        let stats = compute_stats(&candles);
        let sentiment = compute_split(&articles);

        DashboardData {
            range,
            window,
            candles,
            articles,
            stats,
            sentiment,
        }
    }

    /// Latest close inside the window, the rate used by the converter.
    pub fn latest_close(&self) -> Option<Decimal> {
        self.stats.as_ref().map(|s| s.latest_close)
    }
}

fn compute_stats(candles: &[Candle]) -> Option<Stats> {
    let first = candles.first()?;
    let last = candles.last()?;

    let mut high = first.high;
    let mut low = first.low;
    let mut volume = Decimal::ZERO;
    for candle in candles {
        if candle.high > high {
            high = candle.high;
        }
        if candle.low < low {
            low = candle.low;
        }
        volume += candle.volume;
    }

    let percent_change = if first.close.is_zero() {
        None
    } else {
        Some((last.close - first.close) / first.close * Decimal::from(100))
    };

    Some(Stats {
        latest_close: last.close,
        high,
        low,
        volume,
        percent_change,
    })
}

fn compute_split(articles: &[Article]) -> SentimentSplit {
    let mut split = SentimentSplit {
        total: articles.len(),
        ..Default::default()
    };
    for article in articles {
        match article.sentiment {
            Sentiment::Positive => split.positive += 1,
            Sentiment::Neutral => split.neutral += 1,
            Sentiment::Negative => split.negative += 1,
            Sentiment::Unknown => {}
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn candle(open_time: DateTime<Utc>, close: Decimal) -> Candle {
        Candle {
            open_time,
            open: close - dec!(10),
            high: close + dec!(50),
            low: close - dec!(50),
            close,
            volume: dec!(2),
            close_time: open_time + chrono::Duration::seconds(59),
            quote_asset_volume: dec!(0),
            number_of_trades: 10,
            taker_buy_base_asset_volume: dec!(0),
            taker_buy_quote_asset_volume: dec!(0),
            ignore_field: String::new(),
        }
    }

    fn article(datetime: Option<chrono::NaiveDateTime>, sentiment: Sentiment) -> Article {
        Article {
            id: None,
            title: "t".to_string(),
            link: "l".to_string(),
            author: "a".to_string(),
            datetime,
            content: "c".to_string(),
            sentiment,
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!(TimeRange::parse("1d"), Some(TimeRange::Days(1)));
        assert_eq!(TimeRange::parse("7D"), Some(TimeRange::Days(7)));
        assert_eq!(TimeRange::parse("max"), Some(TimeRange::Max));
        assert_eq!(TimeRange::parse("recent"), Some(TimeRange::Recent));
        assert_eq!(TimeRange::parse("5d"), None);
    }

    #[test]
    fn test_days_range_bounds_candles_and_articles_together() {
        let now = at(12);
        let candles = vec![
            candle(now - chrono::Duration::days(3), dec!(40000)),
            candle(now - chrono::Duration::hours(12), dec!(41000)),
            candle(now - chrono::Duration::hours(1), dec!(42000)),
        ];
        let articles = vec![
            article(
                Some((now - chrono::Duration::days(2)).naive_utc()),
                Sentiment::Positive,
            ),
            article(
                Some((now - chrono::Duration::hours(2)).naive_utc()),
                Sentiment::Negative,
            ),
            article(None, Sentiment::Positive),
        ];

        let data = DashboardData::project(candles, articles, TimeRange::Days(1), now);

        assert_eq!(data.candles.len(), 2);
        // the 2-day-old article and the undated one fall outside
        assert_eq!(data.articles.len(), 1);
        assert_eq!(data.sentiment.total, 1);
        assert_eq!(data.sentiment.negative, 1);
    }

    #[test]
    fn test_stats_over_filtered_window_only() {
        let now = at(12);
        let candles = vec![
            candle(now - chrono::Duration::hours(3), dec!(40000)),
            candle(now - chrono::Duration::hours(1), dec!(42000)),
        ];

        let data = DashboardData::project(candles, Vec::new(), TimeRange::Max, now);
        let stats = data.stats.unwrap();
        assert_eq!(stats.latest_close, dec!(42000));
        assert_eq!(stats.high, dec!(42050));
        assert_eq!(stats.low, dec!(39950));
        assert_eq!(stats.volume, dec!(4));
        assert_eq!(stats.percent_change, Some(dec!(5)));
    }

    #[test]
    fn test_recent_range_caps_points_and_windows_on_kept_candles() {
        let now = at(12);
        let candles: Vec<Candle> = (0..(DEFAULT_POINT_LIMIT + 5))
            .map(|i| {
                candle(
                    at(0) + chrono::Duration::minutes(i as i64),
                    dec!(40000),
                )
            })
            .collect();

        let data = DashboardData::project(candles, Vec::new(), TimeRange::Recent, now);
        assert_eq!(data.candles.len(), DEFAULT_POINT_LIMIT);
        let (start, _) = data.window.unwrap();
        assert_eq!(start, at(0) + chrono::Duration::minutes(5));
    }

    #[test]
    fn test_empty_store_has_no_stats_and_no_articles() {
        let data = DashboardData::project(Vec::new(), Vec::new(), TimeRange::Max, at(12));
        assert!(data.stats.is_none());
        assert!(data.window.is_none());
        assert!(data.articles.is_empty());
        assert_eq!(data.sentiment.percentages(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_sentiment_percentages() {
        let split = SentimentSplit {
            total: 4,
            positive: 2,
            neutral: 1,
            negative: 1,
        };
        assert_eq!(split.percentages(), (50.0, 25.0, 25.0));
    }

    #[test]
    fn test_converter_both_directions() {
        assert_eq!(btc_to_usd(dec!(2), dec!(42000)), dec!(84000));
        assert_eq!(usd_to_btc(dec!(84000), dec!(42000)), Some(dec!(2)));
        assert_eq!(usd_to_btc(dec!(100), Decimal::ZERO), None);
    }

    #[test]
    fn test_display_offset_is_cet() {
        let utc = at(12);
        assert_eq!(to_display_time(utc).time().to_string(), "13:00:00");
    }
}

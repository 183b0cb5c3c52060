// Database module - SQLite connection, provisioning, and queries

pub mod models;

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::info;

use crate::utils;
pub use models::{normalize_title, Article, Candle, Sentiment};

/// Open database connection
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Outcome of provisioning a single table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    AlreadyExists,
}

impl SchemaOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaOutcome::Created => "created",
            SchemaOutcome::AlreadyExists => "already exists",
        }
    }
}

/// Per-table provisioning outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReport {
    pub articles: SchemaOutcome,
    pub candles: SchemaOutcome,
}

/// Idempotent schema creation for both tables.
///
/// The outcome is typed per table (created vs already existing) instead of
/// a silently swallowed error; a real failure propagates as `Err` and the
/// caller decides whether to proceed.
pub fn provision_schema(conn: &Connection) -> Result<SchemaReport> {
    let articles_existed = table_exists(conn, "articles")?;
    let candles_existed = table_exists(conn, "candles")?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    let report = SchemaReport {
        articles: if articles_existed {
            SchemaOutcome::AlreadyExists
        } else {
            SchemaOutcome::Created
        },
        candles: if candles_existed {
            SchemaOutcome::AlreadyExists
        } else {
            SchemaOutcome::Created
        },
    };

    info!(
        "Schema provisioned: articles {}, candles {}",
        report.articles.as_str(),
        report.candles.as_str()
    );
    Ok(report)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn timestamp_from_sql(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Failed to parse stored timestamp: {}", raw))
}

/// Normalized (title, datetime) pairs of every stored article.
///
/// Stored datetimes are re-parsed and reformatted rather than compared
/// verbatim, so minor representation drift between runs still matches.
pub fn existing_article_keys(conn: &Connection) -> Result<HashSet<(String, Option<String>)>> {
    let mut stmt = conn.prepare("SELECT title, datetime FROM articles")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut keys = HashSet::new();
    for row in rows {
        let (title, datetime) = row?;
        let normalized_dt = datetime.as_deref().and_then(utils::normalize_datetime);
        keys.insert((normalize_title(&title), normalized_dt));
    }
    Ok(keys)
}

/// Insert a batch of articles inside one transaction.
pub fn insert_articles(conn: &mut Connection, articles: &[Article]) -> Result<usize> {
    let tx = conn.transaction()?;
    for article in articles {
        tx.execute(
            "INSERT INTO articles (title, link, author, datetime, content, sentiment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                article.title,
                article.link,
                article.author,
                article
                    .datetime
                    .map(|dt| dt.format(utils::CANONICAL_FORMAT).to_string()),
                article.content,
                article.sentiment.as_str(),
            ],
        )?;
    }
    tx.commit()?;
    Ok(articles.len())
}

/// Get all articles, oldest first (rows with no datetime sort first).
pub fn all_articles(conn: &Connection) -> Result<Vec<Article>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, link, author, datetime, content, sentiment
         FROM articles
         ORDER BY datetime ASC, id ASC",
    )?;

    let articles = stmt
        .query_map([], |row| {
            Ok(Article {
                id: Some(row.get(0)?),
                title: row.get(1)?,
                link: row.get(2)?,
                author: row.get(3)?,
                datetime: row.get::<_, Option<String>>(4)?.and_then(|raw| {
                    NaiveDateTime::parse_from_str(&raw, utils::CANONICAL_FORMAT).ok()
                }),
                content: row.get(5)?,
                sentiment: row
                    .get::<_, String>(6)?
                    .parse::<Sentiment>()
                    .unwrap_or(Sentiment::Unknown),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(articles)
}

/// Get the most recent stored candle open_time, if any.
pub fn latest_open_time(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let mut stmt =
        conn.prepare("SELECT open_time FROM candles ORDER BY open_time DESC LIMIT 1")?;
    let raw: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

    raw.as_deref().map(timestamp_from_sql).transpose()
}

/// Insert fetched candles inside one transaction.
pub fn insert_candles(conn: &mut Connection, candles: &[Candle]) -> Result<usize> {
    let tx = conn.transaction()?;
    for candle in candles {
        tx.execute(
            "INSERT INTO candles (
                open_time, open, high, low, close, volume, close_time,
                quote_asset_volume, number_of_trades,
                taker_buy_base_asset_volume, taker_buy_quote_asset_volume, ignore_field
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                timestamp_to_sql(&candle.open_time),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
                candle.volume.to_string(),
                timestamp_to_sql(&candle.close_time),
                candle.quote_asset_volume.to_string(),
                candle.number_of_trades,
                candle.taker_buy_base_asset_volume.to_string(),
                candle.taker_buy_quote_asset_volume.to_string(),
                candle.ignore_field,
            ],
        )?;
    }
    tx.commit()?;
    Ok(candles.len())
}

/// Get all candles ordered by open_time ascending.
pub fn all_candles(conn: &Connection) -> Result<Vec<Candle>> {
    let mut stmt = conn.prepare(
        "SELECT open_time, open, high, low, close, volume, close_time,
                quote_asset_volume, number_of_trades,
                taker_buy_base_asset_volume, taker_buy_quote_asset_volume, ignore_field
         FROM candles
         ORDER BY open_time ASC",
    )?;

    let candles = stmt
        .query_map([], |row| {
            Ok(Candle {
                open_time: get_timestamp_value(row, 0)?,
                open: get_decimal_value(row, 1)?,
                high: get_decimal_value(row, 2)?,
                low: get_decimal_value(row, 3)?,
                close: get_decimal_value(row, 4)?,
                volume: get_decimal_value(row, 5)?,
                close_time: get_timestamp_value(row, 6)?,
                quote_asset_volume: get_decimal_value(row, 7)?,
                number_of_trades: row.get(8)?,
                taker_buy_base_asset_volume: get_decimal_value(row, 9)?,
                taker_buy_quote_asset_volume: get_decimal_value(row, 10)?,
                ignore_field: row.get(11)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(candles)
}

/// Helper to read a stored RFC 3339 timestamp column as `DateTime<Utc>`
fn get_timestamp_value(row: &rusqlite::Row, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Helper to read Decimal from SQLite (handles INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        provision_schema(&conn).unwrap();
        conn
    }

    fn sample_candle(open_time: DateTime<Utc>) -> Candle {
        Candle {
            open_time,
            open: dec!(42000.10),
            high: dec!(42100.00),
            low: dec!(41900.50),
            close: dec!(42050.25),
            volume: dec!(12.345),
            close_time: open_time + chrono::Duration::seconds(59),
            quote_asset_volume: dec!(519000.00),
            number_of_trades: 1234,
            taker_buy_base_asset_volume: dec!(6.7),
            taker_buy_quote_asset_volume: dec!(281000.00),
            ignore_field: "0".to_string(),
        }
    }

    #[test]
    fn test_provision_schema_reports_created_then_already_exists() {
        let conn = Connection::open_in_memory().unwrap();

        let first = provision_schema(&conn).unwrap();
        assert_eq!(first.articles, SchemaOutcome::Created);
        assert_eq!(first.candles, SchemaOutcome::Created);

        let second = provision_schema(&conn).unwrap();
        assert_eq!(second.articles, SchemaOutcome::AlreadyExists);
        assert_eq!(second.candles, SchemaOutcome::AlreadyExists);
    }

    #[test]
    fn test_article_round_trip() {
        let mut conn = test_conn();
        let article = Article {
            id: None,
            title: "Bitcoin Surges".to_string(),
            link: "https://u.today/news/x".to_string(),
            author: "Jane Doe".to_string(),
            datetime: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0),
            content: "great rally".to_string(),
            sentiment: Sentiment::Positive,
        };

        insert_articles(&mut conn, std::slice::from_ref(&article)).unwrap();

        let stored = all_articles(&conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Bitcoin Surges");
        assert_eq!(stored[0].datetime, article.datetime);
        assert_eq!(stored[0].sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_existing_article_keys_are_normalized() {
        let mut conn = test_conn();
        let article = Article {
            id: None,
            title: "  MIXED Case Title ".to_string(),
            link: "https://u.today/news/y".to_string(),
            author: "N/A".to_string(),
            datetime: NaiveDate::from_ymd_opt(2024, 2, 2)
                .unwrap()
                .and_hms_opt(8, 30, 0),
            content: "N/A".to_string(),
            sentiment: Sentiment::Neutral,
        };
        insert_articles(&mut conn, &[article]).unwrap();

        let keys = existing_article_keys(&conn).unwrap();
        assert!(keys.contains(&(
            "mixed case title".to_string(),
            Some("2024-02-02T08:30:00".to_string())
        )));
    }

    #[test]
    fn test_latest_open_time_empty_table() {
        let conn = test_conn();
        assert!(latest_open_time(&conn).unwrap().is_none());
    }

    #[test]
    fn test_candle_round_trip_and_latest() {
        let mut conn = test_conn();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::minutes(1);

        insert_candles(&mut conn, &[sample_candle(t1), sample_candle(t0)]).unwrap();

        let candles = all_candles(&conn).unwrap();
        assert_eq!(candles.len(), 2);
        // ascending by open_time regardless of insert order
        assert_eq!(candles[0].open_time, t0);
        assert_eq!(candles[1].open_time, t1);
        assert_eq!(candles[0].close, dec!(42050.25));

        assert_eq!(latest_open_time(&conn).unwrap(), Some(t1));
    }

    #[test]
    fn test_duplicate_open_time_rejected_by_primary_key() {
        let mut conn = test_conn();
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        insert_candles(&mut conn, &[sample_candle(t0)]).unwrap();
        assert!(insert_candles(&mut conn, &[sample_candle(t0)]).is_err());
    }
}

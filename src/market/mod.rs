// Market-data fetcher for the Binance klines endpoint
//
// One GET with an optional startTime (epoch ms); the response is an array
// of fixed 12-column arrays mapped to named candle fields.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::Candle;

/// Fetch candles from the endpoint, optionally bounded below by
/// `start_time` (sent as epoch milliseconds).
///
/// A non-200 response or an empty array short-circuits to an empty batch
/// without error; a malformed row is a contract violation and fails the
/// whole fetch.
pub async fn fetch_klines(
    client: &Client,
    endpoint: &str,
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Candle>> {
    let mut request = client.get(endpoint);
    if let Some(ts) = start_time {
        info!("Fetching candles from {} (UTC)", ts);
        request = request.query(&[("startTime", ts.timestamp_millis().to_string())]);
    }

    let response = request
        .send()
        .await
        .context("Failed to fetch market data")?;

    if !response.status().is_success() {
        warn!(
            "Market-data endpoint returned {}, skipping",
            response.status()
        );
        return Ok(Vec::new());
    }

    let rows: Vec<Value> = response
        .json()
        .await
        .context("Failed to parse market-data response")?;

    let candles = rows
        .iter()
        .map(map_kline_row)
        .collect::<Result<Vec<_>>>()?;

    info!("Fetched {} candles", candles.len());
    Ok(candles)
}

/// Map one 12-element kline array to a candle.
///
/// Upstream column order: open_time, open, high, low, close, volume,
/// close_time, quote_asset_volume, number_of_trades,
/// taker_buy_base_asset_volume, taker_buy_quote_asset_volume, ignore.
pub fn map_kline_row(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| anyhow!("kline row is not an array"))?;
    if fields.len() != 12 {
        return Err(anyhow!(
            "kline row has {} columns, expected 12",
            fields.len()
        ));
    }

    Ok(Candle {
        open_time: millis_to_utc(value_as_i64(&fields[0], "open_time")?)?,
        open: value_as_decimal(&fields[1], "open")?,
        high: value_as_decimal(&fields[2], "high")?,
        low: value_as_decimal(&fields[3], "low")?,
        close: value_as_decimal(&fields[4], "close")?,
        volume: value_as_decimal(&fields[5], "volume")?,
        close_time: millis_to_utc(value_as_i64(&fields[6], "close_time")?)?,
        quote_asset_volume: value_as_decimal(&fields[7], "quote_asset_volume")?,
        number_of_trades: value_as_i64(&fields[8], "number_of_trades")?,
        taker_buy_base_asset_volume: value_as_decimal(&fields[9], "taker_buy_base_asset_volume")?,
        taker_buy_quote_asset_volume: value_as_decimal(
            &fields[10],
            "taker_buy_quote_asset_volume",
        )?,
        ignore_field: fields[11]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| fields[11].to_string()),
    })
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| anyhow!("epoch milliseconds out of range: {}", ms))
}

fn value_as_i64(value: &Value, field: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| anyhow!("kline field '{}' is not an integer: {}", field, value))
}

fn value_as_decimal(value: &Value, field: &str) -> Result<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s)
            .with_context(|| format!("kline field '{}' is not a decimal: {}", field, s)),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .with_context(|| format!("kline field '{}' is not a decimal: {}", field, n)),
        other => Err(anyhow!(
            "kline field '{}' has unexpected type: {}",
            field,
            other
        )),
    }
}

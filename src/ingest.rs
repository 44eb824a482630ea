//! CSV boundary: watch-history rows in, `Record`s out, plus the two mapping
//! tables. Rows the core must never see (unavailable videos, unparsable
//! timestamps) are dropped here with a counted warning.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{Quarter, Record};

const DATE_FORMAT: &str = "%d-%b-%Y";
const TIME_FORMAT: &str = "%H:%M:%S";

// The export writes this channel/URL pair for deleted, privated, or
// terminated videos. No real record behind them.
const UNAVAILABLE_CHANNEL: &str = "here";
const UNAVAILABLE_CHANNEL_URL: &str = "https://myaccount.google.com/activitycontrols";

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Video Title")]
    title: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Channel Name")]
    channel: String,
    #[serde(rename = "Channel URL")]
    channel_url: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
}

fn record_id(url: &str, title: &str) -> String {
    format!("{:016x}", xxh3_64(format!("{}|{}", url, title).as_bytes()))
}

/// Explicit parse result for a row's timestamp; the caller decides what a
/// `None` means rather than catching anything.
fn parse_timestamp(date: &str, time: &str) -> Option<(NaiveDate, NaiveTime)> {
    let d = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    let t = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).ok()?;
    Some((d, t))
}

fn parse_history<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut unavailable = 0usize;
    let mut bad_timestamps = 0usize;

    for row in rdr.deserialize::<HistoryRow>() {
        let row = row.context("decoding watch-history row")?;
        if row.channel == UNAVAILABLE_CHANNEL && row.channel_url == UNAVAILABLE_CHANNEL_URL {
            unavailable += 1;
            continue;
        }
        let Some((date, time)) = parse_timestamp(&row.date, &row.time) else {
            bad_timestamps += 1;
            continue;
        };

        let title = row.title.trim().to_string();
        records.push(Record {
            id: record_id(&row.url, &title),
            title,
            url: row.url,
            channel: row.channel,
            channel_url: row.channel_url,
            quarter: Quarter::from_month(date.month()),
            date,
            time,
            tokens: Vec::new(),
            state_labels: Vec::new(),
            country_labels: Vec::new(),
        });
    }

    if unavailable > 0 {
        info!("Dropped unavailable-video rows - count={}", unavailable);
    }
    if bad_timestamps > 0 {
        warn!("Dropped rows with unparsable timestamps - count={}", bad_timestamps);
    }
    Ok(records)
}

/// Load and clean the watch-history export.
pub fn load_history(path: &Path) -> Result<Vec<Record>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening watch history {}", path.display()))?;
    let records = parse_history(rdr)?;
    info!("Watch history loaded - rows={}, path={}", records.len(), path.display());
    Ok(records)
}

fn parse_mapping<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for row in rdr.records() {
        let row = row.context("decoding mapping row")?;
        let key = row.get(0).unwrap_or("").trim();
        let value = row.get(1).unwrap_or("").trim();
        if !key.is_empty() && !value.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    Ok(pairs)
}

/// Load a two-column reference table (City,State or City,Country).
pub fn load_mapping(path: &Path) -> Result<Vec<(String, String)>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening mapping table {}", path.display()))?;
    let pairs = parse_mapping(rdr)?;
    debug!("Mapping table loaded - entries={}, path={}", pairs.len(), path.display());
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_reader(body: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new().from_reader(body.as_bytes())
    }

    const HEADER: &str = "Video Title,URL,Channel Name,Channel URL,Date,Time\n";

    #[test]
    fn parses_valid_rows_with_quarter_and_id() {
        let body = format!(
            "{}Paris Travel Vlog,https://v/1,TravelCo,https://c/1,15-Mar-2023,18:30:00\n",
            HEADER
        );
        let records = parse_history(history_reader(&body)).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.date.year(), 2023);
        assert_eq!(r.quarter, Quarter::Q1);
        assert_eq!(r.id.len(), 16);
        assert!(r.tokens.is_empty());
    }

    #[test]
    fn unparsable_dates_never_reach_the_core() {
        let body = format!(
            "{}Good,https://v/1,C,https://c/1,15-Mar-2023,10:00:00\n\
             Bad date,https://v/2,C,https://c/1,2023-03-15,10:00:00\n\
             Bad time,https://v/3,C,https://c/1,15-Mar-2023,bogus\n",
            HEADER
        );
        let records = parse_history(history_reader(&body)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://v/1");
    }

    #[test]
    fn unavailable_video_rows_are_dropped() {
        let body = format!(
            "{}Gone,https://v/1,here,https://myaccount.google.com/activitycontrols,15-Mar-2023,10:00:00\n",
            HEADER
        );
        assert!(parse_history(history_reader(&body)).unwrap().is_empty());
    }

    #[test]
    fn titles_are_trimmed_and_ids_stay_stable() {
        let body = format!(
            "{}  Spaced Title ,https://v/1,C,https://c/1,01-Jan-2024,00:00:01\n",
            HEADER
        );
        let records = parse_history(history_reader(&body)).unwrap();
        assert_eq!(records[0].title, "Spaced Title");
        assert_eq!(records[0].id, record_id("https://v/1", "Spaced Title"));
    }

    #[test]
    fn mapping_loader_skips_blank_pairs() {
        let body = "City,Country\nParis,France\n,\nTokyo,Japan\n";
        let rdr = csv::ReaderBuilder::new().from_reader(body.as_bytes());
        let pairs = parse_mapping(rdr).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("Paris".to_string(), "France".to_string()),
                ("Tokyo".to_string(), "Japan".to_string()),
            ]
        );
    }
}

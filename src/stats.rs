//! Activity statistics: zero-filled monthly and hourly watch counts with
//! IQR-capped outliers, and the most-watched channels.
//!
//! Missing periods are written as explicit zeros. Skipping them instead leaves
//! discontinuities that plotting tools handle badly. Outliers (autoplay left
//! running overnight) are capped at Q3 + 1.5·IQR.

use chrono::{Datelike, Timelike};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Quarter, Record};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyActivity {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Total Watchtime")]
    pub watch_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyActivity {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Quarter")]
    pub quarter: Quarter,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Total Watchtime")]
    pub watch_count: f64,
    #[serde(rename = "Date")]
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelCount {
    #[serde(rename = "Channel Name")]
    pub channel: String,
    #[serde(rename = "Watch Count")]
    pub watch_count: u64,
}

/// Linear-interpolation quantile over a sorted slice (pandas default).
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

fn iqr_upper_bound(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    q3 + 1.5 * (q3 - q1)
}

/// Watch counts per month across the full observed range, missing months
/// zero-filled, outliers capped, counts rounded.
pub fn monthly_activity(records: &[Record]) -> Vec<MonthlyActivity> {
    let Some((min_date, max_date)) = records
        .iter()
        .map(|r| r.date)
        .minmax()
        .into_option()
    else {
        return Vec::new();
    };

    let mut counts: HashMap<(i32, u32), u64> = HashMap::new();
    for r in records {
        *counts.entry((r.date.year(), r.date.month())).or_insert(0) += 1;
    }

    let mut months: Vec<(i32, u32)> = Vec::new();
    let (mut year, mut month) = (min_date.year(), min_date.month());
    loop {
        months.push((year, month));
        if (year, month) == (max_date.year(), max_date.month()) {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    let raw: Vec<f64> = months
        .iter()
        .map(|key| *counts.get(key).unwrap_or(&0) as f64)
        .collect();
    let cap = iqr_upper_bound(&raw);

    months
        .into_iter()
        .zip(raw)
        .map(|((y, m), v)| MonthlyActivity {
            year: y,
            month: MONTH_NAMES[m as usize - 1].to_string(),
            watch_count: v.min(cap).round() as u64,
        })
        .collect()
}

/// Watch counts for every (observed year, quarter, hour-of-day) combination,
/// zero-filled and capped, with a placeholder quarter-start date for plotting.
pub fn hourly_activity(records: &[Record]) -> Vec<HourlyActivity> {
    if records.is_empty() {
        return Vec::new();
    }

    let years: Vec<i32> = records.iter().map(Record::year).sorted().dedup().collect();
    let mut counts: HashMap<(i32, Quarter, u32), u64> = HashMap::new();
    for r in records {
        *counts
            .entry((r.year(), r.quarter, r.time.hour()))
            .or_insert(0) += 1;
    }

    let mut rows: Vec<(i32, Quarter, u32, f64)> = Vec::new();
    for &year in &years {
        for quarter in Quarter::all() {
            for hour in 0..24u32 {
                let v = *counts.get(&(year, quarter, hour)).unwrap_or(&0) as f64;
                rows.push((year, quarter, hour, v));
            }
        }
    }

    let values: Vec<f64> = rows.iter().map(|r| r.3).collect();
    let cap = iqr_upper_bound(&values);

    rows.into_iter()
        .map(|(year, quarter, hour, v)| HourlyActivity {
            year,
            quarter,
            hour,
            watch_count: v.min(cap),
            date: quarter.start_date(year),
        })
        .collect()
}

/// The `n` most-watched channels, count-descending with a stable alphabetical
/// tie-break.
pub fn top_channels(records: &[Record], n: usize) -> Vec<ChannelCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for r in records {
        *counts.entry(r.channel.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(channel, watch_count)| ChannelCount {
            channel: channel.to_string(),
            watch_count,
        })
        .collect()
}

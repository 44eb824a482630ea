//! Output artifacts: the deduplicated topic-results table, the per-bucket
//! top-10 raw token tables, and the annotated history CSV.

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::debug;

use crate::models::{KeywordRecord, Quarter, Record, TopicCandidate};

type BucketKey = (i32, Quarter);

/// Build the final keyword records for the surviving candidates.
///
/// A candidate's frequency is the number of documents in its quarter whose
/// space-joined token string contains the word — substring containment, the
/// same joining that formed the n-grams. The representative date is the first
/// date observed in the bucket, kept only so downstream plots have a date
/// axis. Identical records collapse; the result is sorted chronologically.
pub fn keyword_records(
    survivors: &[TopicCandidate],
    buckets: &BTreeMap<BucketKey, Vec<&Record>>,
) -> Vec<KeywordRecord> {
    let mut docs_by_bucket: HashMap<BucketKey, Vec<String>> = HashMap::new();
    let mut date_by_bucket: HashMap<BucketKey, String> = HashMap::new();
    for (key, records) in buckets {
        docs_by_bucket.insert(*key, records.iter().map(|r| r.doc()).collect());
        if let Some(first) = records.first() {
            date_by_bucket.insert(*key, first.date.format("%m %d %Y").to_string());
        }
    }

    let mut out: BTreeSet<KeywordRecord> = BTreeSet::new();
    for c in survivors {
        let key = (c.year, c.quarter);
        let Some(docs) = docs_by_bucket.get(&key) else {
            continue;
        };
        let frequency = docs.iter().filter(|d| d.contains(&c.word)).count() as u64;
        out.insert(KeywordRecord {
            year: c.year,
            representative_date: date_by_bucket.get(&key).cloned().unwrap_or_default(),
            quarter: c.quarter,
            word: c.word.clone(),
            frequency,
        });
    }
    out.into_iter().collect()
}

/// Re-deduplicate a record set. Idempotent: already-unique input comes back
/// identical.
pub fn dedup_records(records: Vec<KeywordRecord>) -> Vec<KeywordRecord> {
    records
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The ten most common raw tokens of a bucket, count-descending with a stable
/// alphabetical tie-break.
pub fn top_tokens(records: &[&Record], n: usize) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for r in records {
        for t in &r.tokens {
            *counts.entry(t.as_str()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(t, c)| (t.to_string(), c))
        .collect()
}

/// Write one `{year}_{quarter}_common_keywords.txt` per nonempty bucket.
/// Empty buckets produce no file; absence is meaningful.
pub fn write_common_keywords(
    dir: &Path,
    buckets: &BTreeMap<BucketKey, Vec<&Record>>,
    n: usize,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating report directory {}", dir.display()))?;
    for ((year, quarter), records) in buckets {
        let mut body = String::new();
        for (token, count) in top_tokens(records, n) {
            body.push_str(&format!("{}: {}\n", token, count));
        }
        let path = dir.join(format!("{}_{}_common_keywords.txt", year, quarter));
        std::fs::write(&path, body)
            .with_context(|| format!("writing {}", path.display()))?;
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Write the topic-results table (Year, Date, Quarter, Word, Frequency). The
/// header goes out explicitly so the schema survives a run with no surviving
/// candidates.
pub fn write_topic_csv(path: &Path, records: &[KeywordRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["Year", "Date", "Quarter", "Word", "Frequency"])?;
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    debug!("Wrote {} ({} rows)", path.display(), records.len());
    Ok(())
}

/// Generic one-struct-per-row CSV writer for the statistics tables.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    debug!("Wrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}

#[derive(Serialize)]
struct AnnotatedRow<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    #[serde(rename = "Video Title")]
    title: &'a str,
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Channel Name")]
    channel: &'a str,
    #[serde(rename = "Channel URL")]
    channel_url: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Title Tokens")]
    tokens: String,
    #[serde(rename = "Quarter")]
    quarter: Quarter,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Country")]
    country: String,
}

/// Write the annotated history: the stable record id, the input columns, the
/// tokens (serialized as a JSON list — the in-memory sequence stays
/// first-class between stages and is only textualized here), quarter, and the
/// delimited label sequences.
pub fn write_annotated_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for r in records {
        wtr.serialize(AnnotatedRow {
            id: &r.id,
            title: &r.title,
            url: &r.url,
            channel: &r.channel,
            channel_url: &r.channel_url,
            date: r.date.format("%d-%b-%Y").to_string(),
            time: r.time.format("%H:%M:%S").to_string(),
            tokens: serde_json::to_string(&r.tokens)?,
            quarter: r.quarter,
            state: r.state_labels.join(", "),
            country: r.country_labels.join(", "),
        })?;
    }
    wtr.flush()?;
    debug!("Wrote {} ({} rows)", path.display(), records.len());
    Ok(())
}

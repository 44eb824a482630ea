//! Pipeline driver: ingest, annotate, bucket, model, filter, report.
//!
//! Heavy state (mapping tables, tokenizer, tunables) lives in a
//! `PipelineContext` built once and passed by reference into each stage.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::flukes::filter_flukes;
use crate::ingest;
use crate::locations::{extract_locations, CapitalizedSpanRecognizer, EntityRecognizer};
use crate::models::{LocationTables, Quarter, Record};
use crate::report;
use crate::stats;
use crate::tokenize::TitleTokenizer;
use crate::topics::{model_bucket, TopicParams};

#[derive(Debug, Clone, Copy)]
pub struct PipelineParams {
    pub topic: TopicParams,
    /// Minimum distinct source URLs per year for a topic word to count as a
    /// trend rather than a fluke.
    pub min_distinct_urls: usize,
    /// Width of the per-bucket raw token frequency tables.
    pub top_keywords: usize,
    /// Width of the most-watched channels table.
    pub top_channels: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            topic: TopicParams::default(),
            min_distinct_urls: 2,
            top_keywords: 10,
            top_channels: 30,
        }
    }
}

/// Everything the stages share, constructed once per run.
pub struct PipelineContext {
    pub tables: LocationTables,
    pub tokenizer: TitleTokenizer,
    pub recognizer: Box<dyn EntityRecognizer + Sync>,
    pub params: PipelineParams,
}

impl PipelineContext {
    pub fn new(tables: LocationTables, params: PipelineParams) -> Self {
        Self {
            tables,
            tokenizer: TitleTokenizer::new(),
            recognizer: Box::new(CapitalizedSpanRecognizer::new()),
            params,
        }
    }
}

/// Attach tokens, quarter labels, and resolved location labels to every
/// record. The records are immutable after this pass.
pub fn annotate_records(ctx: &PipelineContext, records: &mut [Record]) {
    let total = records.len();
    for (i, r) in records.iter_mut().enumerate() {
        if i % 500 == 0 && i > 0 {
            let pct = (i as f32 / total as f32 * 100.0) as u32;
            info!("Annotation progress - processed={}/{} ({}%)", i, total, pct);
        }
        r.tokens = ctx.tokenizer.tokenize(&r.title);
        let (states, countries) = extract_locations(ctx.recognizer.as_ref(), &ctx.tables, &r.title);
        r.state_labels = states;
        r.country_labels = countries;
    }
}

/// Group records by (year, quarter). BTreeMap keeps buckets chronological.
pub fn bucket_records(records: &[Record]) -> BTreeMap<(i32, Quarter), Vec<&Record>> {
    let mut buckets: BTreeMap<(i32, Quarter), Vec<&Record>> = BTreeMap::new();
    for r in records {
        buckets.entry((r.year(), r.quarter)).or_default().push(r);
    }
    buckets
}

/// Run the whole pipeline: load, annotate, model per bucket, filter flukes,
/// and write every artifact under `output_dir`.
pub fn run(
    history_path: &Path,
    city_state_path: &Path,
    city_country_path: &Path,
    output_dir: &Path,
    params: PipelineParams,
) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    info!(
        "Pipeline started - history={}, output_dir={}",
        history_path.display(),
        output_dir.display()
    );

    // 1) load reference tables and history once
    let load_start = std::time::Instant::now();
    let tables = LocationTables::from_pairs(
        ingest::load_mapping(city_state_path)?,
        ingest::load_mapping(city_country_path)?,
    );
    let mut records = ingest::load_history(history_path)?;
    info!(
        "Load completed - duration={:.2}s, records={}, cities_to_states={}, cities_to_countries={}",
        load_start.elapsed().as_secs_f32(),
        records.len(),
        tables.city_to_state.len(),
        tables.city_to_country.len()
    );

    let ctx = PipelineContext::new(tables, params);

    // 2) annotate: tokens, quarters, locations
    let annotate_start = std::time::Instant::now();
    annotate_records(&ctx, &mut records);
    info!(
        "Annotation completed - duration={:.2}s, records={}",
        annotate_start.elapsed().as_secs_f32(),
        records.len()
    );

    // 3) bucket by (year, quarter) and fit one topic model per bucket
    let buckets = bucket_records(&records);
    info!("Buckets formed - count={}", buckets.len());

    let model_start = std::time::Instant::now();
    let keys: Vec<(i32, Quarter)> = buckets.keys().copied().collect();
    let candidates: Vec<_> = keys
        .par_iter()
        .flat_map(|key| {
            let group = &buckets[key];
            match model_bucket(group, key.0, key.1, &ctx.params.topic) {
                Ok(c) => {
                    debug!(
                        "Topic modeling - bucket={} {}, docs={}, candidates={}",
                        key.0,
                        key.1,
                        group.len(),
                        c.len()
                    );
                    c
                }
                // A failed bucket means no topics for that bucket, never a
                // failed run.
                Err(e) => {
                    warn!("Topic modeling failed - bucket={} {}, error={:#}", key.0, key.1, e);
                    Vec::new()
                }
            }
        })
        .collect();
    info!(
        "Topic modeling completed - duration={:.2}s, buckets={}, candidates={}",
        model_start.elapsed().as_secs_f32(),
        keys.len(),
        candidates.len()
    );

    // 4) fluke filter against the yearly populations
    let mut records_by_year: HashMap<i32, Vec<&Record>> = HashMap::new();
    for r in &records {
        records_by_year.entry(r.year()).or_default().push(r);
    }
    let survivors = filter_flukes(candidates, &records_by_year, ctx.params.min_distinct_urls);
    info!("Fluke filter completed - survivors={}", survivors.len());

    // 5) artifacts
    let persist_start = std::time::Instant::now();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    report::write_annotated_csv(&output_dir.join("annotated.csv"), &records)?;

    report::write_common_keywords(
        &output_dir.join("quarterly_reports"),
        &buckets,
        ctx.params.top_keywords,
    )?;

    let keyword_records = report::keyword_records(&survivors, &buckets);
    report::write_topic_csv(&output_dir.join("lda_topics_by_quarter.csv"), &keyword_records)?;

    let insights_dir = output_dir.join("insights");
    std::fs::create_dir_all(&insights_dir)
        .with_context(|| format!("creating {}", insights_dir.display()))?;
    report::write_csv(
        &insights_dir.join("peak_watching_months.csv"),
        &stats::monthly_activity(&records),
    )?;
    report::write_csv(
        &insights_dir.join("most_active_hours_by_quarter.csv"),
        &stats::hourly_activity(&records),
    )?;
    report::write_csv(
        &insights_dir.join("top_channels.csv"),
        &stats::top_channels(&records, ctx.params.top_channels),
    )?;
    info!(
        "Artifacts persisted - duration={:.2}s, directory={}",
        persist_start.elapsed().as_secs_f32(),
        output_dir.display()
    );

    info!(
        "Pipeline completed - total_duration={:.2}s, records={}, buckets={}, keyword_records={}",
        pipeline_start.elapsed().as_secs_f32(),
        records.len(),
        buckets.len(),
        keyword_records.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(title: &str, url: &str, month: u32) -> Record {
        Record {
            id: url.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            channel: "chan".into(),
            channel_url: "curl".into(),
            date: NaiveDate::from_ymd_opt(2023, month, 15).unwrap(),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            quarter: Quarter::from_month(month),
            tokens: Vec::new(),
            state_labels: Vec::new(),
            country_labels: Vec::new(),
        }
    }

    #[test]
    fn annotation_fills_tokens_and_labels() {
        let tables = LocationTables::from_pairs(
            Vec::new(),
            vec![("Paris".into(), "France".into())],
        );
        let ctx = PipelineContext::new(tables, PipelineParams::default());
        let mut records = vec![record("Paris Travel Vlog", "https://v/1", 3)];
        annotate_records(&ctx, &mut records);
        assert_eq!(
            records[0].tokens,
            vec!["paris", "travel", "vlog", "paris travel", "travel vlog", "paris travel vlog"]
        );
        assert_eq!(records[0].country_labels, vec!["France"]);
        assert!(records[0].state_labels.is_empty());
    }

    #[test]
    fn buckets_group_and_sort_chronologically() {
        let records = vec![
            record("a", "u1", 11),
            record("b", "u2", 2),
            record("c", "u3", 1),
        ];
        let buckets = bucket_records(&records);
        let keys: Vec<_> = buckets.keys().copied().collect();
        assert_eq!(keys, vec![(2023, Quarter::Q1), (2023, Quarter::Q4)]);
        assert_eq!(buckets[&(2023, Quarter::Q1)].len(), 2);
    }
}

//! Per-bucket topic modeling: a term-frequency document-term matrix over the
//! bucket's token documents, an LDA fit, and the deduplicated union of each
//! topic's top terms.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::lda::LdaModel;
use crate::models::{Quarter, Record, TopicCandidate};

/// Tunables for the per-bucket topic model. Defaults mirror the reference
/// analysis; all three knobs trade sensitivity for precision.
#[derive(Debug, Clone, Copy)]
pub struct TopicParams {
    /// Latent topic count.
    pub n_topics: usize,
    /// Terms kept per topic, weight-descending.
    pub top_words: usize,
    /// Minimum document frequency as a fraction of the bucket's document count.
    pub min_df: f64,
    /// EM iterations per fit.
    pub max_iter: usize,
    /// Seed for the jittered initialization.
    pub seed: u64,
}

impl Default for TopicParams {
    fn default() -> Self {
        Self {
            n_topics: 5,
            top_words: 10,
            min_df: 0.027,
            max_iter: 30,
            seed: 42,
        }
    }
}

/// Term-frequency matrix over n-gram terms (each token is already a 1–3 gram).
#[derive(Debug, Clone)]
pub struct DocTermMatrix {
    /// Sorted vocabulary; column order of `counts`.
    pub vocab: Vec<String>,
    /// Row-major `n_docs x vocab.len()` term counts.
    pub counts: Vec<f64>,
    pub n_docs: usize,
}

impl DocTermMatrix {
    /// Build from token documents, keeping terms of n-gram length 1–3 whose
    /// document frequency is at least `min_df_fraction` of the document count.
    /// A vocabulary that filters down to nothing is a valid, empty matrix.
    pub fn build(docs: &[&[String]], min_df_fraction: f64) -> Self {
        let n_docs = docs.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let threshold = min_df_fraction * n_docs as f64;
        let mut vocab: Vec<String> = doc_freq
            .iter()
            .filter(|(term, df)| {
                **df as f64 >= threshold && term.split(' ').count() <= 3
            })
            .map(|(term, _)| term.to_string())
            .collect();
        vocab.sort();

        let index: HashMap<&str, usize> = vocab
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut counts = vec![0.0f64; n_docs * vocab.len()];
        for (d, doc) in docs.iter().enumerate() {
            for token in doc.iter() {
                if let Some(&v) = index.get(token.as_str()) {
                    counts[d * vocab.len() + v] += 1.0;
                }
            }
        }

        Self {
            vocab,
            counts,
            n_docs,
        }
    }

    pub fn get(&self, doc: usize, term: usize) -> f64 {
        self.counts[doc * self.vocab.len() + term]
    }

    pub fn is_empty(&self) -> bool {
        self.n_docs == 0 || self.vocab.is_empty()
    }
}

/// Fit the bucket's topic model and return the deduplicated union of top terms,
/// each tagged with the bucket's (year, quarter) and its rank within the topic
/// that first surfaced it. An empty vocabulary produces an empty set.
pub fn model_bucket(
    records: &[&Record],
    year: i32,
    quarter: Quarter,
    params: &TopicParams,
) -> Result<Vec<TopicCandidate>> {
    let docs: Vec<&[String]> = records.iter().map(|r| r.tokens.as_slice()).collect();
    let dtm = DocTermMatrix::build(&docs, params.min_df);
    if dtm.is_empty() {
        debug!(
            "Vocabulary below min_df for bucket - year={}, quarter={}, docs={}",
            year,
            quarter,
            docs.len()
        );
        return Ok(Vec::new());
    }

    let mut lda = LdaModel::new(params.n_topics).with_seed(params.seed);
    lda.fit(&dtm, params.max_iter)
        .with_context(|| format!("LDA fit failed for {} {}", year, quarter))?;
    let topics = lda.top_terms(&dtm.vocab, params.top_words)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    for topic in topics {
        for (rank, (word, _weight)) in topic.into_iter().enumerate() {
            if seen.insert(word.clone()) {
                candidates.push(TopicCandidate {
                    year,
                    quarter,
                    word,
                    topic_rank: rank,
                });
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn record(title_tokens: &[&str]) -> Record {
        Record {
            id: "x".into(),
            title: String::new(),
            url: "u".into(),
            channel: String::new(),
            channel_url: String::new(),
            date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            quarter: Quarter::Q1,
            tokens: title_tokens.iter().map(|t| t.to_string()).collect(),
            state_labels: Vec::new(),
            country_labels: Vec::new(),
        }
    }

    #[test]
    fn min_df_fraction_prunes_rare_terms() {
        let docs_owned: Vec<Vec<String>> = vec![
            vec!["common".into(), "rare".into()],
            vec!["common".into()],
            vec!["common".into()],
            vec!["common".into()],
        ];
        let docs: Vec<&[String]> = docs_owned.iter().map(|d| d.as_slice()).collect();
        // 0.5 of 4 docs = df >= 2: "rare" (df 1) goes, "common" (df 4) stays.
        let dtm = DocTermMatrix::build(&docs, 0.5);
        assert_eq!(dtm.vocab, vec!["common".to_string()]);
    }

    #[test]
    fn counts_are_term_frequencies() {
        let docs_owned: Vec<Vec<String>> =
            vec![vec!["a".into(), "a".into(), "b".into()], vec!["b".into()]];
        let docs: Vec<&[String]> = docs_owned.iter().map(|d| d.as_slice()).collect();
        let dtm = DocTermMatrix::build(&docs, 0.0);
        assert_eq!(dtm.vocab, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(dtm.get(0, 0), 2.0);
        assert_eq!(dtm.get(0, 1), 1.0);
        assert_eq!(dtm.get(1, 0), 0.0);
        assert_eq!(dtm.get(1, 1), 1.0);
    }

    #[test]
    fn terms_longer_than_trigrams_are_rejected() {
        let docs_owned: Vec<Vec<String>> = vec![vec![
            "one two three four".into(),
            "one two three".into(),
        ]];
        let docs: Vec<&[String]> = docs_owned.iter().map(|d| d.as_slice()).collect();
        let dtm = DocTermMatrix::build(&docs, 0.0);
        assert_eq!(dtm.vocab, vec!["one two three".to_string()]);
    }

    #[test]
    fn too_small_vocabulary_yields_empty_candidates_not_error() {
        let r = record(&["solo"]);
        let records = vec![&r];
        let params = TopicParams {
            min_df: 2.0, // impossible threshold: df can never reach 2x docs
            ..TopicParams::default()
        };
        let candidates = model_bucket(&records, 2023, Quarter::Q1, &params).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn candidates_are_deduplicated_across_topics() {
        let r1 = record(&["cooking", "pasta", "cooking pasta"]);
        let r2 = record(&["cooking", "ramen"]);
        let r3 = record(&["cooking", "pasta"]);
        let records = vec![&r1, &r2, &r3];
        let params = TopicParams {
            n_topics: 3,
            ..TopicParams::default()
        };
        let candidates = model_bucket(&records, 2023, Quarter::Q2, &params).unwrap();
        let mut words: Vec<&str> = candidates.iter().map(|c| c.word.as_str()).collect();
        let before = words.len();
        words.sort();
        words.dedup();
        assert_eq!(before, words.len(), "duplicate words in candidate union");
        for c in &candidates {
            assert_eq!(c.year, 2023);
            assert_eq!(c.quarter, Quarter::Q2);
        }
    }
}

//! Fluke filtering: a topic keyword only counts as a trend if it is backed by
//! enough distinct source URLs across the candidate's entire year.
//!
//! The window is deliberately the year, not the quarter being reported: a
//! single video re-watched many times can dominate a quarter on its own, and
//! only the wider window exposes that its keyword has one unique source.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::{Record, TopicCandidate};

/// Number of distinct source URLs, across the given population, whose token
/// sequence contains `word` as an exact token.
pub fn distinct_url_count(word: &str, records: &[&Record]) -> usize {
    let mut urls: HashSet<&str> = HashSet::new();
    for r in records {
        if r.tokens.iter().any(|t| t == word) {
            urls.insert(r.url.as_str());
        }
    }
    urls.len()
}

/// Drop candidates backed by fewer than `min_distinct_urls` distinct URLs in
/// their year. Digit-only words are dropped outright; bare numbers carry no
/// insight on their own (inside a bigram or trigram they survive as part of
/// the larger term).
pub fn filter_flukes(
    candidates: Vec<TopicCandidate>,
    records_by_year: &HashMap<i32, Vec<&Record>>,
    min_distinct_urls: usize,
) -> Vec<TopicCandidate> {
    let before = candidates.len();
    let kept: Vec<TopicCandidate> = candidates
        .into_iter()
        .filter(|c| {
            if c.word.chars().all(|ch| ch.is_ascii_digit()) {
                return false;
            }
            let yearly = match records_by_year.get(&c.year) {
                Some(r) => r.as_slice(),
                None => return false,
            };
            distinct_url_count(&c.word, yearly) >= min_distinct_urls
        })
        .collect();
    debug!(
        "Fluke filter - candidates={}, kept={}, min_distinct_urls={}",
        before,
        kept.len(),
        min_distinct_urls
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quarter;
    use chrono::{NaiveDate, NaiveTime};

    fn record(url: &str, month: u32, tokens: &[&str]) -> Record {
        Record {
            id: url.to_string(),
            title: String::new(),
            url: url.to_string(),
            channel: String::new(),
            channel_url: String::new(),
            date: NaiveDate::from_ymd_opt(2023, month, 10).unwrap(),
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            quarter: Quarter::from_month(month),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            state_labels: Vec::new(),
            country_labels: Vec::new(),
        }
    }

    fn candidate(word: &str) -> TopicCandidate {
        TopicCandidate {
            year: 2023,
            quarter: Quarter::Q1,
            word: word.to_string(),
            topic_rank: 0,
        }
    }

    #[test]
    fn repeated_views_of_one_url_count_once() {
        let a = record("https://v/1", 1, &["paris"]);
        let b = record("https://v/1", 2, &["paris"]);
        let yearly = vec![&a, &b];
        assert_eq!(distinct_url_count("paris", &yearly), 1);
    }

    #[test]
    fn single_url_word_is_excluded_however_frequent() {
        // Ten rewatches in the quarter, all the same video.
        let records: Vec<Record> = (0..10)
            .map(|_| record("https://v/solo", 1, &["obscure", "topic"]))
            .collect();
        let yearly: Vec<&Record> = records.iter().collect();
        let by_year = HashMap::from([(2023, yearly)]);
        let kept = filter_flukes(vec![candidate("obscure")], &by_year, 2);
        assert!(kept.is_empty());
    }

    #[test]
    fn second_distinct_url_anywhere_in_the_year_rescues_the_word() {
        let q1 = record("https://v/1", 2, &["tokyo"]);
        let q3 = record("https://v/2", 8, &["tokyo", "food"]);
        let by_year = HashMap::from([(2023, vec![&q1, &q3])]);
        let kept = filter_flukes(vec![candidate("tokyo")], &by_year, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].word, "tokyo");
    }

    #[test]
    fn threshold_is_configurable() {
        let a = record("https://v/1", 1, &["rust"]);
        let b = record("https://v/2", 5, &["rust"]);
        let by_year = HashMap::from([(2023, vec![&a, &b])]);
        assert_eq!(filter_flukes(vec![candidate("rust")], &by_year, 3).len(), 0);
        assert_eq!(filter_flukes(vec![candidate("rust")], &by_year, 1).len(), 1);
    }

    #[test]
    fn digit_only_words_are_dropped_but_ngrams_containing_digits_survive() {
        let a = record("https://v/1", 1, &["10", "top 10"]);
        let b = record("https://v/2", 3, &["10", "top 10"]);
        let by_year = HashMap::from([(2023, vec![&a, &b])]);
        let kept = filter_flukes(
            vec![candidate("10"), candidate("top 10")],
            &by_year,
            2,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].word, "top 10");
    }

    #[test]
    fn candidate_with_unknown_year_is_dropped() {
        let by_year: HashMap<i32, Vec<&Record>> = HashMap::new();
        assert!(filter_flukes(vec![candidate("anything")], &by_year, 1).is_empty());
    }
}

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Calendar quarter of a watch event. Ordering follows the calendar so that
/// `(year, Quarter)` keys sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Total month→quarter partition: {1,2,3}→Q1, {4,5,6}→Q2, {7,8,9}→Q3,
    /// everything else (10,11,12) →Q4.
    pub fn from_month(month: u32) -> Quarter {
        match month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// Placeholder quarter-start date (`01-Jan-2023` style) for artifacts that
    /// want a plottable date axis.
    pub fn start_date(&self, year: i32) -> String {
        let month = match self {
            Quarter::Q1 => "Jan",
            Quarter::Q2 => "Apr",
            Quarter::Q3 => "Jul",
            Quarter::Q4 => "Oct",
        };
        format!("01-{}-{}", month, year)
    }

    pub fn all() -> [Quarter; 4] {
        [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4]
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One watch event, annotated once by the pipeline and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub title: String,
    pub url: String,
    pub channel: String,
    pub channel_url: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub quarter: Quarter,
    pub tokens: Vec<String>,
    pub state_labels: Vec<String>,
    pub country_labels: Vec<String>,
}

impl Record {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// The record's tokens as one whitespace-joined document string, the form
    /// the topic model and the frequency counter both consume.
    pub fn doc(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Curated city→state / city→country reference tables plus the literal name
/// sets used as the disambiguation fallback. Loaded once per run, never
/// mutated.
#[derive(Debug, Clone, Default)]
pub struct LocationTables {
    pub city_to_state: HashMap<String, String>,
    pub city_to_country: HashMap<String, String>,
    pub states: HashSet<String>,
    pub countries: HashSet<String>,
}

impl LocationTables {
    pub fn from_pairs(
        city_state: Vec<(String, String)>,
        city_country: Vec<(String, String)>,
    ) -> Self {
        let states = city_state.iter().map(|(_, s)| s.clone()).collect();
        let countries = city_country.iter().map(|(_, c)| c.clone()).collect();
        Self {
            city_to_state: city_state.into_iter().collect(),
            city_to_country: city_country.into_iter().collect(),
            states,
            countries,
        }
    }
}

/// A topic-model keyword before fluke filtering. Transient: produced per
/// bucket, consumed by the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCandidate {
    pub year: i32,
    pub quarter: Quarter,
    pub word: String,
    pub topic_rank: usize,
}

/// Final output unit of the topic pipeline. No two emitted records share the
/// same full tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeywordRecord {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Date")]
    pub representative_date: String,
    #[serde(rename = "Quarter")]
    pub quarter: Quarter,
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Frequency")]
    pub frequency: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_month_maps_to_exactly_one_quarter() {
        for month in 1..=12u32 {
            let q = Quarter::from_month(month);
            let expected = match month {
                1..=3 => Quarter::Q1,
                4..=6 => Quarter::Q2,
                7..=9 => Quarter::Q3,
                _ => Quarter::Q4,
            };
            assert_eq!(q, expected, "month {}", month);
        }
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(Quarter::from_month(3), Quarter::Q1);
        assert_eq!(Quarter::from_month(4), Quarter::Q2);
        assert_eq!(Quarter::from_month(12), Quarter::Q4);
    }

    #[test]
    fn quarters_sort_chronologically() {
        let mut keys = vec![
            (2024, Quarter::Q1),
            (2023, Quarter::Q4),
            (2023, Quarter::Q1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                (2023, Quarter::Q1),
                (2023, Quarter::Q4),
                (2024, Quarter::Q1),
            ]
        );
    }

    #[test]
    fn tables_expose_literal_name_sets() {
        let tables = LocationTables::from_pairs(
            vec![("Austin".into(), "Texas".into())],
            vec![("Paris".into(), "France".into())],
        );
        assert!(tables.states.contains("Texas"));
        assert!(tables.countries.contains("France"));
        assert_eq!(tables.city_to_state.get("Austin").unwrap(), "Texas");
    }
}

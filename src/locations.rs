//! Location extraction: an entity-recognition seam followed by two-stage
//! disambiguation against the curated mapping tables.
//!
//! Recognizers over-detect by design. Every span they emit must survive a
//! dictionary lookup (city→state, city→country) or a literal match against the
//! known state/country name sets before it becomes a label; anything else is
//! discarded. That trade of recall for precision is the point: it is what kept
//! the original NER's false positives out of the reports.

use crate::models::LocationTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    /// Geopolitical entity (city, state, country).
    Gpe,
    /// Non-political location (mountain, river, region).
    Loc,
    /// Anything else a recognizer may emit; dropped at the boundary.
    Other,
}

#[derive(Debug, Clone)]
pub struct EntitySpan {
    pub text: String,
    pub tag: EntityTag,
}

/// The entity-recognition capability consumed at the pipeline boundary.
/// Implementations are free to over-detect; resolution filters them.
pub trait EntityRecognizer {
    fn recognize(&self, text: &str) -> Vec<EntitySpan>;
}

/// Recognizer that proposes every run of capitalized words (and each
/// contiguous 1–3 word window inside a run) as a geopolitical-entity span.
///
/// Deliberately noisy: "Paris Travel Vlog" proposes "Paris", "Paris Travel",
/// "Paris Travel Vlog", "Travel", ... and only "Paris" survives resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizedSpanRecognizer;

impl CapitalizedSpanRecognizer {
    pub fn new() -> Self {
        Self
    }

    fn flush_run(run: &mut Vec<String>, spans: &mut Vec<EntitySpan>) {
        for start in 0..run.len() {
            let max_len = (run.len() - start).min(3);
            for len in 1..=max_len {
                spans.push(EntitySpan {
                    text: run[start..start + len].join(" "),
                    tag: EntityTag::Gpe,
                });
            }
        }
        run.clear();
    }
}

impl EntityRecognizer for CapitalizedSpanRecognizer {
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut run: Vec<String> = Vec::new();

        for raw in text.split_whitespace() {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
            let capitalized = word
                .chars()
                .next()
                .map(|c| c.is_uppercase())
                .unwrap_or(false);
            if capitalized {
                run.push(word.to_string());
            } else {
                Self::flush_run(&mut run, &mut spans);
            }
        }
        Self::flush_run(&mut run, &mut spans);
        spans
    }
}

/// Resolve recognizer spans into (state_labels, country_labels).
///
/// Per span: dictionary lookups first (a span may map to both a state and a
/// country); on a double miss, literal membership in the state set, then the
/// country set. Unresolvable spans vanish. Order follows the span list and
/// duplicates are preserved.
pub fn resolve_spans(
    spans: &[EntitySpan],
    tables: &LocationTables,
) -> (Vec<String>, Vec<String>) {
    let mut states = Vec::new();
    let mut countries = Vec::new();

    for span in spans {
        if !matches!(span.tag, EntityTag::Gpe | EntityTag::Loc) {
            continue;
        }
        let state = tables.city_to_state.get(&span.text);
        let country = tables.city_to_country.get(&span.text);
        if let Some(s) = state {
            states.push(s.clone());
        }
        if let Some(c) = country {
            countries.push(c.clone());
        }
        if state.is_none() && country.is_none() {
            if tables.states.contains(&span.text) {
                states.push(span.text.clone());
            } else if tables.countries.contains(&span.text) {
                countries.push(span.text.clone());
            }
        }
    }

    (states, countries)
}

/// Run a recognizer over the raw (non-lowered) title and resolve the result.
pub fn extract_locations(
    recognizer: &dyn EntityRecognizer,
    tables: &LocationTables,
    title: &str,
) -> (Vec<String>, Vec<String>) {
    let spans = recognizer.recognize(title);
    resolve_spans(&spans, tables)
}

//! Latent Dirichlet Allocation over a term-frequency matrix.
//!
//! Seeded EM-style updates: each pass computes the expected topic assignment
//! p(z|d,w) for every nonzero cell from the current document-topic and
//! topic-term distributions, accumulates, and renormalizes. Deterministic for
//! a fixed seed, which keeps bucket reports reproducible across runs.

use anyhow::{bail, Result};

use crate::topics::DocTermMatrix;

#[derive(Debug)]
pub struct LdaModel {
    n_topics: usize,
    seed: u64,
    n_terms: usize,
    /// Topic-term distribution, row-major `n_topics x n_terms`. Empty until fit.
    topic_term: Vec<f64>,
}

impl LdaModel {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            seed: 42,
            n_terms: 0,
            topic_term: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit against a document-term matrix for a fixed number of iterations.
    pub fn fit(&mut self, dtm: &DocTermMatrix, max_iter: usize) -> Result<()> {
        let n_docs = dtm.n_docs;
        let n_terms = dtm.vocab.len();
        if n_docs == 0 || n_terms == 0 {
            bail!("document-term matrix is empty");
        }
        if self.n_topics == 0 {
            bail!("topic count must be at least 1");
        }

        // Uniform init plus seeded jitter so topics can diverge.
        let mut doc_topic = vec![0.0f64; n_docs * self.n_topics];
        let mut topic_term = vec![0.0f64; self.n_topics * n_terms];
        for (idx, cell) in doc_topic.iter_mut().enumerate() {
            *cell = 1.0 / self.n_topics as f64 + self.jitter(idx) * 0.01;
        }
        for (idx, cell) in topic_term.iter_mut().enumerate() {
            *cell = 1.0 / n_terms as f64 + self.jitter(idx + 1000) * 0.01;
        }
        normalize_rows(&mut doc_topic, n_docs, self.n_topics);
        normalize_rows(&mut topic_term, self.n_topics, n_terms);

        let mut topic_probs = vec![0.0f64; self.n_topics];
        for _ in 0..max_iter {
            let mut next_doc_topic = vec![0.0f64; n_docs * self.n_topics];
            let mut next_topic_term = vec![0.0f64; self.n_topics * n_terms];

            for d in 0..n_docs {
                for v in 0..n_terms {
                    let count = dtm.get(d, v);
                    if count == 0.0 {
                        continue;
                    }
                    let mut sum = 0.0;
                    for k in 0..self.n_topics {
                        let p = doc_topic[d * self.n_topics + k] * topic_term[k * n_terms + v];
                        topic_probs[k] = p;
                        sum += p;
                    }
                    if sum <= 1e-10 {
                        continue;
                    }
                    for k in 0..self.n_topics {
                        let share = count * topic_probs[k] / sum;
                        next_doc_topic[d * self.n_topics + k] += share;
                        next_topic_term[k * n_terms + v] += share;
                    }
                }
            }

            normalize_rows(&mut next_doc_topic, n_docs, self.n_topics);
            normalize_rows(&mut next_topic_term, self.n_topics, n_terms);
            doc_topic = next_doc_topic;
            topic_term = next_topic_term;
        }

        self.n_terms = n_terms;
        self.topic_term = topic_term;
        Ok(())
    }

    /// Top `n` terms per topic, weight-descending (term-ascending on ties so
    /// output is stable).
    pub fn top_terms(&self, vocab: &[String], n: usize) -> Result<Vec<Vec<(String, f64)>>> {
        if self.topic_term.is_empty() {
            bail!("model not fitted");
        }
        if vocab.len() != self.n_terms {
            bail!(
                "vocabulary size {} does not match fitted term count {}",
                vocab.len(),
                self.n_terms
            );
        }

        let mut topics = Vec::with_capacity(self.n_topics);
        for k in 0..self.n_topics {
            let row = &self.topic_term[k * self.n_terms..(k + 1) * self.n_terms];
            let mut ranked: Vec<(String, f64)> = vocab
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            ranked.truncate(n);
            topics.push(ranked);
        }
        Ok(topics)
    }

    // Small LCG over (seed, idx); enough to break symmetry reproducibly.
    fn jitter(&self, idx: usize) -> f64 {
        const A: u64 = 1664525;
        const C: u64 = 1013904223;
        const M: u64 = 1 << 32;
        let x = A
            .wrapping_mul(self.seed.wrapping_add(idx as u64))
            .wrapping_add(C)
            % M;
        x as f64 / M as f64
    }
}

fn normalize_rows(data: &mut [f64], n_rows: usize, n_cols: usize) {
    for row in 0..n_rows {
        let slice = &mut data[row * n_cols..(row + 1) * n_cols];
        let sum: f64 = slice.iter().sum();
        if sum > 1e-10 {
            for v in slice.iter_mut() {
                *v /= sum;
            }
        }
    }
}

//! Title tokenization: lowercase word tokens minus stop words, expanded into
//! unigram/bigram/trigram terms.

use std::collections::HashSet;

/// English stop words, grouped for maintainability (NLTK/sklearn-derived).
const STOP_WORD_GROUPS: &[&[&str]] = &[
    // articles
    &["a", "an", "the"],
    // pronouns
    &[
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    ],
    // question words
    &[
        "what", "which", "who", "whom", "whose", "why", "when", "where", "how",
    ],
    // prepositions
    &[
        "about", "above", "across", "after", "against", "along", "among", "around", "at",
        "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "down",
        "during", "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto",
        "out", "outside", "over", "through", "throughout", "to", "toward", "under",
        "underneath", "until", "up", "upon", "with", "within", "without",
    ],
    // conjunctions
    &[
        "and", "as", "because", "but", "if", "or", "since", "so", "than", "that", "though",
        "unless", "while",
    ],
    // auxiliary verbs
    &[
        "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "would", "should", "could", "ought", "can", "may",
        "might", "must", "will", "shall",
    ],
    // quantifiers and determiners
    &[
        "all", "any", "both", "each", "every", "few", "more", "most", "much", "neither", "no",
        "none", "not", "one", "other", "same", "several", "some", "such", "very", "too", "only",
        "own", "then", "there", "these", "this", "those", "just", "now", "here",
    ],
    // common verbs and fillers
    &[
        "again", "also", "another", "back", "even", "ever", "get", "give", "go", "got", "made",
        "make", "say", "see", "take", "way",
    ],
];

/// Produces filtered n-gram tokens from a free-text title.
#[derive(Debug, Clone)]
pub struct TitleTokenizer {
    stop_words: HashSet<String>,
}

impl TitleTokenizer {
    /// Tokenizer with the embedded English stop-word list.
    pub fn new() -> Self {
        Self::with_stop_words(STOP_WORD_GROUPS.iter().flat_map(|g| g.iter().copied()))
    }

    /// Tokenizer with a custom stop-word set (matched lowercase).
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self { stop_words }
    }

    /// Lowercase the title, keep purely-alphanumeric non-stop-word tokens, and
    /// emit all unigrams, then all bigrams, then all trigrams, each window
    /// joined with a single space and ordered by window start.
    ///
    /// Fewer than two filtered tokens means no bigrams; fewer than three, no
    /// trigrams; an empty title yields an empty list.
    pub fn tokenize(&self, title: &str) -> Vec<String> {
        let lowered = title.to_lowercase();
        let filtered: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !self.stop_words.contains(*t))
            .collect();

        let mut out: Vec<String> = filtered.iter().map(|t| t.to_string()).collect();
        for n in [2usize, 3] {
            for window in filtered.windows(n) {
                out.push(window.join(" "));
            }
        }
        out
    }
}

impl Default for TitleTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_token_title_has_no_trigrams() {
        let tok = TitleTokenizer::new();
        assert_eq!(tok.tokenize("The Quick Fox!"), vec!["quick", "fox", "quick fox"]);
    }

    #[test]
    fn ngrams_preserve_window_start_order() {
        let tok = TitleTokenizer::with_stop_words(Vec::<&str>::new());
        assert_eq!(
            tok.tokenize("one two three"),
            vec![
                "one",
                "two",
                "three",
                "one two",
                "two three",
                "one two three",
            ]
        );
    }

    #[test]
    fn punctuation_is_stripped_not_fatal() {
        let tok = TitleTokenizer::with_stop_words(Vec::<&str>::new());
        assert_eq!(tok.tokenize("hello, world!"), vec!["hello", "world", "hello world"]);
    }

    #[test]
    fn empty_and_all_stopword_titles_yield_nothing() {
        let tok = TitleTokenizer::new();
        assert!(tok.tokenize("").is_empty());
        assert!(tok.tokenize("the of and").is_empty());
    }

    #[test]
    fn single_token_title_has_no_bigrams() {
        let tok = TitleTokenizer::new();
        assert_eq!(tok.tokenize("Minecraft"), vec!["minecraft"]);
    }

    #[test]
    fn numbers_are_kept_as_tokens() {
        let tok = TitleTokenizer::new();
        let tokens = tok.tokenize("Top 10 Moments");
        assert!(tokens.contains(&"10".to_string()));
        assert!(tokens.contains(&"top 10".to_string()));
    }
}

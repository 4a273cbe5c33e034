//! Keyword extraction and per-user frequency tracking
//!
//! Extracts candidate terms (unigrams and bigrams) from each message and
//! accumulates per-user mention counts that never reset. Terms crossing
//! the qualification threshold become preference candidates.

use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

use crate::config::MemoryConfig;

/// Fixed English stop-word list
///
/// Function words carry no preference signal; filtering them keeps the
/// cumulative counters focused on content terms.
fn load_stop_words() -> HashSet<&'static str> {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "up", "about", "into", "through", "during", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "do", "does", "did", "will", "would", "should",
        "could", "may", "might", "must", "can", "this", "that", "these", "those", "i", "you", "he",
        "she", "it", "we", "they", "them", "their", "what", "which", "who", "when", "where", "why",
        "how", "all", "many", "some", "much", "most", "other", "another", "such", "no", "not",
        "only", "own", "same", "so", "than", "too", "very", "just", "my", "your", "our", "his",
        "her", "its",
    ]
    .into_iter()
    .collect()
}

/// Cumulative mention counts for one user
#[derive(Debug, Default)]
struct UserKeywordHistory {
    /// term -> (cumulative count, order first tracked)
    counts: HashMap<String, TermStat>,
    next_order: u32,
}

#[derive(Debug, Clone, Copy)]
struct TermStat {
    count: u32,
    order: u32,
}

impl UserKeywordHistory {
    fn record(&mut self, term: &str) {
        match self.counts.get_mut(term) {
            Some(stat) => stat.count += 1,
            None => {
                let order = self.next_order;
                self.next_order += 1;
                self.counts
                    .insert(term.to_string(), TermStat { count: 1, order });
            }
        }
    }
}

/// Keyword extraction and cumulative per-user tracking
pub struct KeywordTracker {
    stop_words: HashSet<&'static str>,
    /// Per-user cumulative counters; never reset for the process lifetime
    histories: DashMap<String, UserKeywordHistory>,
    min_length: usize,
    top_terms: usize,
    qualify_threshold: u32,
}

impl KeywordTracker {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            stop_words: load_stop_words(),
            histories: DashMap::new(),
            min_length: config.keyword_min_length,
            top_terms: config.keyword_top_terms,
            qualify_threshold: config.preference_threshold,
        }
    }

    /// Extract candidate terms from one message
    ///
    /// Lowercases the text and tokenizes into alphabetic-only words.
    /// Unigrams shorter than the minimum length or in the stop-word set are
    /// dropped. Bigrams are built from adjacent non-stopword pairs of the
    /// unfiltered token stream (length filtering does not apply to bigram
    /// members). Returns the most frequent merged terms for this message
    /// only, ties broken by first occurrence.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let words = tokenize(text);

        let mut terms: Vec<String> = words
            .iter()
            .filter(|word| word.len() >= self.min_length && !self.stop_words.contains(word.as_str()))
            .cloned()
            .collect();

        for pair in words.windows(2) {
            if !self.stop_words.contains(pair[0].as_str())
                && !self.stop_words.contains(pair[1].as_str())
            {
                terms.push(format!("{} {}", pair[0], pair[1]));
            }
        }

        // count, remembering first-occurrence order for deterministic ties
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (idx, term) in terms.iter().enumerate() {
            let entry = counts.entry(term.as_str()).or_insert((0, idx));
            entry.0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(term, (count, first))| (term, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let keywords: Vec<String> = ranked
            .into_iter()
            .take(self.top_terms)
            .map(|(term, _, _)| term.to_string())
            .collect();

        tracing::debug!(keywords = ?&keywords[..keywords.len().min(5)], "keywords extracted");
        keywords
    }

    /// Merge one message's keywords into the user's cumulative counters and
    /// return every term at or above the qualification threshold
    ///
    /// The returned set is recomputed from the full history on every call,
    /// so it grows monotonically and repeats already-qualified terms.
    /// Callers must tolerate being told about known terms again. Terms are
    /// ordered by when they were first tracked, with cumulative counts.
    pub fn track_user_keywords(&self, user_id: &str, message: &str) -> Vec<(String, u32)> {
        let keywords = self.extract_keywords(message);

        let mut history = self.histories.entry(user_id.to_string()).or_default();
        for keyword in &keywords {
            history.record(keyword);
        }

        let mut qualifying: Vec<(String, u32, u32)> = history
            .counts
            .iter()
            .filter(|(_, stat)| stat.count >= self.qualify_threshold)
            .map(|(term, stat)| (term.clone(), stat.count, stat.order))
            .collect();
        qualifying.sort_by_key(|(_, _, order)| *order);

        let qualifying: Vec<(String, u32)> = qualifying
            .into_iter()
            .map(|(term, count, _)| (term, count))
            .collect();

        if !qualifying.is_empty() {
            let preview: Vec<&str> = qualifying
                .iter()
                .take(5)
                .map(|(term, _)| term.as_str())
                .collect();
            tracing::info!(user_id = %user_id, keywords = ?preview, "keywords reached threshold");
        }

        qualifying
    }

    /// Most frequent cumulative terms for a user
    pub fn top_keywords(&self, user_id: &str, limit: usize) -> Vec<(String, u32)> {
        let Some(history) = self.histories.get(user_id) else {
            return Vec::new();
        };

        let mut terms: Vec<(String, u32, u32)> = history
            .counts
            .iter()
            .map(|(term, stat)| (term.clone(), stat.count, stat.order))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        terms
            .into_iter()
            .take(limit)
            .map(|(term, count, _)| (term, count))
            .collect()
    }
}

/// Split lowercased text into runs of ASCII letters
///
/// Digits, punctuation, and non-ASCII characters all terminate a token,
/// matching the alphabetic-only extraction contract.
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut words = Vec::new();
    let mut current = String::new();

    for c in lower.chars() {
        if c.is_ascii_lowercase() {
            current.push(c);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> KeywordTracker {
        KeywordTracker::new(&MemoryConfig::default())
    }

    #[test]
    fn test_tokenize_is_alphabetic_only() {
        assert_eq!(
            tokenize("I love coffee2go, don't I?"),
            vec!["i", "love", "coffee", "go", "don", "t", "i"]
        );
    }

    #[test]
    fn test_extract_drops_stop_words_and_short_tokens() {
        let keywords = tracker().extract_keywords("I am so very fond of hiking");
        assert!(keywords.contains(&"fond".to_string()));
        assert!(keywords.contains(&"hiking".to_string()));
        assert!(!keywords.iter().any(|k| k == "so" || k == "very" || k == "am"));
    }

    #[test]
    fn test_bigrams_require_adjacent_non_stopwords() {
        let keywords = tracker().extract_keywords("machine learning is fun");
        assert!(keywords.contains(&"machine learning".to_string()));
        // "is" breaks the pair on both sides
        assert!(!keywords.contains(&"learning is".to_string()));
        assert!(!keywords.contains(&"is fun".to_string()));
    }

    #[test]
    fn test_bigram_members_skip_length_filter() {
        // "ml" is too short as a unigram but survives inside a bigram
        let keywords = tracker().extract_keywords("ml pipelines ml pipelines");
        assert!(keywords.contains(&"ml pipelines".to_string()));
        assert!(!keywords.contains(&"ml".to_string()));
    }

    #[test]
    fn test_extract_caps_terms_per_message() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let keywords = tracker().extract_keywords(text);
        assert_eq!(keywords.len(), 10);
    }

    #[test]
    fn test_qualification_requires_three_mentions() {
        let tracker = tracker();
        assert!(tracker.track_user_keywords("u1", "coffee is great").is_empty());
        assert!(tracker.track_user_keywords("u1", "coffee again").is_empty());

        let qualified = tracker.track_user_keywords("u1", "more coffee please");
        assert!(qualified.iter().any(|(term, count)| term == "coffee" && *count == 3));
    }

    #[test]
    fn test_qualifying_set_is_recomputed_not_diffed() {
        let tracker = tracker();
        for _ in 0..3 {
            tracker.track_user_keywords("u1", "tea time");
        }
        // a fourth message without the term still reports it
        let qualified = tracker.track_user_keywords("u1", "something unrelated entirely");
        assert!(qualified.iter().any(|(term, _)| term == "tea"));
    }

    #[test]
    fn test_counters_are_per_user() {
        let tracker = tracker();
        for _ in 0..3 {
            tracker.track_user_keywords("u1", "jazz records");
        }
        assert!(tracker.track_user_keywords("u2", "jazz records").is_empty());
    }

    #[test]
    fn test_top_keywords_orders_by_cumulative_count() {
        let tracker = tracker();
        tracker.track_user_keywords("u1", "rust rust rust python");
        let top = tracker.top_keywords("u1", 2);
        assert_eq!(top[0].0, "rust");
    }

    #[test]
    fn test_top_keywords_unknown_user_is_empty() {
        assert!(tracker().top_keywords("ghost", 10).is_empty());
    }
}

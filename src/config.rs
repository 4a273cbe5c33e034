//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::constants::{
    KEYWORD_MIN_LENGTH, KEYWORD_QUALIFY_THRESHOLD, KEYWORD_TOP_TERMS, SNAPSHOT_PREFERENCE_LIMIT,
};

/// Configuration for the memory engine
///
/// Stage boundaries and retrieval limits are fixed behavior (see
/// `constants`); the knobs here cover keyword ingestion and the
/// introspection surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Minimum token length considered by keyword extraction
    #[serde(default = "default_keyword_min_length")]
    pub keyword_min_length: usize,

    /// Terms retained per message by keyword extraction
    #[serde(default = "default_keyword_top_terms")]
    pub keyword_top_terms: usize,

    /// Cumulative mentions before a keyword becomes a preference
    #[serde(default = "default_preference_threshold")]
    pub preference_threshold: u32,

    /// Preferences returned by the introspection snapshot
    #[serde(default = "default_snapshot_preference_limit")]
    pub snapshot_preference_limit: usize,
}

fn default_keyword_min_length() -> usize {
    KEYWORD_MIN_LENGTH
}

fn default_keyword_top_terms() -> usize {
    KEYWORD_TOP_TERMS
}

fn default_preference_threshold() -> u32 {
    KEYWORD_QUALIFY_THRESHOLD
}

fn default_snapshot_preference_limit() -> usize {
    SNAPSHOT_PREFERENCE_LIMIT
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            keyword_min_length: default_keyword_min_length(),
            keyword_top_terms: default_keyword_top_terms(),
            preference_threshold: default_preference_threshold(),
            snapshot_preference_limit: default_snapshot_preference_limit(),
        }
    }
}

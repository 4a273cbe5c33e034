//! Memory stage classification
//!
//! The engine's recall strategy evolves with conversation depth. The
//! stage is a pure function of the user's total message count (user and
//! assistant messages combined) and is re-evaluated on every request,
//! never cached.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    STAGE2_MESSAGE_THRESHOLD, STAGE3_MESSAGE_THRESHOLD, STAGE4_MESSAGE_THRESHOLD,
};

/// Recall strategy selected purely by cumulative message count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemoryStage {
    /// Stage 1: recent raw history only
    #[serde(rename = "Stage 1")]
    BasicHistory,
    /// Stage 2: history plus tracked preferences
    #[serde(rename = "Stage 2")]
    KeywordTracking,
    /// Stage 3: weighted graph traversal with recency decay
    #[serde(rename = "Stage 3")]
    RelationshipWeighting,
    /// Stage 4: scored contextual search
    #[serde(rename = "Stage 4")]
    ContextualSearch,
}

impl MemoryStage {
    /// Classify a total message count into a stage
    ///
    /// Boundaries are inclusive on the lower edge: counts 0-4 are Stage 1,
    /// 5-14 Stage 2, 15-29 Stage 3, and 30 or more Stage 4.
    pub fn classify(message_count: u64) -> Self {
        if message_count < STAGE2_MESSAGE_THRESHOLD {
            Self::BasicHistory
        } else if message_count < STAGE3_MESSAGE_THRESHOLD {
            Self::KeywordTracking
        } else if message_count < STAGE4_MESSAGE_THRESHOLD {
            Self::RelationshipWeighting
        } else {
            Self::ContextualSearch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicHistory => "Stage 1",
            Self::KeywordTracking => "Stage 2",
            Self::RelationshipWeighting => "Stage 3",
            Self::ContextualSearch => "Stage 4",
        }
    }

    /// Stage number, 1 through 4
    pub fn number(&self) -> u8 {
        match self {
            Self::BasicHistory => 1,
            Self::KeywordTracking => 2,
            Self::RelationshipWeighting => 3,
            Self::ContextualSearch => 4,
        }
    }
}

impl fmt::Display for MemoryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

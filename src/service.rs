//! Memory service facade
//!
//! Orchestrates the per-message pipeline: ingest a message, track its
//! keywords into preferences, classify the conversation stage, and run
//! the stage-matched retrieval. The downstream generator consumes the
//! recall result; this crate stops at the node set and its summary.
//!
//! The service owns its store and trackers; nothing here is process-wide
//! state. Embedders construct one service per engine instance and inject
//! it into request handling.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::config::MemoryConfig;
use crate::errors::{Result, ValidationErrorExt};
use crate::graph_memory::{GraphStats, MemoryGraph, PreferenceNode, RetrievedNode, Role};
use crate::keywords::KeywordTracker;
use crate::retrieval::{self, MemoryNodeSummary};
use crate::stage::MemoryStage;
use crate::validation::{validate_content, validate_user_id};

/// Result of ingesting one user message
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    /// Id of the stored message node
    pub message_id: String,
    /// Every keyword at or above the qualification threshold after this
    /// message, with cumulative mention counts
    pub qualified_keywords: Vec<(String, u32)>,
}

/// A stage-dispatched recall result
#[derive(Debug, Clone, Serialize)]
pub struct Recall {
    /// Correlation id for logs
    pub request_id: Uuid,
    pub user_id: String,
    pub stage: MemoryStage,
    /// Full node set; drives prompt construction
    pub nodes: Vec<RetrievedNode>,
    /// Capped display view of `nodes`
    pub summary: Vec<MemoryNodeSummary>,
}

/// Introspection view of one user's memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub user_id: String,
    pub stage: MemoryStage,
    pub conversation_count: u64,
    pub graph_stats: GraphStats,
    pub top_preferences: Vec<PreferenceNode>,
}

/// Per-user conversational memory engine
pub struct MemoryService {
    config: MemoryConfig,
    graph: MemoryGraph,
    keywords: KeywordTracker,
}

impl MemoryService {
    pub fn new(config: MemoryConfig) -> Self {
        let keywords = KeywordTracker::new(&config);
        Self {
            config,
            graph: MemoryGraph::new(),
            keywords,
        }
    }

    /// Direct access to the underlying graph store
    pub fn graph(&self) -> &MemoryGraph {
        &self.graph
    }

    /// Record an incoming user message and feed the preference model
    ///
    /// Adds the message, merges its keywords into the cumulative tracker,
    /// and brings preference nodes in sync with every qualifying term. A
    /// term that just reached the threshold replays its accumulated
    /// mentions, so the new node's count matches the mention history; a
    /// term that re-qualifies records one more mention. Repeating this for
    /// already-known terms on every message is intended behavior: each
    /// message a user sends keeps reinforcing their established
    /// preferences.
    pub fn observe_user_message(&self, user_id: &str, text: &str) -> Result<IngestReceipt> {
        validate_user_id(user_id).map_validation_err("user_id")?;
        validate_content(text).map_validation_err("message")?;

        let message_id = self.graph.add_message(user_id, text, Role::User);

        let qualified_keywords = self.keywords.track_user_keywords(user_id, text);
        for (keyword, cumulative) in &qualified_keywords {
            let mentions_to_apply = if self.graph.preference_exists(user_id, keyword) {
                1
            } else {
                *cumulative
            };
            for _ in 0..mentions_to_apply {
                self.graph
                    .create_or_update_preference(user_id, keyword, None)?;
            }
        }

        Ok(IngestReceipt {
            message_id,
            qualified_keywords,
        })
    }

    /// Record a generated assistant reply
    ///
    /// Counts toward stage classification like any message; keywords are
    /// tracked only for user messages.
    pub fn observe_assistant_message(&self, user_id: &str, text: &str) -> Result<String> {
        validate_user_id(user_id).map_validation_err("user_id")?;
        validate_content(text).map_validation_err("message")?;

        Ok(self.graph.add_message(user_id, text, Role::Assistant))
    }

    /// Current stage for a user, re-evaluated from the live message count
    pub fn stage_for(&self, user_id: &str) -> MemoryStage {
        MemoryStage::classify(self.graph.count_user_messages(user_id))
    }

    /// Run the stage-matched retrieval for a user's current message
    pub fn recall(&self, user_id: &str, current_message: &str) -> Result<Recall> {
        validate_user_id(user_id).map_validation_err("user_id")?;

        let request_id = Uuid::new_v4();
        let start = Instant::now();

        let stage = self.stage_for(user_id);
        let nodes = retrieval::retrieve(&self.graph, user_id, stage, current_message)?;
        let summary = retrieval::summarize(stage, &nodes);

        tracing::info!(
            request_id = %request_id,
            user_id = %user_id,
            stage = %stage,
            nodes_retrieved = nodes.len(),
            retrieval_ms = start.elapsed().as_secs_f64() * 1000.0,
            "memory retrieval"
        );

        Ok(Recall {
            request_id,
            user_id: user_id.to_string(),
            stage,
            nodes,
            summary,
        })
    }

    /// Introspection snapshot for a user
    pub fn inspect(&self, user_id: &str) -> Result<MemorySnapshot> {
        validate_user_id(user_id).map_validation_err("user_id")?;

        let conversation_count = self.graph.count_user_messages(user_id);
        let mut top_preferences = self.graph.get_user_preferences(user_id)?;
        top_preferences.truncate(self.config.snapshot_preference_limit);

        Ok(MemorySnapshot {
            user_id: user_id.to_string(),
            stage: MemoryStage::classify(conversation_count),
            conversation_count,
            graph_stats: self.graph.get_graph_stats(user_id),
            top_preferences,
        })
    }

    /// Most frequent cumulative keywords for a user
    pub fn top_keywords(&self, user_id: &str, limit: usize) -> Vec<(String, u32)> {
        self.keywords.top_keywords(user_id, limit)
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

//! Stage-dispatched retrieval
//!
//! Given a classified stage, runs the matching graph query and produces
//! the node set consumed by prompt construction, plus a capped summary
//! view for response payloads. The summary is display-facing only; the
//! full node set always drives the prompt.

use serde::{Deserialize, Serialize};

use crate::constants::{
    SEARCH_MAX_DEPTH, STAGE1_MESSAGE_LIMIT, STAGE2_MESSAGE_LIMIT, SUMMARY_CONTENT_CHARS,
    SUMMARY_NODE_LIMIT, SUMMARY_SECTION_LIMIT, TRAVERSAL_MAX_DEPTH, TRAVERSAL_MIN_WEIGHT,
};
use crate::decay;
use crate::errors::Result;
use crate::graph_memory::{MemoryGraph, NodeData, RetrievedNode};
use crate::stage::MemoryStage;

/// Compact node view for response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNodeSummary {
    pub node_id: String,
    pub node_type: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
}

/// Run the retrieval strategy for a stage
///
/// - Stage 1: the 5 most recent messages.
/// - Stage 2: the 8 most recent messages followed by all preferences,
///   heaviest first, unfiltered and unlimited.
/// - Stage 3: weighted traversal (depth 2, minimum weight 0.3) with
///   recency decay applied; traversal order is preserved.
/// - Stage 4: contextual search against the current message, already
///   sorted by score, top 10.
pub fn retrieve(
    graph: &MemoryGraph,
    user_id: &str,
    stage: MemoryStage,
    current_message: &str,
) -> Result<Vec<RetrievedNode>> {
    match stage {
        MemoryStage::BasicHistory => {
            let messages = graph.get_user_messages(user_id, STAGE1_MESSAGE_LIMIT)?;
            Ok(messages
                .into_iter()
                .map(|m| RetrievedNode::new(NodeData::Message(m)))
                .collect())
        }
        MemoryStage::KeywordTracking => {
            let messages = graph.get_user_messages(user_id, STAGE2_MESSAGE_LIMIT)?;
            let preferences = graph.get_user_preferences(user_id)?;

            let mut nodes: Vec<RetrievedNode> = messages
                .into_iter()
                .map(|m| RetrievedNode::new(NodeData::Message(m)))
                .collect();
            nodes.extend(
                preferences
                    .into_iter()
                    .map(|p| RetrievedNode::new(NodeData::Preference(p))),
            );
            Ok(nodes)
        }
        MemoryStage::RelationshipWeighting => {
            let mut nodes =
                graph.traverse_from_user(user_id, TRAVERSAL_MAX_DEPTH, TRAVERSAL_MIN_WEIGHT)?;
            decay::apply_recency_decay(&mut nodes);
            Ok(nodes)
        }
        MemoryStage::ContextualSearch => {
            graph.contextual_search(user_id, current_message, SEARCH_MAX_DEPTH)
        }
    }
}

/// Build the capped summary view of a retrieval result
///
/// Stage 2 shows the first 3 messages and first 3 preferences; the other
/// stages show the first 5 nodes. Content is truncated to 100 characters.
pub fn summarize(stage: MemoryStage, nodes: &[RetrievedNode]) -> Vec<MemoryNodeSummary> {
    match stage {
        MemoryStage::KeywordTracking => {
            let messages = nodes
                .iter()
                .filter(|n| matches!(n.data, NodeData::Message(_)))
                .take(SUMMARY_SECTION_LIMIT);
            let preferences = nodes
                .iter()
                .filter(|n| matches!(n.data, NodeData::Preference(_)))
                .take(SUMMARY_SECTION_LIMIT);
            messages.chain(preferences).map(summarize_node).collect()
        }
        _ => nodes.iter().take(SUMMARY_NODE_LIMIT).map(summarize_node).collect(),
    }
}

fn summarize_node(node: &RetrievedNode) -> MemoryNodeSummary {
    let (content, weight) = match &node.data {
        NodeData::User(_) => (String::new(), None),
        NodeData::Message(m) => (m.content.clone(), None),
        NodeData::Preference(p) => (p.keyword.clone(), Some(p.weight)),
    };

    // search score, then decayed weight, then the stored weight
    let weight = node.score.or(node.adjusted_weight).or(weight);

    MemoryNodeSummary {
        node_id: node.id().to_string(),
        node_type: node.node_type().to_string(),
        content: truncate_chars(&content, SUMMARY_CONTENT_CHARS),
        weight,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

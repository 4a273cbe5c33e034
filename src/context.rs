//! Prompt context rendering
//!
//! Turns a retrieval result into the context block placed ahead of the
//! current message in a generator prompt. The downstream generator and
//! its reply are outside this crate; only the context text is built here.

use crate::constants::SUMMARY_NODE_LIMIT;
use crate::graph_memory::{NodeData, RetrievedNode};
use crate::stage::MemoryStage;

/// Render a prompt from recalled nodes and the current message
///
/// Messages contribute their content, preferences a "User likes" line.
/// At most the first 5 nodes are included; the stage marker lets the
/// generator adapt its tone to how much memory is available.
pub fn render_prompt(message: &str, stage: MemoryStage, nodes: &[RetrievedNode]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !nodes.is_empty() {
        parts.push("Previous context:".to_string());
        for node in nodes.iter().take(SUMMARY_NODE_LIMIT) {
            match &node.data {
                NodeData::Message(m) if !m.content.is_empty() => {
                    parts.push(format!("- {}", m.content));
                }
                NodeData::Preference(p) => {
                    parts.push(format!("- User likes: {}", p.keyword));
                }
                _ => {}
            }
        }
    }

    parts.push(format!("\nCurrent message: {message}"));
    parts.push(format!("\n[You are in {stage} of memory evolution]"));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_memory::{MemoryGraph, Role};
    use crate::retrieval;

    #[test]
    fn test_prompt_includes_context_and_stage() {
        let graph = MemoryGraph::new();
        graph.add_message("u1", "I love hiking", Role::User);
        graph.create_or_update_preference("u1", "hiking", None).unwrap();

        let nodes = retrieval::retrieve(&graph, "u1", MemoryStage::KeywordTracking, "").unwrap();
        let prompt = render_prompt("any trails nearby?", MemoryStage::KeywordTracking, &nodes);

        assert!(prompt.starts_with("Previous context:"));
        assert!(prompt.contains("- I love hiking"));
        assert!(prompt.contains("- User likes: hiking"));
        assert!(prompt.contains("Current message: any trails nearby?"));
        assert!(prompt.contains("[You are in Stage 2 of memory evolution]"));
    }

    #[test]
    fn test_prompt_without_memory_skips_context_header() {
        let prompt = render_prompt("hello", MemoryStage::BasicHistory, &[]);
        assert!(!prompt.contains("Previous context:"));
        assert!(prompt.contains("Current message: hello"));
    }

    #[test]
    fn test_prompt_caps_context_lines() {
        let graph = MemoryGraph::new();
        for i in 0..10 {
            graph.add_message("u1", &format!("note {i}"), Role::User);
        }

        let nodes = retrieval::retrieve(&graph, "u1", MemoryStage::KeywordTracking, "").unwrap();
        let prompt = render_prompt("hi", MemoryStage::KeywordTracking, &nodes);

        let bullet_lines = prompt.lines().filter(|l| l.starts_with("- ")).count();
        assert_eq!(bullet_lines, 5);
    }
}

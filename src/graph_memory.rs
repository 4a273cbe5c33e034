//! Conversational entity graph
//!
//! Per-user memory graph of users, messages, and derived preferences.
//! Nodes live in one id-indexed arena; each user carries an adjacency list
//! of outgoing edges in insertion order. The graph is append/update-only:
//! nothing is ever deleted for the lifetime of the process.
//!
//! # Concurrency
//! One exclusive, non-reentrant lock guards the whole store. Every public
//! operation, reads included, acquires it around its entire body, so the
//! store runs one operation at a time. All operations are short CPU-bound
//! in-memory scans with no I/O inside the critical section. Public methods
//! delegate to inner methods that never lock, so no store method acquires
//! the lock while already holding it.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::constants::{
    HEAVY_PREFERENCE_WEIGHT, PREFERENCE_WEIGHT_STEP, SCORE_CONTENT_MATCH, SCORE_HEAVY_PREFERENCE,
    SCORE_KEYWORD_MATCH, SCORE_RECENT_PREFERENCE, SCORE_RECENT_WINDOW_HOURS, SEARCH_RESULT_LIMIT,
};
use crate::errors::{MemoryError, Result};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge types in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    #[serde(rename = "HAS_MESSAGE")]
    HasMessage,
    #[serde(rename = "HAS_PREFERENCE")]
    HasPreference,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMessage => "HAS_MESSAGE",
            Self::HasPreference => "HAS_PREFERENCE",
        }
    }
}

/// User node: created lazily on first write, never deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNode {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Message node: immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNode {
    /// Deterministic id: `msg-{user_id}-{seq}`
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Per-user sequence number, strictly increasing from 0
    pub seq: u64,
}

/// Preference node: per-user, per-keyword aggregate, mutated in place on
/// every qualifying mention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceNode {
    /// Deterministic id: `pref-{user_id}-{normalized keyword}`
    pub id: String,
    pub user_id: String,
    pub keyword: String,
    pub count: u32,
    pub weight: f32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Tagged node payload stored in the arena
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "node_type")]
pub enum NodeData {
    User(UserNode),
    Message(MessageNode),
    Preference(PreferenceNode),
}

impl NodeData {
    pub fn id(&self) -> &str {
        match self {
            Self::User(u) => &u.id,
            Self::Message(m) => &m.id,
            Self::Preference(p) => &p.id,
        }
    }

    pub fn node_type(&self) -> &'static str {
        match self {
            Self::User(_) => "User",
            Self::Message(_) => "Message",
            Self::Preference(_) => "Preference",
        }
    }

    /// Stored weight used by the traversal filter; nodes without a weight
    /// field count as 1.0
    fn stored_weight(&self) -> f32 {
        match self {
            Self::Preference(p) => p.weight,
            Self::User(_) | Self::Message(_) => 1.0,
        }
    }
}

/// A node as returned by traversal or search
///
/// `score` is set by `contextual_search`; `adjusted_weight` and
/// `recency_multiplier` are attached by the recency decay pass.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedNode {
    #[serde(flatten)]
    pub data: NodeData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency_multiplier: Option<f32>,
}

impl RetrievedNode {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            score: None,
            adjusted_weight: None,
            recency_multiplier: None,
        }
    }

    pub fn id(&self) -> &str {
        self.data.id()
    }

    pub fn node_type(&self) -> &'static str {
        self.data.node_type()
    }
}

/// Graph statistics scoped to one user's subgraph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub message_count: u64,
}

/// Compute the deterministic preference id for a (user, keyword) pair
///
/// The id is a pure function of its inputs: re-encountering a keyword
/// addresses the same node instead of duplicating it.
pub fn preference_id(user_id: &str, keyword: &str) -> String {
    format!("pref-{user_id}-{}", normalize_keyword(keyword))
}

fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase().replace(' ', "_")
}

fn default_weight(count: u32) -> f32 {
    (count as f32 * PREFERENCE_WEIGHT_STEP).min(1.0)
}

/// Outgoing edge in a user's adjacency list
#[derive(Debug, Clone)]
struct Edge {
    kind: EdgeKind,
    target: String,
}

/// Per-user adjacency and counters
#[derive(Debug, Default)]
struct UserEntry {
    /// Outgoing edges in insertion order; traversal order depends on it
    edges: Vec<Edge>,
    /// Messages ever added for this user; never resets
    message_count: u64,
}

#[derive(Debug, Default)]
struct GraphInner {
    /// Id-indexed node arena
    nodes: HashMap<String, NodeData>,
    /// Per-user adjacency lists and message counters
    users: HashMap<String, UserEntry>,
}

impl GraphInner {
    /// Create the user node if absent. Returns true if it was created.
    fn ensure_user(&mut self, user_id: &str, now: DateTime<Utc>) -> bool {
        if self.users.contains_key(user_id) {
            return false;
        }
        self.users.insert(user_id.to_string(), UserEntry::default());
        self.nodes.insert(
            user_id.to_string(),
            NodeData::User(UserNode {
                id: user_id.to_string(),
                created_at: now,
            }),
        );
        tracing::info!(user_id = %user_id, "user created");
        true
    }

    /// Depth-limited depth-first walk from a node, each node visited once.
    /// Returns ids in visitation order. An unknown root yields an empty
    /// walk; a dangling edge inside the graph is an integrity fault.
    fn walk(
        &self,
        node_id: &str,
        depth: usize,
        max_depth: usize,
        visited: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if depth > max_depth || visited.contains(node_id) {
            return Ok(());
        }

        if !self.nodes.contains_key(node_id) {
            if depth == 0 {
                return Ok(());
            }
            return Err(MemoryError::DataIntegrity(format!(
                "edge points at missing node '{node_id}'"
            )));
        }

        visited.insert(node_id.to_string());
        order.push(node_id.to_string());

        if let Some(entry) = self.users.get(node_id) {
            for edge in &entry.edges {
                self.walk(&edge.target, depth + 1, max_depth, visited, order)?;
            }
        }

        Ok(())
    }

    /// Look up a message node by id, surfacing kind mismatches
    fn message(&self, user_id: &str, node_id: &str) -> Result<&MessageNode> {
        match self.nodes.get(node_id) {
            Some(NodeData::Message(m)) => Ok(m),
            Some(other) => Err(MemoryError::DataIntegrity(format!(
                "HAS_MESSAGE edge from '{user_id}' points at {} node '{node_id}'",
                other.node_type()
            ))),
            None => Err(MemoryError::DataIntegrity(format!(
                "HAS_MESSAGE edge from '{user_id}' points at missing node '{node_id}'"
            ))),
        }
    }

    /// Look up a preference node by id, surfacing kind mismatches
    fn preference(&self, user_id: &str, node_id: &str) -> Result<&PreferenceNode> {
        match self.nodes.get(node_id) {
            Some(NodeData::Preference(p)) => Ok(p),
            Some(other) => Err(MemoryError::DataIntegrity(format!(
                "HAS_PREFERENCE edge from '{user_id}' points at {} node '{node_id}'",
                other.node_type()
            ))),
            None => Err(MemoryError::DataIntegrity(format!(
                "HAS_PREFERENCE edge from '{user_id}' points at missing node '{node_id}'"
            ))),
        }
    }
}

/// Graph store and operations
///
/// Reads against an absent user return empty collections and zero counts;
/// writes create the user lazily. Unknown user ids are never an error.
pub struct MemoryGraph {
    inner: Mutex<GraphInner>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GraphInner::default()),
        }
    }

    /// Create a user node. Idempotent: a no-op if the user already exists.
    pub fn create_user(&self, user_id: &str) -> UserNode {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        inner.ensure_user(user_id, now);
        match inner.nodes.get(user_id) {
            Some(NodeData::User(u)) => u.clone(),
            // ensure_user just inserted or found it
            _ => UserNode {
                id: user_id.to_string(),
                created_at: now,
            },
        }
    }

    /// Add a message for a user, creating the user if needed
    ///
    /// Allocates the next per-user sequence number and returns the new
    /// message id. Increments the counter behind `count_user_messages`.
    pub fn add_message(&self, user_id: &str, content: &str, role: Role) -> String {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Utc::now();
        inner.ensure_user(user_id, now);

        let entry = inner.users.entry(user_id.to_string()).or_default();
        let seq = entry.message_count;
        entry.message_count += 1;

        let message_id = format!("msg-{user_id}-{seq}");
        entry.edges.push(Edge {
            kind: EdgeKind::HasMessage,
            target: message_id.clone(),
        });

        inner.nodes.insert(
            message_id.clone(),
            NodeData::Message(MessageNode {
                id: message_id.clone(),
                user_id: user_id.to_string(),
                role,
                content: content.to_string(),
                timestamp: now,
                seq,
            }),
        );

        tracing::info!(user_id = %user_id, message_id = %message_id, role = %role, "message added");
        message_id
    }

    /// Create a preference or record another mention of an existing one
    ///
    /// On update: count increments, weight is recomputed by the default
    /// rule `min(1.0, count * 0.1)`, and last_seen refreshes. On creation
    /// the explicit weight (clamped to [0, 1]) is honored; afterwards the
    /// default rule always governs.
    pub fn create_or_update_preference(
        &self,
        user_id: &str,
        keyword: &str,
        weight: Option<f32>,
    ) -> Result<String> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Utc::now();
        inner.ensure_user(user_id, now);

        let pref_id = preference_id(user_id, keyword);
        match inner.nodes.entry(pref_id.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                NodeData::Preference(p) => {
                    p.count += 1;
                    p.weight = default_weight(p.count);
                    p.last_seen = now;
                }
                other => {
                    return Err(MemoryError::DataIntegrity(format!(
                        "preference id '{pref_id}' occupied by {} node",
                        other.node_type()
                    )));
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(NodeData::Preference(PreferenceNode {
                    id: pref_id.clone(),
                    user_id: user_id.to_string(),
                    keyword: keyword.to_string(),
                    count: 1,
                    weight: weight.unwrap_or(PREFERENCE_WEIGHT_STEP).clamp(0.0, 1.0),
                    first_seen: now,
                    last_seen: now,
                }));
                inner
                    .users
                    .entry(user_id.to_string())
                    .or_default()
                    .edges
                    .push(Edge {
                        kind: EdgeKind::HasPreference,
                        target: pref_id.clone(),
                    });
            }
        }

        tracing::info!(user_id = %user_id, keyword = %keyword, pref_id = %pref_id, "preference updated");
        Ok(pref_id)
    }

    /// Whether a preference node exists for this (user, keyword) pair
    pub fn preference_exists(&self, user_id: &str, keyword: &str) -> bool {
        let inner = self.inner.lock();
        matches!(
            inner.nodes.get(&preference_id(user_id, keyword)),
            Some(NodeData::Preference(_))
        )
    }

    /// Messages for a user, newest first, truncated to `limit`
    pub fn get_user_messages(&self, user_id: &str, limit: usize) -> Result<Vec<MessageNode>> {
        let inner = self.inner.lock();
        let Some(entry) = inner.users.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut messages = Vec::new();
        for edge in &entry.edges {
            if edge.kind == EdgeKind::HasMessage {
                messages.push(inner.message(user_id, &edge.target)?.clone());
            }
        }

        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.seq.cmp(&a.seq)));
        messages.truncate(limit);
        Ok(messages)
    }

    /// All preferences for a user, heaviest first
    pub fn get_user_preferences(&self, user_id: &str) -> Result<Vec<PreferenceNode>> {
        let inner = self.inner.lock();
        let Some(entry) = inner.users.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut preferences = Vec::new();
        for edge in &entry.edges {
            if edge.kind == EdgeKind::HasPreference {
                preferences.push(inner.preference(user_id, &edge.target)?.clone());
            }
        }

        preferences.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal));
        Ok(preferences)
    }

    /// Messages ever added for a user. O(1); 0 for unknown users.
    pub fn count_user_messages(&self, user_id: &str) -> u64 {
        let inner = self.inner.lock();
        inner
            .users
            .get(user_id)
            .map(|entry| entry.message_count)
            .unwrap_or(0)
    }

    /// Node, edge, and message counts scoped to the user's subgraph
    pub fn get_graph_stats(&self, user_id: &str) -> GraphStats {
        let inner = self.inner.lock();
        match inner.users.get(user_id) {
            Some(entry) => GraphStats {
                // the user node plus one target node per edge
                total_nodes: 1 + entry.edges.len(),
                total_edges: entry.edges.len(),
                message_count: entry.message_count,
            },
            None => GraphStats::default(),
        }
    }

    /// Depth-limited depth-first traversal from the user node
    ///
    /// A node other than the user is included iff its stored weight
    /// (1.0 when the node carries none) is at least `min_weight`.
    /// Exclusion affects result membership only; the walk continues
    /// through excluded nodes. Result order is visitation order and is
    /// not re-sorted.
    pub fn traverse_from_user(
        &self,
        user_id: &str,
        max_depth: usize,
        min_weight: f32,
    ) -> Result<Vec<RetrievedNode>> {
        let inner = self.inner.lock();

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        inner.walk(user_id, 0, max_depth, &mut visited, &mut order)?;

        let mut result = Vec::new();
        for id in &order {
            let data = inner
                .nodes
                .get(id)
                .ok_or_else(|| MemoryError::DataIntegrity(format!("walked node '{id}' missing")))?;
            if data.stored_weight() >= min_weight {
                result.push(RetrievedNode::new(data.clone()));
            }
        }
        Ok(result)
    }

    /// Score every node in the user's subgraph against a query and return
    /// the top matches, best first
    ///
    /// Scoring per node:
    /// - Preference: keyword substring of the query adds 0.5 and reinforces
    ///   the node (count, weight, last_seen) as if freshly mentioned;
    ///   last_seen within 24h adds 0.3; weight above 0.5 adds 0.2.
    /// - Message: 0.3 scaled by the fraction of query words found in the
    ///   content.
    ///
    /// Recall reinforcement means a search mutates the store: matched
    /// preferences come out of it stronger. Only nodes with a positive
    /// score are returned, capped at the top 10.
    pub fn contextual_search(
        &self,
        user_id: &str,
        query: &str,
        max_depth: usize,
    ) -> Result<Vec<RetrievedNode>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = Utc::now();

        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        inner.walk(user_id, 0, max_depth, &mut visited, &mut order)?;

        let mut scored: Vec<RetrievedNode> = Vec::new();
        for id in &order {
            let Some(data) = inner.nodes.get_mut(id) else {
                continue;
            };

            let mut score = 0.0f32;
            match data {
                NodeData::Preference(p) => {
                    let keyword_lower = p.keyword.to_lowercase();
                    if query_lower.contains(&keyword_lower) {
                        score += SCORE_KEYWORD_MATCH;
                        // recalled memories get stronger: treat the match
                        // as another mention
                        p.count += 1;
                        p.weight = default_weight(p.count);
                        p.last_seen = now;
                    }

                    let age_hours = (now - p.last_seen).num_seconds() as f64 / 3600.0;
                    if age_hours < SCORE_RECENT_WINDOW_HOURS {
                        score += SCORE_RECENT_PREFERENCE;
                    }

                    if p.weight > HEAVY_PREFERENCE_WEIGHT {
                        score += SCORE_HEAVY_PREFERENCE;
                    }
                }
                NodeData::Message(m) => {
                    let content_lower = m.content.to_lowercase();
                    let matching = query_words
                        .iter()
                        .filter(|word| content_lower.contains(**word))
                        .count();
                    if matching > 0 {
                        score += SCORE_CONTENT_MATCH * (matching as f32 / query_words.len() as f32);
                    }
                }
                NodeData::User(_) => {}
            }

            if score > 0.0 {
                let mut node = RetrievedNode::new(data.clone());
                node.score = Some(score);
                scored.push(node);
            }
        }

        // stable sort: ties keep visitation order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(SEARCH_RESULT_LIMIT);

        tracing::debug!(
            user_id = %user_id,
            results = scored.len(),
            "contextual search completed"
        );
        Ok(scored)
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

//! Evomem Library
//!
//! In-process, per-user memory graph for conversational agents.
//! Tracks users, messages, and derived preferences, and answers
//! stage-dependent recall queries used to assemble generator prompts.
//!
//! # Key Features
//! - Entity graph (users, messages, preferences) with per-user adjacency
//! - Keyword-frequency-gated preference model with repetition threshold
//! - Recency decay weighting for aged memory signals
//! - Four-stage retrieval dispatch, from raw history to contextual search
//!
//! # Design Notes
//! - All graph state lives in memory; nothing is persisted across restarts
//! - One exclusive lock serializes every store operation (see `graph_memory`)
//! - Retrieval through `contextual_search` reinforces matched preferences

pub mod config;
pub mod constants;
pub mod context;
pub mod decay;
pub mod errors;
pub mod graph_memory;
pub mod keywords;
pub mod retrieval;
pub mod service;
pub mod stage;
pub mod tracing_setup;
pub mod validation;

// Re-export dependencies to ensure tests/benchmarks use the same version
pub use chrono;
pub use parking_lot;
pub use uuid;

pub use config::MemoryConfig;
pub use errors::{MemoryError, Result};
pub use graph_memory::{
    EdgeKind, GraphStats, MemoryGraph, MessageNode, NodeData, PreferenceNode, RetrievedNode, Role,
    UserNode,
};
pub use keywords::KeywordTracker;
pub use retrieval::MemoryNodeSummary;
pub use service::{IngestReceipt, MemoryService, MemorySnapshot, Recall};
pub use stage::MemoryStage;

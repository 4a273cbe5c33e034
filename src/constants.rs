//! Documented constants for the memory engine
//!
//! This module contains all tunable parameters with justification for their
//! values. Centralizing constants prevents magic numbers and makes tuning
//! easier.

// =============================================================================
// PREFERENCE MODEL CONSTANTS
// =============================================================================

/// Weight gained per recorded mention of a preference keyword
///
/// The default update rule is `weight = min(1.0, count * 0.1)`: ten mentions
/// saturate a preference. Linear growth keeps early mentions meaningful while
/// the cap prevents a single obsession from drowning out everything else.
pub const PREFERENCE_WEIGHT_STEP: f32 = 0.1;

/// Cumulative mentions required before a keyword becomes a preference
///
/// One or two mentions are usually conversational noise. Three mentions
/// across a user's history is the point where a term starts to look like a
/// durable interest rather than a passing topic.
pub const KEYWORD_QUALIFY_THRESHOLD: u32 = 3;

/// Minimum token length considered by keyword extraction
///
/// Two-letter tokens surviving the stop-word list ("ok", "hi", "tv") carry
/// almost no preference signal on their own. They still participate in
/// bigrams, where the neighboring word supplies the context.
pub const KEYWORD_MIN_LENGTH: usize = 3;

/// Terms retained per message by keyword extraction
///
/// Ten terms comfortably covers a chat-sized message; anything past the top
/// ten in a single message is repetition the cumulative counter will catch
/// on later messages anyway.
pub const KEYWORD_TOP_TERMS: usize = 10;

// =============================================================================
// STAGE CLASSIFICATION BOUNDARIES
// Message counts include both user and assistant messages.
// =============================================================================

/// Below this count the engine serves raw recent history (Stage 1)
pub const STAGE2_MESSAGE_THRESHOLD: u64 = 5;

/// At this count preference tracking joins retrieval (Stage 3 boundary)
pub const STAGE3_MESSAGE_THRESHOLD: u64 = 15;

/// At this count retrieval switches to contextual search (Stage 4 boundary)
pub const STAGE4_MESSAGE_THRESHOLD: u64 = 30;

// =============================================================================
// RECENCY DECAY BANDS
// Age thresholds in hours with the multiplier applied below each bound.
// Half-open intervals: an age of exactly 24.0h falls in the [24, 72) band.
// =============================================================================

/// Under one hour: no discount
pub const RECENCY_FRESH_HOURS: f64 = 1.0;

/// Under one day
pub const RECENCY_DAY_HOURS: f64 = 24.0;

/// Under three days
pub const RECENCY_THREE_DAY_HOURS: f64 = 72.0;

/// Under one week
pub const RECENCY_WEEK_HOURS: f64 = 168.0;

/// Under thirty days
pub const RECENCY_MONTH_HOURS: f64 = 720.0;

pub const RECENCY_FRESH_MULTIPLIER: f32 = 1.0;
pub const RECENCY_DAY_MULTIPLIER: f32 = 0.95;
pub const RECENCY_THREE_DAY_MULTIPLIER: f32 = 0.85;
pub const RECENCY_WEEK_MULTIPLIER: f32 = 0.7;
pub const RECENCY_MONTH_MULTIPLIER: f32 = 0.5;
pub const RECENCY_OLD_MULTIPLIER: f32 = 0.3;

/// Fallback multiplier when a timestamp cannot be interpreted
///
/// A broken timestamp should neither promote nor bury a node, so the
/// fallback sits at the middle of the band table. The failure is reported
/// as a diagnostic event and recovered locally.
pub const RECENCY_NEUTRAL_MULTIPLIER: f32 = 0.5;

// =============================================================================
// CONTEXTUAL SEARCH SCORING WEIGHTS
// Additive components of the Stage 4 relevance score.
// =============================================================================

/// Preference keyword appears as a substring of the query
pub const SCORE_KEYWORD_MATCH: f32 = 0.5;

/// Preference was seen within the recent window
pub const SCORE_RECENT_PREFERENCE: f32 = 0.3;

/// Preference weight exceeds the heavy-preference bar
pub const SCORE_HEAVY_PREFERENCE: f32 = 0.2;

/// Scale for the message content match ratio
pub const SCORE_CONTENT_MATCH: f32 = 0.3;

/// Window for the preference recency bonus, in hours
pub const SCORE_RECENT_WINDOW_HOURS: f64 = 24.0;

/// Weight above which a preference earns the heavy-preference bonus
pub const HEAVY_PREFERENCE_WEIGHT: f32 = 0.5;

// =============================================================================
// RETRIEVAL LIMITS
// =============================================================================

/// Recent messages served in Stage 1
pub const STAGE1_MESSAGE_LIMIT: usize = 5;

/// Recent messages served in Stage 2 (preferences are unlimited there)
pub const STAGE2_MESSAGE_LIMIT: usize = 8;

/// Depth bound for the Stage 3 weighted traversal
pub const TRAVERSAL_MAX_DEPTH: usize = 2;

/// Minimum stored weight for inclusion in the Stage 3 traversal
pub const TRAVERSAL_MIN_WEIGHT: f32 = 0.3;

/// Depth bound passed to the Stage 4 contextual search
pub const SEARCH_MAX_DEPTH: usize = 3;

/// Result cap for contextual search
pub const SEARCH_RESULT_LIMIT: usize = 10;

// =============================================================================
// RESPONSE SUMMARY LIMITS
// The summary view is display-facing only; the full node set still drives
// prompt construction.
// =============================================================================

/// Nodes shown in the response summary for Stages 1, 3, and 4
pub const SUMMARY_NODE_LIMIT: usize = 5;

/// Messages and preferences shown per section in the Stage 2 summary
pub const SUMMARY_SECTION_LIMIT: usize = 3;

/// Characters of node content retained in summary entries
pub const SUMMARY_CONTENT_CHARS: usize = 100;

/// Preferences returned by the introspection snapshot
pub const SNAPSHOT_PREFERENCE_LIMIT: usize = 5;

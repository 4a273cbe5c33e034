//! Recency Decay Model
//!
//! Pure mapping from the age of a memory signal to a decay multiplier,
//! by fixed bands rather than a continuous curve. Banding keeps the
//! discount predictable and trivially testable at the boundaries:
//!
//! ```text
//! age (hours)   multiplier
//! ----------------------------
//! [0, 1)        1.0    fresh
//! [1, 24)       0.95   today
//! [24, 72)      0.85   this week's front half
//! [72, 168)     0.7    this week
//! [168, 720)    0.5    this month
//! [720, ...)    0.3    old
//! ```
//!
//! Ages that cannot be computed fall back to a neutral 0.5 multiplier;
//! the failure is reported as a diagnostic event and never propagated.

use chrono::{DateTime, Utc};

use crate::constants::{
    RECENCY_DAY_HOURS, RECENCY_DAY_MULTIPLIER, RECENCY_FRESH_HOURS, RECENCY_FRESH_MULTIPLIER,
    RECENCY_MONTH_HOURS, RECENCY_MONTH_MULTIPLIER, RECENCY_NEUTRAL_MULTIPLIER,
    RECENCY_OLD_MULTIPLIER, RECENCY_THREE_DAY_HOURS, RECENCY_THREE_DAY_MULTIPLIER,
    RECENCY_WEEK_HOURS, RECENCY_WEEK_MULTIPLIER,
};
use crate::graph_memory::{NodeData, RetrievedNode};

/// Map an age in hours to its decay multiplier
///
/// Intervals are half-open: an age of exactly 24.0 hours falls into the
/// [24, 72) band. Negative ages (clock skew, future timestamps) land in
/// the freshest band; a non-finite age falls back to the neutral
/// multiplier.
#[inline]
pub fn recency_multiplier(age_hours: f64) -> f32 {
    if !age_hours.is_finite() {
        tracing::warn!(age_hours, "unusable age for recency decay, using neutral multiplier");
        return RECENCY_NEUTRAL_MULTIPLIER;
    }

    if age_hours < RECENCY_FRESH_HOURS {
        RECENCY_FRESH_MULTIPLIER
    } else if age_hours < RECENCY_DAY_HOURS {
        RECENCY_DAY_MULTIPLIER
    } else if age_hours < RECENCY_THREE_DAY_HOURS {
        RECENCY_THREE_DAY_MULTIPLIER
    } else if age_hours < RECENCY_WEEK_HOURS {
        RECENCY_WEEK_MULTIPLIER
    } else if age_hours < RECENCY_MONTH_HOURS {
        RECENCY_MONTH_MULTIPLIER
    } else {
        RECENCY_OLD_MULTIPLIER
    }
}

/// Multiplier for a timestamp measured against `now`
#[inline]
pub fn multiplier_for(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_hours = now.signed_duration_since(timestamp).num_seconds() as f64 / 3600.0;
    recency_multiplier(age_hours)
}

/// Apply recency decay against the current instant
///
/// See [`apply_recency_decay_at`].
pub fn apply_recency_decay(nodes: &mut [RetrievedNode]) {
    apply_recency_decay_at(nodes, Utc::now());
}

/// Attach `adjusted_weight` and `recency_multiplier` to weighted nodes
///
/// A node contributes its `last_seen` (preferred) or `timestamp` as the
/// age source; nodes without a weight are left unchanged. The slice keeps
/// its order: traversal order is preserved rather than re-sorting by
/// adjusted weight.
pub fn apply_recency_decay_at(nodes: &mut [RetrievedNode], now: DateTime<Utc>) {
    for node in nodes.iter_mut() {
        // only preferences carry both a weight and an age source; messages
        // have a timestamp but no weight, users have neither
        if let NodeData::Preference(p) = &node.data {
            let multiplier = multiplier_for(p.last_seen, now);
            node.adjusted_weight = Some(p.weight * multiplier);
            node.recency_multiplier = Some(multiplier);

            tracing::debug!(
                pref_id = %p.id,
                original_weight = p.weight,
                adjusted_weight = p.weight * multiplier,
                recency_multiplier = multiplier,
                "recency applied"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::graph_memory::PreferenceNode;

    fn pref_node(weight: f32, last_seen: DateTime<Utc>) -> RetrievedNode {
        RetrievedNode::new(NodeData::Preference(PreferenceNode {
            id: "pref-u1-coffee".to_string(),
            user_id: "u1".to_string(),
            keyword: "coffee".to_string(),
            count: 6,
            weight,
            first_seen: last_seen,
            last_seen,
        }))
    }

    #[test]
    fn test_band_values() {
        assert_eq!(recency_multiplier(0.0), 1.0);
        assert_eq!(recency_multiplier(0.99), 1.0);
        assert_eq!(recency_multiplier(1.0), 0.95);
        assert_eq!(recency_multiplier(23.9), 0.95);
        assert_eq!(recency_multiplier(24.1), 0.85);
        assert_eq!(recency_multiplier(71.9), 0.85);
        assert_eq!(recency_multiplier(72.0), 0.7);
        assert_eq!(recency_multiplier(167.9), 0.7);
        assert_eq!(recency_multiplier(168.0), 0.5);
        assert_eq!(recency_multiplier(719.9), 0.5);
        assert_eq!(recency_multiplier(720.0), 0.3);
        assert_eq!(recency_multiplier(10_000.0), 0.3);
    }

    #[test]
    fn test_boundaries_are_half_open() {
        // exactly one day old belongs to the [24, 72) band
        assert_eq!(recency_multiplier(24.0), 0.85);
        assert_eq!(recency_multiplier(23.999), 0.95);
    }

    #[test]
    fn test_future_timestamps_count_as_fresh() {
        assert_eq!(recency_multiplier(-5.0), 1.0);
    }

    #[test]
    fn test_non_finite_age_falls_back_to_neutral() {
        assert_eq!(recency_multiplier(f64::NAN), 0.5);
        assert_eq!(recency_multiplier(f64::INFINITY), 0.5);
    }

    #[test]
    fn test_apply_attaches_adjusted_weight() {
        let now = Utc::now();
        let mut nodes = vec![pref_node(0.6, now - Duration::hours(30))];

        apply_recency_decay_at(&mut nodes, now);

        assert_eq!(nodes[0].recency_multiplier, Some(0.85));
        let adjusted = nodes[0].adjusted_weight.unwrap();
        assert!((adjusted - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_apply_leaves_unweighted_nodes_unchanged() {
        use crate::graph_memory::{MessageNode, Role};

        let now = Utc::now();
        let mut nodes = vec![RetrievedNode::new(NodeData::Message(MessageNode {
            id: "msg-u1-0".to_string(),
            user_id: "u1".to_string(),
            role: Role::User,
            content: "hello".to_string(),
            timestamp: now - Duration::hours(100),
            seq: 0,
        }))];

        apply_recency_decay_at(&mut nodes, now);

        assert_eq!(nodes[0].adjusted_weight, None);
        assert_eq!(nodes[0].recency_multiplier, None);
    }

    #[test]
    fn test_apply_preserves_order() {
        let now = Utc::now();
        let mut nodes = vec![
            pref_node(0.1, now - Duration::hours(2)),
            pref_node(0.9, now - Duration::days(40)),
        ];

        apply_recency_decay_at(&mut nodes, now);

        // the lighter-but-fresher node stays first: order is traversal
        // order, not adjusted-weight order
        assert!((nodes[0].adjusted_weight.unwrap() - 0.095).abs() < 1e-6);
        assert!((nodes[1].adjusted_weight.unwrap() - 0.27).abs() < 1e-6);
    }
}

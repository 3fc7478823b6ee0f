//! Application of manual overrides to finished spans.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::span::{Span, SpanSource, ranges_intersect};

use super::overrides::{Override, RejectedOverride};

/// Counts from applying one verse's overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub applied: usize,
    /// Automatic spans deleted because an override touched them.
    pub displaced: usize,
    pub rejected: Vec<RejectedOverride>,
}

/// Apply overrides in order.
///
/// Every existing span that intersects an override is removed whole, never
/// clipped, and the override is inserted in its place. Overrides that do not
/// fit in the text are reported and skipped. `text_len` is in chars.
pub fn apply_overrides(
    spans: &mut Vec<Span>,
    overrides: &[Override],
    text_len: usize,
    reference: &str,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for entry in overrides {
        if entry.start >= entry.end || entry.end > text_len {
            warn!(
                "override [{}, {}) {} does not fit {} (length {})",
                entry.start, entry.end, entry.label, reference, text_len
            );
            outcome.rejected.push(RejectedOverride {
                reference: reference.to_string(),
                line: None,
                start: entry.start as i64,
                end: entry.end as i64,
                label: entry.label.clone(),
                reason: format!("out of range for text of length {}", text_len),
            });
            continue;
        }

        let before = spans.len();
        spans.retain(|s| !ranges_intersect(s.start, s.end, entry.start, entry.end));
        outcome.displaced += before - spans.len();

        spans.push(Span::new(entry.start, entry.end, entry.label.clone(), SpanSource::Manual));
        outcome.applied += 1;
    }

    spans.sort_by_key(|s| (s.start, s.end));
    outcome
}

//! Span assembly from per-token labels and priority-based overlap resolution.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::types::{CharOffsets, Span, SpanSource};

/// How adjacent same-label spans are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep every token span separate.
    Off,
    /// Merge when only whitespace (or nothing) separates the spans.
    #[default]
    Whitespace,
    /// Merge only when one span ends exactly where the next begins.
    Strict,
}

/// The final label chosen for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLabel<'a> {
    pub label: &'a str,
    pub source: SpanSource,
}

/// Pair token labels with their aligned ranges and merge the result.
///
/// Tokens without a label or without an alignment are dropped. The output
/// is sorted by `(start, end)`.
pub fn assemble_spans(
    text: &str,
    alignment: &[Option<(usize, usize)>],
    labels: &[Option<TokenLabel<'_>>],
    mode: MergeMode,
) -> Vec<Span> {
    let mut spans: Vec<Span> = alignment
        .iter()
        .zip(labels)
        .filter_map(|(range, label)| {
            let (start, end) = (*range)?;
            let label = (*label)?;
            if start >= end {
                return None;
            }
            Some(Span::new(start, end, label.label, label.source))
        })
        .collect();

    spans.sort_by_key(|s| (s.start, s.end));
    merge_contiguous(text, spans, mode)
}

/// Merge neighbouring spans that share a label.
///
/// A single pass folding into the last kept span is exhaustive, so applying
/// this twice yields the same result.
pub fn merge_contiguous(text: &str, spans: Vec<Span>, mode: MergeMode) -> Vec<Span> {
    if mode == MergeMode::Off || spans.len() < 2 {
        return spans;
    }

    let offsets = CharOffsets::new(text);
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(last) = merged.last_mut() {
            if last.label == span.label && can_join(text, &offsets, last, &span, mode) {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        merged.push(span);
    }

    merged
}

fn can_join(text: &str, offsets: &CharOffsets, left: &Span, right: &Span, mode: MergeMode) -> bool {
    match mode {
        MergeMode::Off => false,
        MergeMode::Strict => left.end == right.start,
        MergeMode::Whitespace => {
            if right.start <= left.end {
                return true;
            }
            offsets
                .slice(text, left.end, right.start)
                .chars()
                .all(char::is_whitespace)
        }
    }
}

/// Resolve overlapping candidate spans from independent methods.
///
/// `rank` maps a label to its priority (lower wins). Candidates are visited
/// in a total order, so the kept set does not depend on input order. Spans
/// are never clipped: an overlap keeps one span whole and drops the other.
pub fn resolve_overlaps<F>(candidates: Vec<Span>, rank: F) -> Vec<Span>
where
    F: Fn(&str) -> usize,
{
    let mut ordered: Vec<(usize, Span)> = candidates
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| (rank(&s.label), s))
        .collect();

    ordered.sort_by(|(ra, a), (rb, b)| {
        (a.start, Reverse(a.len()), ra, &a.label, a.source)
            .cmp(&(b.start, Reverse(b.len()), rb, &b.label, b.source))
    });

    let mut kept: Vec<(usize, Span)> = Vec::with_capacity(ordered.len());

    for (cand_rank, cand) in ordered {
        let overlapping: Vec<usize> = kept
            .iter()
            .enumerate()
            .filter(|(_, (_, k))| k.overlaps(&cand))
            .map(|(i, _)| i)
            .collect();

        if overlapping.is_empty() {
            kept.push((cand_rank, cand));
            continue;
        }

        if overlapping.iter().any(|&i| kept[i].1.same_extent(&cand)) {
            continue;
        }

        let beats_all = overlapping.iter().all(|&i| cand_rank < kept[i].0);
        if beats_all {
            for &i in overlapping.iter().rev() {
                kept.remove(i);
            }
            kept.push((cand_rank, cand));
        }
    }

    let mut result: Vec<Span> = kept.into_iter().map(|(_, s)| s).collect();
    result.sort_by_key(|s| (s.start, s.end));
    result
}

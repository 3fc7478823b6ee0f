//! Span types shared by the resolver, the override applier and the writer.

use serde::{Deserialize, Serialize};

/// Where a span's label came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    /// Per-token code, lemma or surface rule.
    Rule,
    /// Multi-token gazetteer phrase.
    Phrase,
    /// Phrase of an override label, forced over its whole window.
    Sticky,
    /// Configured label for otherwise unmatched tokens.
    Fallback,
    /// Manually curated override.
    Manual,
    /// Computed upstream by a different annotation method.
    #[default]
    External,
}

impl SpanSource {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SpanSource::Rule => "rule",
            SpanSource::Phrase => "phrase",
            SpanSource::Sticky => "sticky",
            SpanSource::Fallback => "fallback",
            SpanSource::Manual => "manual",
            SpanSource::External => "external",
        }
    }
}

/// A labeled half-open character range `[start, end)`.
///
/// Offsets count chars, not bytes. Only `start`, `end` and `label` are
/// serialized; provenance travels separately in example metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(skip)]
    pub source: SpanSource,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize, label: impl Into<String>, source: SpanSource) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            source,
        }
    }

    /// Number of chars covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for a degenerate range.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when the two half-open ranges share at least one char.
    pub fn overlaps(&self, other: &Span) -> bool {
        ranges_intersect(self.start, self.end, other.start, other.end)
    }

    /// Same range and label, provenance ignored.
    pub fn same_extent(&self, other: &Span) -> bool {
        self.start == other.start && self.end == other.end && self.label == other.label
    }

    /// Check `start < end <= text_len`.
    pub fn is_within(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }
}

/// Half-open range intersection test.
pub fn ranges_intersect(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

/// Maps between char offsets and byte offsets of one text.
#[derive(Debug, Clone)]
pub struct CharOffsets {
    /// Byte offset of every char start, followed by the text length.
    boundaries: Vec<usize>,
}

impl CharOffsets {
    /// Index the char boundaries of `text`.
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Convert a byte offset on a char boundary to a char offset.
    pub fn to_char(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    /// Convert a char offset to a byte offset, clamped to the text end.
    pub fn to_byte(&self, char_offset: usize) -> usize {
        let last = self.boundaries.len() - 1;
        self.boundaries[char_offset.min(last)]
    }

    /// Slice `text` by char offsets.
    pub fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let from = self.to_byte(start);
        let to = self.to_byte(end).max(from);
        &text[from..to]
    }
}

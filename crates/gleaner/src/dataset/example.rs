//! Finished examples and their output record form.

use serde::{Deserialize, Serialize};

use crate::error::{GleanerError, Result};
use crate::input::VerseId;
use crate::span::{Span, SpanSource};

/// Per-example processing facts carried into the output record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleMeta {
    /// Number of input tokens.
    pub tokens: usize,
    /// Tokens placed in the text.
    pub aligned: usize,
    /// Tokens that could not be placed.
    pub misses: usize,
    pub overrides_applied: usize,
    pub overrides_rejected: usize,
    /// Provenance of each output span, parallel to `spans`.
    #[serde(default)]
    pub sources: Vec<SpanSource>,
}

/// A fully annotated verse, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub id: VerseId,
    pub text: String,
    /// Sorted, non-overlapping spans.
    pub spans: Vec<Span>,
    pub meta: ExampleMeta,
}

impl Example {
    /// Book of the example, used as the split stratum.
    pub fn book(&self) -> &str {
        &self.id.book
    }

    /// Check that every span lies in the text, and that spans are sorted
    /// and disjoint.
    pub fn validate(&self) -> Result<()> {
        let text_len = self.text.chars().count();
        let invalid = |message: String| GleanerError::Invariant {
            example: self.id.to_string(),
            message,
        };

        for span in &self.spans {
            if !span.is_within(text_len) {
                return Err(invalid(format!(
                    "span [{}, {}) {} outside text of length {}",
                    span.start, span.end, span.label, text_len
                )));
            }
        }

        for pair in self.spans.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(invalid(format!(
                    "spans [{}, {}) and [{}, {}) overlap or are unsorted",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                )));
            }
        }

        Ok(())
    }

    /// Build the serializable record.
    pub fn to_record(&self) -> ExampleRecord {
        let mut meta = self.meta.clone();
        meta.sources = self.spans.iter().map(|s| s.source).collect();

        ExampleRecord {
            id: self.id.example_id(),
            book: self.id.book.clone(),
            chapter: self.id.chapter,
            verse: self.id.verse,
            text: self.text.clone(),
            spans: self.spans.clone(),
            meta,
        }
    }
}

/// One line of a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub id: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    pub spans: Vec<Span>,
    pub meta: ExampleMeta,
}

impl From<ExampleRecord> for Example {
    fn from(record: ExampleRecord) -> Self {
        let mut spans = record.spans;
        for (span, source) in spans.iter_mut().zip(&record.meta.sources) {
            span.source = *source;
        }

        Example {
            id: VerseId::new(record.book, record.chapter, record.verse),
            text: record.text,
            spans,
            meta: record.meta,
        }
    }
}

//! Batch-level statistics over finished examples.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::example::Example;

/// Totals over a batch of examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub examples: usize,
    pub tokens: usize,
    pub aligned: usize,
    pub misses: usize,
    /// Fraction of tokens aligned (1.0 when there are no tokens).
    pub coverage: f64,
    /// Span counts per label, in label rank order, then first appearance.
    pub spans_by_label: IndexMap<String, usize>,
    /// Span counts per provenance.
    pub spans_by_source: IndexMap<String, usize>,
    pub overrides_applied: usize,
    pub overrides_rejected: usize,
    /// Examples that ended with no spans at all.
    pub empty_examples: usize,
}

impl BatchSummary {
    /// Create an empty summary with a zero entry for each label.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            coverage: 1.0,
            spans_by_label: labels
                .iter()
                .map(|l| (l.as_ref().to_string(), 0))
                .collect(),
            ..Self::default()
        }
    }

    /// Summarize a slice of examples.
    pub fn from_examples<S: AsRef<str>>(labels: &[S], examples: &[Example]) -> Self {
        let mut summary = Self::new(labels);
        for example in examples {
            summary.record(example);
        }
        summary
    }

    /// Add one example to the totals.
    pub fn record(&mut self, example: &Example) {
        let meta = &example.meta;
        self.examples += 1;
        self.tokens += meta.tokens;
        self.aligned += meta.aligned;
        self.misses += meta.misses;
        self.overrides_applied += meta.overrides_applied;
        self.overrides_rejected += meta.overrides_rejected;

        if example.spans.is_empty() {
            self.empty_examples += 1;
        }

        for span in &example.spans {
            *self.spans_by_label.entry(span.label.clone()).or_insert(0) += 1;
            *self
                .spans_by_source
                .entry(span.source.label().to_string())
                .or_insert(0) += 1;
        }

        self.coverage = if self.tokens == 0 {
            1.0
        } else {
            self.aligned as f64 / self.tokens as f64
        };
    }

    /// Total spans across every label.
    pub fn total_spans(&self) -> usize {
        self.spans_by_label.values().sum()
    }
}

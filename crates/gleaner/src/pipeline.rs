//! The annotator: verses in, finished examples out.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::curation::{Override, OverrideTable, RejectedOverride, apply_overrides};
use crate::dataset::{BatchSummary, Example, ExampleMeta};
use crate::error::Result;
use crate::input::Verse;
use crate::rules::RuleSet;
use crate::span::{
    Aligner, DEFAULT_SEARCH_WINDOW, MergeMode, Span, SpanSource, TokenLabel, assemble_spans,
    merge_contiguous, resolve_overlaps,
};

/// Configuration for the annotator.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Bytes past the cursor searched by the whitespace-tolerant aligner.
    pub search_window: usize,
    /// Merge behaviour; `None` uses the rule set's.
    pub merge_mode: Option<MergeMode>,
    /// Verify span invariants on every finished example.
    pub check_invariants: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            search_window: DEFAULT_SEARCH_WINDOW,
            merge_mode: None,
            check_invariants: true,
        }
    }
}

/// Result of annotating a batch of verses.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// One example per input verse, in input order.
    pub examples: Vec<Example>,
    pub summary: BatchSummary,
    /// Overrides that did not fit their verse.
    pub rejected: Vec<RejectedOverride>,
}

/// Turns verses into labeled examples using a compiled rule set.
///
/// The annotator holds no mutable state, so one instance can serve many
/// threads.
#[derive(Debug, Clone)]
pub struct Annotator<'r> {
    rules: &'r RuleSet,
    aligner: Aligner,
    config: AnnotatorConfig,
}

impl<'r> Annotator<'r> {
    /// Create an annotator with default configuration.
    pub fn new(rules: &'r RuleSet) -> Self {
        Self::with_config(rules, AnnotatorConfig::default())
    }

    /// Create an annotator with custom configuration.
    pub fn with_config(rules: &'r RuleSet, config: AnnotatorConfig) -> Self {
        Self {
            rules,
            aligner: Aligner::new().with_window(config.search_window),
            config,
        }
    }

    /// The rule set in use.
    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    fn merge_mode(&self) -> MergeMode {
        self.config.merge_mode.unwrap_or(self.rules.merge_mode())
    }

    /// Final label of every token, before alignment.
    ///
    /// A sticky phrase wins; otherwise a code, lemma or surface rule, then a
    /// non-sticky phrase, then the fallback label.
    pub fn token_labels(&self, verse: &Verse) -> Vec<Option<TokenLabel<'r>>> {
        let rules = self.rules;
        let surfaces: Vec<&str> = verse.tokens.iter().map(|t| t.surface.as_str()).collect();
        let phrases = rules.match_phrases(&surfaces);

        verse
            .tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let (id, source) = if let Some(id) = phrases.sticky[i] {
                    (id, SpanSource::Sticky)
                } else if let Some(id) = rules.matched_label(token) {
                    (id, SpanSource::Rule)
                } else if let Some(id) = phrases.labels[i] {
                    (id, SpanSource::Phrase)
                } else {
                    (rules.fallback()?, SpanSource::Fallback)
                };

                Some(TokenLabel {
                    label: rules.label_name(id),
                    source,
                })
            })
            .collect()
    }

    /// Annotate one verse and apply its overrides.
    pub fn annotate(&self, verse: &Verse, overrides: &[Override]) -> Result<Example> {
        self.annotate_verse(verse, overrides).map(|(example, _)| example)
    }

    fn annotate_verse(
        &self,
        verse: &Verse,
        overrides: &[Override],
    ) -> Result<(Example, Vec<RejectedOverride>)> {
        let reference = verse.id.to_string();
        let text_len = verse.char_len();

        let surfaces: Vec<&str> = verse.tokens.iter().map(|t| t.surface.as_str()).collect();
        let alignment = self.aligner.align(&verse.text, &surfaces);
        if alignment.misses > 0 {
            debug!(
                "{}: {} of {} tokens not aligned",
                reference,
                alignment.misses,
                surfaces.len()
            );
        }

        let labels = self.token_labels(verse);
        let mode = self.merge_mode();
        let mut spans = assemble_spans(&verse.text, &alignment.spans, &labels, mode);

        if !verse.candidates.is_empty() {
            spans.extend(external_candidates(verse, &reference, text_len));
            spans = resolve_overlaps(spans, |label| self.rules.rank_of(label));
            // Candidates can sit next to a rule span of the same label.
            spans = merge_contiguous(&verse.text, spans, mode);
        }

        let outcome = apply_overrides(&mut spans, overrides, text_len, &reference);

        let example = Example {
            id: verse.id.clone(),
            text: verse.text.clone(),
            spans,
            meta: ExampleMeta {
                tokens: surfaces.len(),
                aligned: alignment.aligned(),
                misses: alignment.misses,
                overrides_applied: outcome.applied,
                overrides_rejected: outcome.rejected.len(),
                sources: Vec::new(),
            },
        };

        if self.config.check_invariants {
            example.validate()?;
        }

        Ok((example, outcome.rejected))
    }

    /// Annotate every verse with its overrides from `table`.
    ///
    /// Verses are independent. With `parallel` they are processed on the
    /// rayon pool; results come back in input order either way, so the
    /// output is identical.
    pub fn annotate_batch(
        &self,
        verses: &[Verse],
        table: &OverrideTable,
        parallel: bool,
    ) -> Result<BatchResult> {
        let run = |verse: &Verse| self.annotate_verse(verse, table.get(&verse.id));

        let results: Vec<(Example, Vec<RejectedOverride>)> = if parallel {
            verses.par_iter().map(run).collect::<Result<_>>()?
        } else {
            verses.iter().map(run).collect::<Result<_>>()?
        };

        let mut summary = BatchSummary::new(self.rules.labels());
        let mut examples = Vec::with_capacity(results.len());
        let mut rejected = Vec::new();

        for (example, dropped) in results {
            summary.record(&example);
            examples.push(example);
            rejected.extend(dropped);
        }

        info!(
            "Annotated {} verses: {} spans, {:.1}% token coverage",
            summary.examples,
            summary.total_spans(),
            summary.coverage * 100.0
        );

        Ok(BatchResult {
            examples,
            summary,
            rejected,
        })
    }
}

/// Upstream candidates that fit the text, tagged as external.
fn external_candidates<'v>(
    verse: &'v Verse,
    reference: &'v str,
    text_len: usize,
) -> impl Iterator<Item = Span> + 'v {
    verse.candidates.iter().filter_map(move |c| {
        if c.is_empty() || !c.is_within(text_len) {
            warn!(
                "{}: dropping candidate [{}, {}) {} outside text of length {}",
                reference, c.start, c.end, c.label, text_len
            );
            return None;
        }
        Some(Span::new(c.start, c.end, c.label.clone(), SpanSource::External))
    })
}

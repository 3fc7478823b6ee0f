//! Gleaner: deterministic span annotation for silver-standard NER datasets.
//!
//! Gleaner takes tokenized verses with lexical codes, labels tokens from
//! declarative rules and gazetteers, places them in the verse text, resolves
//! overlaps between annotation sources, applies manual curation, and writes
//! reproducible train/dev/test splits.
//!
//! # Core Principles
//!
//! - **Deterministic**: Same inputs and seed give byte-identical splits
//! - **Curator wins**: Manual overrides always replace automatic spans
//! - **Char offsets**: Every span counts Unicode scalar values, not bytes
//!
//! # Example
//!
//! ```no_run
//! use gleaner::{Annotator, OverrideTable, RuleSet};
//! use gleaner::input::load_verses;
//!
//! let rules = RuleSet::load("rules.json").unwrap();
//! let verses = load_verses("verses.jsonl").unwrap();
//!
//! let batch = Annotator::new(&rules)
//!     .annotate_batch(&verses, &OverrideTable::new(), false)
//!     .unwrap();
//!
//! println!("Examples: {}", batch.examples.len());
//! println!("Coverage: {:.1}%", batch.summary.coverage * 100.0);
//! ```

pub mod curation;
pub mod dataset;
pub mod error;
pub mod input;
pub mod rules;
pub mod span;

mod pipeline;

pub use crate::pipeline::{Annotator, AnnotatorConfig, BatchResult};
pub use curation::{Override, OverrideTable};
pub use dataset::{BatchSummary, Example, SplitConfig, SplitRatios};
pub use error::{GleanerError, Result};
pub use input::{Token, Verse, VerseId};
pub use rules::{RuleConfig, RuleSet};
pub use span::{Span, SpanSource};

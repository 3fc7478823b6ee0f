//! Label rules: configuration, gazetteers and the compiled rule set.
//!
//! A [`RuleConfig`] is loaded and validated once, then compiled into a
//! [`RuleSet`] that every example of a run borrows immutably.
//!
//! ```no_run
//! use gleaner::rules::RuleSet;
//! use gleaner::Token;
//!
//! let rules = RuleSet::load("rules.json").unwrap();
//! if let Some(id) = rules.label_for(&Token::new("God").with_lemma("god")) {
//!     println!("{}", rules.label_name(id));
//! }
//! ```

mod config;
mod gazetteer;
mod phrase;
mod ruleset;

pub use config::{LabelRule, RuleConfig};
pub use gazetteer::{GazetteerFormat, load_gazetteer, parse_gazetteer};
pub use phrase::{Phrase, PhraseIndex, PhraseMatches, match_phrases};
pub use ruleset::{LabelId, LabelSummary, RuleSet, RuleSetSummary, SkippedGazetteer};

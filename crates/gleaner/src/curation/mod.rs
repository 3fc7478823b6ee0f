//! Manual curation: override tables and their application.
//!
//! Overrides are exact, curator-supplied spans keyed by verse. They are
//! validated when loaded and always win over automatic spans they touch.
//!
//! ```no_run
//! use gleaner::curation::{LabelPolicy, OverrideLoader};
//! use gleaner::rules::RuleSet;
//!
//! let rules = RuleSet::load("rules.json").unwrap();
//! let (table, report) = OverrideLoader::new()
//!     .with_rules(&rules)
//!     .with_policy(LabelPolicy::Lenient)
//!     .load("overrides.json")
//!     .unwrap();
//!
//! println!("{} overrides, {} rejected", table.len(), report.rejected.len());
//! ```

mod apply;
mod overrides;

pub use apply::{ApplyOutcome, apply_overrides};
pub use overrides::{
    LabelPolicy, Override, OverrideLoader, OverrideReport, OverrideTable, RejectedOverride,
};

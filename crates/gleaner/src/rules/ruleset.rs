//! Compiled, immutable rule set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::input::Token;
use crate::span::MergeMode;

use super::config::RuleConfig;
use super::gazetteer::load_gazetteer;
use super::phrase::{PhraseIndex, PhraseMatches, match_phrases};

/// Index of a label in the priority table. Lower ids win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub(crate) usize);

impl LabelId {
    /// Tie-break rank of the label.
    pub fn rank(self) -> usize {
        self.0
    }
}

/// Exact and case-folded lookup from a string key to its best label.
#[derive(Debug, Clone, Default)]
struct LookupTable {
    exact: HashMap<String, LabelId>,
    folded: HashMap<String, LabelId>,
}

impl LookupTable {
    fn insert(&mut self, key: &str, label: LabelId, case_sensitive: bool) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        if case_sensitive {
            insert_best(&mut self.exact, key.to_string(), label);
        } else {
            insert_best(&mut self.folded, key.to_lowercase(), label);
        }
    }

    fn get(&self, key: &str) -> Option<LabelId> {
        let key = key.trim();
        let exact = self.exact.get(key).copied();
        let folded = if self.folded.is_empty() {
            None
        } else {
            self.folded.get(&key.to_lowercase()).copied()
        };
        best_of(exact, folded)
    }

    fn len(&self) -> usize {
        self.exact.len() + self.folded.len()
    }
}

fn insert_best(map: &mut HashMap<String, LabelId>, key: String, label: LabelId) {
    map.entry(key)
        .and_modify(|existing| {
            if label < *existing {
                *existing = label;
            }
        })
        .or_insert(label);
}

fn best_of(a: Option<LabelId>, b: Option<LabelId>) -> Option<LabelId> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Per-label counts reported after compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub label: String,
    pub rank: usize,
    pub codes: usize,
    pub lemmas: usize,
    pub surfaces: usize,
    pub phrases: usize,
    pub is_override: bool,
}

/// A gazetteer that contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedGazetteer {
    pub label: String,
    pub path: PathBuf,
    pub reason: String,
}

/// What went into a compiled rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetSummary {
    pub labels: Vec<LabelSummary>,
    pub gazetteers_loaded: usize,
    pub gazetteers_skipped: Vec<SkippedGazetteer>,
    pub merge_mode: MergeMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_on_miss: Option<String>,
}

/// Compiled labeling rules, shared read-only across every example of a run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    labels: Vec<String>,
    ranks: HashMap<String, LabelId>,
    codes: HashMap<String, LabelId>,
    lemmas: LookupTable,
    surfaces: LookupTable,
    phrases: PhraseIndex,
    overrides: Vec<bool>,
    fallback: Option<LabelId>,
    merge_mode: MergeMode,
    summary: RuleSetSummary,
}

impl RuleSet {
    /// Load a rule config file and compile it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = RuleConfig::load(path)?;
        Self::compile(&config)
    }

    /// Compile a validated configuration.
    ///
    /// Missing or malformed gazetteers are logged and skipped.
    pub fn compile(config: &RuleConfig) -> Result<Self> {
        config.validate()?;

        let mut labels: Vec<String> = Vec::new();
        let candidates = config
            .priority
            .iter()
            .chain(config.rules.keys())
            .chain(config.label_on_miss.iter());
        for label in candidates {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }

        let ranks: HashMap<String, LabelId> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), LabelId(i)))
            .collect();

        let mut overrides = vec![false; labels.len()];
        for label in &config.override_labels {
            overrides[ranks[label].0] = true;
        }

        let mut codes = HashMap::new();
        let mut lemmas = LookupTable::default();
        let mut surfaces = LookupTable::default();
        let mut phrases = PhraseIndex::new();
        let mut summary = RuleSetSummary {
            merge_mode: merge_mode_of(config),
            label_on_miss: config.label_on_miss.clone(),
            ..RuleSetSummary::default()
        };

        for (label, rule) in &config.rules {
            let id = ranks[label];
            let mut counts = LabelSummary {
                label: label.clone(),
                rank: id.rank(),
                is_override: overrides[id.0],
                ..LabelSummary::default()
            };

            for code in &rule.codes {
                let code = code.trim();
                if !code.is_empty() {
                    insert_best(&mut codes, code.to_string(), id);
                    counts.codes += 1;
                }
            }

            for lemma in &rule.lemmas {
                lemmas.insert(lemma, id, rule.case_sensitive);
                counts.lemmas += 1;
            }

            let mut entries: Vec<String> = rule.surfaces.clone();
            entries.extend(rule.phrases.iter().cloned());
            for file in &rule.gazetteer_files {
                let path = config.resolve_path(file);
                match load_gazetteer(&path) {
                    Ok(found) => {
                        debug!("gazetteer {} gave {} entries for {}", path.display(), found.len(), label);
                        summary.gazetteers_loaded += 1;
                        entries.extend(found);
                    }
                    Err(e) => {
                        warn!("skipping gazetteer {} for {}: {}", path.display(), label, e);
                        summary.gazetteers_skipped.push(SkippedGazetteer {
                            label: label.clone(),
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            for entry in &entries {
                let parts: Vec<&str> = entry.split_whitespace().collect();
                match parts.len() {
                    0 => {}
                    1 => {
                        surfaces.insert(parts[0], id, rule.case_sensitive);
                        counts.surfaces += 1;
                    }
                    _ => {
                        if phrases.insert(id, &parts, rule.case_sensitive) {
                            counts.phrases += 1;
                        }
                    }
                }
            }

            summary.labels.push(counts);
        }

        debug!(
            "compiled {} labels: {} codes, {} lemmas, {} surfaces, {} phrases",
            labels.len(),
            codes.len(),
            lemmas.len(),
            surfaces.len(),
            phrases.len()
        );

        Ok(Self {
            fallback: config.label_on_miss.as_ref().map(|l| ranks[l]),
            labels,
            ranks,
            codes,
            lemmas,
            surfaces,
            phrases,
            overrides,
            merge_mode: summary.merge_mode,
            summary,
        })
    }

    /// Best label from codes, lemmas and surfaces, or the fallback label.
    pub fn label_for(&self, token: &Token) -> Option<LabelId> {
        self.matched_label(token).or(self.fallback)
    }

    /// Best label from codes, lemmas and surfaces, ignoring the fallback.
    pub fn matched_label(&self, token: &Token) -> Option<LabelId> {
        let by_code = token
            .code
            .as_deref()
            .and_then(|c| self.codes.get(c.trim()).copied());
        let by_lemma = token.lemma.as_deref().and_then(|l| self.lemmas.get(l));
        let by_surface = self.surfaces.get(&token.surface);

        best_of(best_of(by_code, by_lemma), by_surface)
    }

    /// Run the phrase matcher over a token sequence.
    pub fn match_phrases<S: AsRef<str>>(&self, surfaces: &[S]) -> PhraseMatches {
        match_phrases(&self.phrases, surfaces, |l| self.is_override(l))
    }

    /// Name of a label.
    pub fn label_name(&self, id: LabelId) -> &str {
        &self.labels[id.0]
    }

    /// Look up a label by name.
    pub fn label_id(&self, label: &str) -> Option<LabelId> {
        self.ranks.get(label).copied()
    }

    /// Whether the rule set knows this label.
    pub fn is_known_label(&self, label: &str) -> bool {
        self.ranks.contains_key(label)
    }

    /// Rank of a label name; unknown labels rank after every known one.
    pub fn rank_of(&self, label: &str) -> usize {
        self.ranks.get(label).map_or(self.labels.len(), |id| id.0)
    }

    /// Whether phrase matches of this label are sticky.
    pub fn is_override(&self, id: LabelId) -> bool {
        self.overrides.get(id.0).copied().unwrap_or(false)
    }

    /// Label for otherwise unmatched tokens.
    pub fn fallback(&self) -> Option<LabelId> {
        self.fallback
    }

    /// Configured merge behaviour.
    pub fn merge_mode(&self) -> MergeMode {
        self.merge_mode
    }

    /// All labels in rank order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Compilation summary.
    pub fn summary(&self) -> &RuleSetSummary {
        &self.summary
    }
}

fn merge_mode_of(config: &RuleConfig) -> MergeMode {
    if !config.contiguous_merge {
        MergeMode::Off
    } else if config.strict_merge {
        MergeMode::Strict
    } else {
        MergeMode::Whitespace
    }
}

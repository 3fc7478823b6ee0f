//! Rule configuration document.
//!
//! The configuration is plain JSON. It is validated once when loaded; the
//! compiled [`RuleSet`](super::RuleSet) never re-checks it.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{GleanerError, Result};

/// Signals that assign one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelRule {
    /// Exact lexical codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lemmas: Vec<String>,

    /// Surface forms. Multi-word entries become phrases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<String>,

    /// Token sequences, whitespace separated, matched contiguously.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phrases: Vec<String>,

    /// Gazetteer files, relative to the config file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gazetteer_files: Vec<PathBuf>,

    /// Applies to lemmas, surfaces and phrases of this label.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl LabelRule {
    /// Create an empty rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lexical code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.codes.push(code.into());
        self
    }

    /// Add a lemma.
    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemmas.push(lemma.into());
        self
    }

    /// Add a surface form or phrase.
    pub fn with_surface(mut self, surface: impl Into<String>) -> Self {
        self.surfaces.push(surface.into());
        self
    }

    /// Add a multi-token phrase.
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrases.push(phrase.into());
        self
    }

    /// Add a gazetteer file.
    pub fn with_gazetteer(mut self, path: impl Into<PathBuf>) -> Self {
        self.gazetteer_files.push(path.into());
        self
    }

    /// Set case sensitivity.
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }
}

fn default_true() -> bool {
    true
}

/// The full rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Rules keyed by label, in document order.
    #[serde(default)]
    pub rules: IndexMap<String, LabelRule>,

    /// Tie-break order, earliest wins. Labels missing here rank after
    /// the listed ones in rule order.
    #[serde(default)]
    pub priority: Vec<String>,

    /// Merge adjacent same-label token spans.
    #[serde(default = "default_true")]
    pub contiguous_merge: bool,

    /// Only merge spans that touch exactly.
    #[serde(default)]
    pub strict_merge: bool,

    /// Labels whose phrase matches are forced over their whole window.
    #[serde(default)]
    pub override_labels: Vec<String>,

    /// Label for tokens nothing else matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_on_miss: Option<String>,

    /// Directory gazetteer paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rules: IndexMap::new(),
            priority: Vec::new(),
            contiguous_merge: true,
            strict_merge: false,
            override_labels: Vec::new(),
            label_on_miss: None,
            base_dir: None,
        }
    }
}

impl RuleConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for a label.
    pub fn with_rule(mut self, label: impl Into<String>, rule: LabelRule) -> Self {
        self.rules.insert(label.into(), rule);
        self
    }

    /// Set the priority order.
    pub fn with_priority<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.priority = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Mark a label as override.
    pub fn with_override_label(mut self, label: impl Into<String>) -> Self {
        self.override_labels.push(label.into());
        self
    }

    /// Set the fallback label.
    pub fn with_label_on_miss(mut self, label: impl Into<String>) -> Self {
        self.label_on_miss = Some(label.into());
        self
    }

    /// Enable or disable contiguous merge.
    pub fn with_contiguous_merge(mut self, yes: bool) -> Self {
        self.contiguous_merge = yes;
        self
    }

    /// Enable or disable strict merge.
    pub fn with_strict_merge(mut self, yes: bool) -> Self {
        self.strict_merge = yes;
        self
    }

    /// Set the directory for relative gazetteer paths.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RuleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// Gazetteer paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GleanerError::io(path, e))?;

        let mut config: RuleConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                GleanerError::Config(format!("Failed to parse rules '{}': {}", path.display(), e))
            })?;

        if config.base_dir.is_none() {
            config.base_dir = path.parent().map(Path::to_path_buf);
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve a gazetteer path against the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<()> {
        for label in self.rules.keys() {
            if label.trim().is_empty() {
                return Err(GleanerError::Config("Rule label must not be empty".to_string()));
            }
        }

        let mut seen = HashSet::new();
        for label in &self.priority {
            if label.trim().is_empty() {
                return Err(GleanerError::Config(
                    "Priority entries must not be empty".to_string(),
                ));
            }
            if !seen.insert(label.as_str()) {
                return Err(GleanerError::Config(format!(
                    "Label '{}' appears twice in priority",
                    label
                )));
            }
        }

        for label in &self.override_labels {
            if !self.rules.contains_key(label) {
                return Err(GleanerError::Config(format!(
                    "Override label '{}' has no rule",
                    label
                )));
            }
        }

        if let Some(label) = &self.label_on_miss {
            if label.trim().is_empty() {
                return Err(GleanerError::Config(
                    "label_on_miss must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "rules": {
                "DEITY": {"lemmas": ["god"], "codes": ["H430"]},
                "PERSON": {"surfaces": ["Moses"], "case_sensitive": true}
            },
            "priority": ["DEITY", "PERSON"]
        }"#;

        let config = RuleConfig::from_json_str(json).unwrap();

        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules.get_index(0).unwrap().0, "DEITY");
        assert!(config.contiguous_merge);
        assert!(!config.strict_merge);
        assert!(config.rules["PERSON"].case_sensitive);
        assert!(config.label_on_miss.is_none());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"rules": {"X": {"lemmaz": ["a"]}}}"#;
        assert!(RuleConfig::from_json_str(json).is_err());

        let json = r#"{"rulez": {}}"#;
        assert!(RuleConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let json = r#"{"rules": {"A": {}}, "priority": ["A", "A"]}"#;
        let err = RuleConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, GleanerError::Config(_)));
    }

    #[test]
    fn test_override_label_requires_rule() {
        let config = RuleConfig::new()
            .with_rule("A", LabelRule::new())
            .with_override_label("B");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_path() {
        let config = RuleConfig::new().with_base_dir("/etc/gleaner");
        assert_eq!(
            config.resolve_path(Path::new("names.txt")),
            PathBuf::from("/etc/gleaner/names.txt")
        );
        assert_eq!(
            config.resolve_path(Path::new("/abs/names.txt")),
            PathBuf::from("/abs/names.txt")
        );
    }
}

//! Manually curated span overrides and their loaders.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GleanerError, Result};
use crate::input::VerseId;
use crate::rules::RuleSet;

/// One curated span for one verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Override {
    /// Create an override without a note.
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            note: None,
        }
    }

    /// Attach a curator note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// What to do with override labels the rule set does not define.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Treat the entry as unlabeled and skip it.
    #[default]
    Lenient,
    /// Fail the load.
    Strict,
}

/// An override that was not applied, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedOverride {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub start: i64,
    pub end: i64,
    pub label: String,
    pub reason: String,
}

/// Outcome of loading an override file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedOverride>,
}

impl OverrideReport {
    fn reject(&mut self, rejected: RejectedOverride) {
        warn!(
            "rejected override {} [{}, {}) {}: {}",
            rejected.reference, rejected.start, rejected.end, rejected.label, rejected.reason
        );
        self.rejected.push(rejected);
    }
}

/// Overrides keyed by verse.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<VerseId, Vec<Override>>,
}

impl OverrideTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override for a verse, keeping file order.
    pub fn insert(&mut self, verse: VerseId, entry: Override) {
        self.entries.entry(verse).or_default().push(entry);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, verse: VerseId, entry: Override) -> Self {
        self.insert(verse, entry);
        self
    }

    /// Overrides for one verse, in file order.
    pub fn get(&self, verse: &VerseId) -> &[Override] {
        self.entries.get(verse).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of overrides.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// True when the table holds no overrides.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of verses with at least one override.
    pub fn verse_count(&self) -> usize {
        self.entries.len()
    }
}

/// Offsets as written in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawOverride {
    start: i64,
    end: i64,
    label: String,
    #[serde(default)]
    note: Option<String>,
}

/// One row of a CSV/TSV override table.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    book: Option<String>,
    #[serde(default)]
    chapter: Option<u32>,
    #[serde(default)]
    verse: Option<u32>,
    start: i64,
    end: i64,
    label: String,
    #[serde(default)]
    note: Option<String>,
}

impl RawRow {
    fn verse_id(&self) -> Result<VerseId> {
        if let Some(reference) = self.reference.as_deref().filter(|r| !r.trim().is_empty()) {
            return reference.parse();
        }
        match (&self.book, self.chapter, self.verse) {
            (Some(book), Some(chapter), Some(verse)) if !book.trim().is_empty() => {
                Ok(VerseId::new(book.trim(), chapter, verse))
            }
            _ => Err(GleanerError::InvalidOverride {
                reference: self.reference.clone().unwrap_or_default(),
                message: "row needs 'reference' or 'book', 'chapter' and 'verse'".to_string(),
            }),
        }
    }
}

/// Loads override files and validates every entry.
///
/// JSON files map a reference such as `"Genesis 1:1"` to a list of
/// `{start, end, label, note}` objects. CSV/TSV files carry a header with
/// either `reference` or `book,chapter,verse`, then `start,end,label,note`.
#[derive(Debug, Clone, Default)]
pub struct OverrideLoader<'a> {
    rules: Option<&'a RuleSet>,
    policy: LabelPolicy,
}

impl<'a> OverrideLoader<'a> {
    /// Create a loader that accepts any label.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check labels against a rule set.
    pub fn with_rules(mut self, rules: &'a RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the policy for unknown labels.
    pub fn with_policy(mut self, policy: LabelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load an override file, choosing the format by extension.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(OverrideTable, OverrideReport)> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let result = match extension.as_deref() {
            Some("csv") => self.load_delimited(path, b','),
            Some("tsv") => self.load_delimited(path, b'\t'),
            _ => self.load_json(path),
        }?;

        info!(
            "loaded {} overrides from {} ({} rejected)",
            result.1.accepted,
            path.display(),
            result.1.rejected.len()
        );
        Ok(result)
    }

    /// Parse overrides from JSON text.
    pub fn from_json_str(&self, json: &str) -> Result<(OverrideTable, OverrideReport)> {
        let raw: IndexMap<String, Vec<RawOverride>> = serde_json::from_str(json)?;
        self.collect_json(raw)
    }

    fn load_json(&self, path: &Path) -> Result<(OverrideTable, OverrideReport)> {
        let file = File::open(path).map_err(|e| GleanerError::io(path, e))?;
        let raw: IndexMap<String, Vec<RawOverride>> =
            serde_json::from_reader(BufReader::new(file))?;
        self.collect_json(raw)
    }

    fn collect_json(
        &self,
        raw: IndexMap<String, Vec<RawOverride>>,
    ) -> Result<(OverrideTable, OverrideReport)> {
        let mut table = OverrideTable::new();
        let mut report = OverrideReport::default();

        for (reference, entries) in raw {
            let verse: Option<VerseId> = reference.parse().ok();
            for entry in entries {
                self.admit(
                    &mut table,
                    &mut report,
                    verse.clone(),
                    &reference,
                    None,
                    entry,
                )?;
            }
        }

        Ok((table, report))
    }

    fn load_delimited(&self, path: &Path, delimiter: u8) -> Result<(OverrideTable, OverrideReport)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut table = OverrideTable::new();
        let mut report = OverrideReport::default();

        for (idx, row) in reader.deserialize::<RawRow>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    report.reject(RejectedOverride {
                        reference: String::new(),
                        line: Some(line),
                        start: -1,
                        end: -1,
                        label: String::new(),
                        reason: format!("unreadable row: {}", e),
                    });
                    continue;
                }
            };

            let verse = row.verse_id().ok();
            let reference = verse
                .as_ref()
                .map(|v| v.to_string())
                .or_else(|| row.reference.clone())
                .unwrap_or_default();
            let raw = RawOverride {
                start: row.start,
                end: row.end,
                label: row.label,
                note: row.note.filter(|n| !n.is_empty()),
            };
            self.admit(&mut table, &mut report, verse, &reference, Some(line), raw)?;
        }

        Ok((table, report))
    }

    /// Validate one entry and either add it to the table or to the report.
    fn admit(
        &self,
        table: &mut OverrideTable,
        report: &mut OverrideReport,
        verse: Option<VerseId>,
        reference: &str,
        line: Option<usize>,
        raw: RawOverride,
    ) -> Result<()> {
        let rejected = |reason: String| RejectedOverride {
            reference: reference.to_string(),
            line,
            start: raw.start,
            end: raw.end,
            label: raw.label.clone(),
            reason,
        };

        let Some(verse) = verse else {
            report.reject(rejected("unparsable verse reference".to_string()));
            return Ok(());
        };

        if raw.start < 0 || raw.end < 0 {
            report.reject(rejected("negative offset".to_string()));
            return Ok(());
        }
        if raw.start >= raw.end {
            report.reject(rejected("start must be before end".to_string()));
            return Ok(());
        }

        let label = raw.label.trim();
        if label.is_empty() {
            report.reject(rejected("empty label".to_string()));
            return Ok(());
        }

        if let Some(rules) = self.rules {
            if !rules.is_known_label(label) {
                if self.policy == LabelPolicy::Strict {
                    return Err(GleanerError::UnknownLabel {
                        label: label.to_string(),
                        context: match line {
                            Some(line) => format!("override for {} (line {})", reference, line),
                            None => format!("override for {}", reference),
                        },
                    });
                }
                debug!("override for {} has unknown label '{}', skipped", reference, label);
                report.rejected.push(rejected("unknown label".to_string()));
                return Ok(());
            }
        }

        table.insert(
            verse,
            Override {
                start: raw.start as usize,
                end: raw.end as usize,
                label: label.to_string(),
                note: raw.note.clone(),
            },
        );
        report.accepted += 1;
        Ok(())
    }
}

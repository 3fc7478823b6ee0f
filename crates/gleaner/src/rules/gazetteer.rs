//! Gazetteer file ingestion.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{GleanerError, Result};

/// File formats a gazetteer can come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazetteerFormat {
    /// One entry per line.
    Text,
    /// First column of each comma-separated record.
    Csv,
    /// First column of each tab-separated record.
    Tsv,
    /// List of strings or of `{"name": ...}` objects.
    Json,
}

impl GazetteerFormat {
    /// Pick a format from the file extension. Unknown extensions read as text.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => GazetteerFormat::Csv,
            Some("tsv") => GazetteerFormat::Tsv,
            Some("json") => GazetteerFormat::Json,
            _ => GazetteerFormat::Text,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Name(String),
    Object { name: String },
}

/// Read every entry of a gazetteer file.
///
/// Entries are trimmed; blank entries and `#` comment lines are skipped.
pub fn load_gazetteer(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| GleanerError::io(path, e))?;
    parse_gazetteer(&contents, GazetteerFormat::from_path(path))
}

/// Parse gazetteer contents in the given format.
pub fn parse_gazetteer(contents: &str, format: GazetteerFormat) -> Result<Vec<String>> {
    let entries = match format {
        GazetteerFormat::Text => contents.lines().map(str::to_string).collect(),
        GazetteerFormat::Csv => first_column(contents, b',')?,
        GazetteerFormat::Tsv => first_column(contents, b'\t')?,
        GazetteerFormat::Json => json_entries(contents)?,
    };

    Ok(entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty() && !e.starts_with('#'))
        .collect())
}

fn first_column(contents: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(contents.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(first) = record.get(0) {
            entries.push(first.to_string());
        }
    }
    Ok(entries)
}

fn json_entries(contents: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(contents)?;
    if !value.is_array() {
        return Err(GleanerError::Config(
            "JSON gazetteer must be a list".to_string(),
        ));
    }

    let entries: Vec<JsonEntry> = serde_json::from_value(value)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            JsonEntry::Name(name) => name,
            JsonEntry::Object { name } => name,
        })
        .collect())
}

//! Dataset files: one JSONL file per split plus a manifest.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{GleanerError, Result};

use super::example::{Example, ExampleRecord};
use super::partition::{Partition, Split, SplitConfig, SplitRatios};
use super::summary::BatchSummary;

/// Version of the on-disk dataset layout.
pub const FORMAT_VERSION: &str = "1.0";

/// Name of the manifest file inside an output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Example counts per split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub train: usize,
    pub dev: usize,
    pub test: usize,
    pub holdout: usize,
}

impl SplitCounts {
    fn bump(&mut self, split: Split) {
        match split {
            Split::Train => self.train += 1,
            Split::Dev => self.dev += 1,
            Split::Test => self.test += 1,
            Split::Holdout => self.holdout += 1,
        }
    }

    /// Total over every split.
    pub fn total(&self) -> usize {
        self.train + self.dev + self.test + self.holdout
    }
}

/// Description of a written dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: String,
    pub created_at: DateTime<Utc>,
    pub seed: u64,
    /// Normalized ratios.
    pub ratios: SplitRatios,
    pub holdout_name: String,
    pub holdout_books: Vec<String>,
    /// File name to number of examples written.
    pub files: IndexMap<String, usize>,
    pub counts: SplitCounts,
    /// Per-book counts, in order of first appearance.
    pub books: IndexMap<String, SplitCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_digest: Option<String>,
    pub summary: BatchSummary,
}

impl Manifest {
    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| GleanerError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| GleanerError::io(path, e))?;
        Ok(())
    }

    /// Load a manifest written by [`Manifest::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| GleanerError::io(path, e))?;
        let manifest = serde_json::from_reader(BufReader::new(file))?;
        Ok(manifest)
    }
}

/// Write examples to `path`, one record per line. Returns the count.
pub fn write_jsonl(path: impl AsRef<Path>, examples: &[Example]) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| GleanerError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for example in examples {
        serde_json::to_writer(&mut writer, &example.to_record())?;
        writer
            .write_all(b"\n")
            .map_err(|e| GleanerError::io(path, e))?;
    }

    writer.flush().map_err(|e| GleanerError::io(path, e))?;
    Ok(examples.len())
}

/// Read a dataset file written by [`write_jsonl`].
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<Example>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GleanerError::io(path, e))?;

    let mut examples = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| GleanerError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ExampleRecord =
            serde_json::from_str(&line).map_err(|e| GleanerError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;
        examples.push(record.into());
    }

    Ok(examples)
}

/// Writes a partitioned dataset into an output directory.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    output_dir: PathBuf,
    rules_digest: Option<String>,
    input_digest: Option<String>,
}

impl DatasetWriter {
    /// Create a writer for `output_dir`. The directory is created on write.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            rules_digest: None,
            input_digest: None,
        }
    }

    /// Record the digest of the rule config in the manifest.
    pub fn with_rules_digest(mut self, digest: impl Into<String>) -> Self {
        self.rules_digest = Some(digest.into());
        self
    }

    /// Record the digest of the input file in the manifest.
    pub fn with_input_digest(mut self, digest: impl Into<String>) -> Self {
        self.input_digest = Some(digest.into());
        self
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every split and the manifest.
    ///
    /// Train, dev and test files are always written, even when empty. The
    /// holdout file is written only when it has examples.
    pub fn write(
        &self,
        partition: &Partition<Example>,
        config: &SplitConfig,
        summary: &BatchSummary,
    ) -> Result<Manifest> {
        config.validate()?;
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| GleanerError::io(&self.output_dir, e))?;

        let mut files = IndexMap::new();
        let mut counts = SplitCounts::default();
        let mut books: IndexMap<String, SplitCounts> = IndexMap::new();

        for split in [Split::Train, Split::Dev, Split::Test, Split::Holdout] {
            let examples = partition.get(split);
            if split == Split::Holdout && examples.is_empty() {
                continue;
            }

            let stem = match split {
                Split::Holdout => config.holdout_name.as_str(),
                other => other.label(),
            };
            let name = format!("{}.jsonl", stem);
            let written = write_jsonl(self.output_dir.join(&name), examples)?;
            tracing::info!("Wrote {} examples to {}", written, name);
            files.insert(name, written);

            for example in examples {
                counts.bump(split);
                books
                    .entry(example.book().to_string())
                    .or_default()
                    .bump(split);
            }
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            seed: config.seed,
            ratios: config.ratios,
            holdout_name: config.holdout_name.clone(),
            holdout_books: config.holdout_books.clone(),
            files,
            counts,
            books,
            rules_digest: self.rules_digest.clone(),
            input_digest: self.input_digest.clone(),
            summary: summary.clone(),
        };

        manifest.save(self.output_dir.join(MANIFEST_FILE))?;
        Ok(manifest)
    }
}

//! Stratified, seeded train/dev/test partitioning.
//!
//! Examples are grouped by stratum (book) in order of first appearance.
//! Each stratum is shuffled with its own RNG, seeded from the run seed and
//! the stratum name, so a stratum's split depends only on its own contents.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{GleanerError, Result};

/// Default seed for reproducible splits.
pub const DEFAULT_SEED: u64 = 13;

/// Train/dev/test proportions, normalized to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub dev: f64,
    pub test: f64,
}

impl SplitRatios {
    /// Validate and normalize ratios.
    ///
    /// Negative or non-finite values, or a non-positive sum, are rejected.
    pub fn new(train: f64, dev: f64, test: f64) -> Result<Self> {
        for (name, value) in [("train", train), ("dev", dev), ("test", test)] {
            if !value.is_finite() || value < 0.0 {
                return Err(GleanerError::InvalidRatios(format!(
                    "{} ratio must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let sum = train + dev + test;
        if sum <= 0.0 {
            return Err(GleanerError::InvalidRatios(format!(
                "ratios must sum to more than zero, got {}",
                sum
            )));
        }

        Ok(Self {
            train: train / sum,
            dev: dev / sum,
            test: test / sum,
        })
    }

    /// Sizes of train, dev and test for a stratum of `n` examples.
    ///
    /// Train and dev are rounded half-to-even; test takes the remainder.
    pub fn counts(&self, n: usize) -> (usize, usize, usize) {
        let train = ((self.train * n as f64).round_ties_even() as usize).min(n);
        let dev = ((self.dev * n as f64).round_ties_even() as usize).min(n - train);
        (train, dev, n - train - dev)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            dev: 0.1,
            test: 0.1,
        }
    }
}

impl FromStr for SplitRatios {
    type Err = GleanerError;

    /// Parse `train,dev,test`, e.g. `0.8,0.1,0.1`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(GleanerError::InvalidRatios(format!(
                "expected three comma-separated ratios, got '{}'",
                s
            )));
        }

        let mut values = [0.0f64; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                GleanerError::InvalidRatios(format!("'{}' is not a number", part))
            })?;
        }

        Self::new(values[0], values[1], values[2])
    }
}

impl fmt::Display for SplitRatios {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.train, self.dev, self.test)
    }
}

/// Partitioning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub ratios: SplitRatios,
    pub seed: u64,
    /// Strata routed whole to the holdout split.
    #[serde(default)]
    pub holdout_books: Vec<String>,
    /// File stem of the holdout split.
    pub holdout_name: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: DEFAULT_SEED,
            holdout_books: Vec::new(),
            holdout_name: "holdout".to_string(),
        }
    }
}

impl SplitConfig {
    /// Create a config with default ratios and seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ratios.
    pub fn with_ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = ratios;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Route a book to the holdout split.
    pub fn with_holdout_book(mut self, book: impl Into<String>) -> Self {
        self.holdout_books.push(book.into());
        self
    }

    /// Set the holdout split name.
    pub fn with_holdout_name(mut self, name: impl Into<String>) -> Self {
        self.holdout_name = name.into();
        self
    }

    /// Check that the holdout name can serve as a file stem of its own.
    pub fn validate(&self) -> Result<()> {
        let name = self.holdout_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(GleanerError::Config(format!(
                "holdout name '{}' is not a valid file stem",
                name
            )));
        }
        if RESERVED_STEMS.contains(&name) {
            return Err(GleanerError::Config(format!(
                "holdout name '{}' collides with a built-in split",
                name
            )));
        }
        Ok(())
    }
}

const RESERVED_STEMS: [&str; 4] = ["train", "dev", "test", "manifest"];

/// Named output split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Dev,
    Test,
    Holdout,
}

impl Split {
    /// Get the lowercase name.
    pub fn label(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev => "dev",
            Split::Test => "test",
            Split::Holdout => "holdout",
        }
    }
}

/// Items assigned to each split.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub dev: Vec<T>,
    pub test: Vec<T>,
    pub holdout: Vec<T>,
}

impl<T> Partition<T> {
    fn empty() -> Self {
        Self {
            train: Vec::new(),
            dev: Vec::new(),
            test: Vec::new(),
            holdout: Vec::new(),
        }
    }

    /// Total items across all splits.
    pub fn len(&self) -> usize {
        self.train.len() + self.dev.len() + self.test.len() + self.holdout.len()
    }

    /// True when every split is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items of one split.
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Dev => &self.dev,
            Split::Test => &self.test,
            Split::Holdout => &self.holdout,
        }
    }
}

/// Split `items` by stratum.
///
/// Every item lands in exactly one split. Identical seed, ratios and input
/// order give an identical partition.
pub fn partition<T, F>(items: Vec<T>, config: &SplitConfig, stratum: F) -> Partition<T>
where
    F: Fn(&T) -> &str,
{
    let holdout: HashSet<&str> = config.holdout_books.iter().map(String::as_str).collect();
    let mut result = Partition::empty();
    let mut strata: IndexMap<String, Vec<T>> = IndexMap::new();

    for item in items {
        let key = stratum(&item);
        if holdout.contains(key) {
            result.holdout.push(item);
        } else {
            let key = key.to_string();
            strata.entry(key).or_default().push(item);
        }
    }

    for (key, mut group) in strata {
        let mut rng = fastrand::Rng::with_seed(stratum_seed(config.seed, &key));
        rng.shuffle(&mut group);

        let (train_n, dev_n, test_n) = config.ratios.counts(group.len());
        tracing::debug!(
            "stratum {}: {} train, {} dev, {} test",
            key,
            train_n,
            dev_n,
            test_n
        );

        let mut rest = group.into_iter();
        result.train.extend(rest.by_ref().take(train_n));
        result.dev.extend(rest.by_ref().take(dev_n));
        result.test.extend(rest);
    }

    result
}

/// Per-stratum seed derived from the run seed and the stratum name.
fn stratum_seed(seed: u64, stratum: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(stratum.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(book: &str, n: usize) -> Vec<(String, usize)> {
        (0..n).map(|i| (book.to_string(), i)).collect()
    }

    fn book(item: &(String, usize)) -> &str {
        &item.0
    }

    #[test]
    fn test_counts_remainder_to_test() {
        let ratios = SplitRatios::new(0.8, 0.1, 0.1).unwrap();
        assert_eq!(ratios.counts(17), (14, 2, 1));
        assert_eq!(ratios.counts(0), (0, 0, 0));
        assert_eq!(ratios.counts(1), (1, 0, 0));
    }

    #[test]
    fn test_counts_round_half_to_even() {
        let ratios = SplitRatios::new(0.5, 0.5, 0.0).unwrap();
        // 0.5 rounds to 0, so the single item falls through to test.
        assert_eq!(ratios.counts(1), (0, 0, 1));
        assert_eq!(ratios.counts(3), (2, 1, 0));
    }

    #[test]
    fn test_ratios_normalized_and_validated() {
        let ratios = SplitRatios::new(8.0, 1.0, 1.0).unwrap();
        assert!((ratios.train - 0.8).abs() < 1e-12);

        assert!(SplitRatios::new(0.0, 0.0, 0.0).is_err());
        assert!(SplitRatios::new(-0.1, 0.6, 0.5).is_err());
        assert!(SplitRatios::new(f64::NAN, 0.1, 0.1).is_err());
    }

    #[test]
    fn test_ratios_from_str() {
        let ratios: SplitRatios = "0.8, 0.1, 0.1".parse().unwrap();
        assert_eq!(ratios.counts(17), (14, 2, 1));

        assert!("0.8,0.2".parse::<SplitRatios>().is_err());
        assert!("a,b,c".parse::<SplitRatios>().is_err());
    }

    #[test]
    fn test_holdout_name_validation() {
        assert!(SplitConfig::new().validate().is_ok());
        assert!(SplitConfig::new().with_holdout_name("ood").validate().is_ok());
        assert!(SplitConfig::new().with_holdout_name("dev").validate().is_err());
        assert!(SplitConfig::new().with_holdout_name("").validate().is_err());
        assert!(SplitConfig::new().with_holdout_name("../x").validate().is_err());
    }

    #[test]
    fn test_partition_genesis_scenario() {
        let config = SplitConfig::new().with_seed(13);
        let result = partition(items("Genesis", 17), &config, book);

        assert_eq!(result.train.len(), 14);
        assert_eq!(result.dev.len(), 2);
        assert_eq!(result.test.len(), 1);
        assert!(result.holdout.is_empty());
    }

    #[test]
    fn test_partition_is_complete_and_deterministic() {
        let mut input = items("Genesis", 23);
        input.extend(items("Exodus", 11));
        input.extend(items("Ruth", 4));
        let config = SplitConfig::new().with_seed(7).with_holdout_book("Ruth");

        let a = partition(input.clone(), &config, book);
        let b = partition(input.clone(), &config, book);
        assert_eq!(a, b);

        assert_eq!(a.len(), input.len());
        assert_eq!(a.holdout.len(), 4);
        assert!(a.holdout.iter().all(|(b, _)| b == "Ruth"));

        let mut seen: Vec<_> = a.train.iter().chain(&a.dev).chain(&a.test).chain(&a.holdout).cloned().collect();
        seen.sort();
        let mut expected = input;
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_different_seed_changes_order() {
        let input = items("Psalms", 150);
        let a = partition(input.clone(), &SplitConfig::new().with_seed(1), book);
        let b = partition(input, &SplitConfig::new().with_seed(2), book);

        assert_eq!(a.train.len(), b.train.len());
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn test_stratum_split_independent_of_other_strata() {
        let config = SplitConfig::new().with_seed(13);
        let alone = partition(items("Genesis", 17), &config, book);

        let mut mixed = items("Exodus", 9);
        mixed.extend(items("Genesis", 17));
        let together = partition(mixed, &config, book);

        let genesis_train: Vec<_> = together.train.iter().filter(|(b, _)| b == "Genesis").cloned().collect();
        assert_eq!(genesis_train, alone.train);
    }
}

//! Finished examples, stratified splitting, and dataset output.
//!
//! ```no_run
//! use gleaner::dataset::{BatchSummary, DatasetWriter, SplitConfig, partition};
//! # fn run(examples: Vec<gleaner::Example>) -> gleaner::Result<()> {
//! let config = SplitConfig::new().with_seed(13).with_holdout_book("Ruth");
//! let summary = BatchSummary::from_examples::<&str>(&[], &examples);
//! let split = partition(examples, &config, |e| e.book());
//!
//! let manifest = DatasetWriter::new("out").write(&split, &config, &summary)?;
//! println!("{} examples written", manifest.counts.total());
//! # Ok(())
//! # }
//! ```

mod example;
mod partition;
mod summary;
mod writer;

pub use example::{Example, ExampleMeta, ExampleRecord};
pub use partition::{DEFAULT_SEED, Partition, Split, SplitConfig, SplitRatios, partition};
pub use summary::BatchSummary;
pub use writer::{
    DatasetWriter, FORMAT_VERSION, MANIFEST_FILE, Manifest, SplitCounts, read_jsonl, write_jsonl,
};

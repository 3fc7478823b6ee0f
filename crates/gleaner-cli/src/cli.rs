//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use gleaner::SplitRatios;
use std::path::PathBuf;

/// Gleaner: deterministic silver NER dataset builder
#[derive(Parser)]
#[command(name = "gleaner")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate verses and write train/dev/test splits
    Build(BuildArgs),

    /// Compile a rule config and show what it contains
    Rules {
        /// Path to the rule config (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate an override table against a rule config
    Overrides {
        /// Path to the override table (JSON, CSV or TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the rule config (JSON)
        #[arg(short, long)]
        rules: PathBuf,

        /// Fail on labels the rule config does not define
        #[arg(long)]
        strict_labels: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the rule config (JSON)
    #[arg(short, long)]
    pub rules: PathBuf,

    /// Verses as JSON lines
    #[arg(short, long)]
    pub input: PathBuf,

    /// Manual override table (JSON, CSV or TSV)
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Output directory for split files and manifest
    #[arg(short, long)]
    pub output: PathBuf,

    /// Seed for the split shuffle
    #[arg(long, default_value_t = gleaner::dataset::DEFAULT_SEED)]
    pub seed: u64,

    /// Train, dev and test ratios
    #[arg(long, default_value = "0.8,0.1,0.1")]
    pub ratios: SplitRatios,

    /// Book routed whole to the holdout split (repeatable)
    #[arg(long = "holdout", value_name = "BOOK")]
    pub holdout: Vec<String>,

    /// File stem of the holdout split
    #[arg(long, default_value = "holdout")]
    pub holdout_name: String,

    /// Fail on override labels the rule config does not define
    #[arg(long)]
    pub strict_labels: bool,

    /// Annotate verses on all cores
    #[arg(long)]
    pub parallel: bool,
}

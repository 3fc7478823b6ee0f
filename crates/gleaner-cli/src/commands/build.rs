//! Build command - annotate verses and write dataset splits.

use colored::Colorize;
use gleaner::curation::{LabelPolicy, OverrideLoader};
use gleaner::dataset::{DatasetWriter, SplitConfig, partition};
use gleaner::input::{file_digest, load_verses};
use gleaner::{Annotator, OverrideTable, RuleSet};

use crate::cli::BuildArgs;

pub fn run(args: BuildArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&args.rules, &args.input] {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }

    let mut config = SplitConfig::new()
        .with_ratios(args.ratios)
        .with_seed(args.seed)
        .with_holdout_name(args.holdout_name);
    for book in args.holdout {
        config = config.with_holdout_book(book);
    }
    config.validate()?;

    println!(
        "{} {}",
        "Building dataset from".cyan().bold(),
        args.input.display().to_string().white()
    );

    let rules = RuleSet::load(&args.rules)?;
    let verses = load_verses(&args.input)?;

    let policy = if args.strict_labels {
        LabelPolicy::Strict
    } else {
        LabelPolicy::Lenient
    };
    let (table, report) = match &args.overrides {
        Some(path) => OverrideLoader::new()
            .with_rules(&rules)
            .with_policy(policy)
            .load(path)?,
        None => (OverrideTable::new(), Default::default()),
    };

    let batch = Annotator::new(&rules).annotate_batch(&verses, &table, args.parallel)?;
    let summary = &batch.summary;

    println!(
        "Annotated {} verses ({} tokens, {:.1}% aligned)",
        summary.examples.to_string().white().bold(),
        summary.tokens,
        summary.coverage * 100.0
    );
    println!(
        "Produced {} spans ({} verses without spans)",
        summary.total_spans().to_string().white().bold(),
        summary.empty_examples.to_string().yellow()
    );

    let rejected = report.rejected.len() + batch.rejected.len();
    if args.overrides.is_some() {
        println!(
            "Overrides: {} applied, {} rejected",
            summary.overrides_applied.to_string().green(),
            rejected.to_string().red()
        );
    }

    if verbose {
        println!();
        println!("{}", "Spans by label:".yellow().bold());
        for (label, count) in &summary.spans_by_label {
            println!("  {:20} {}", label, count);
        }
        for entry in report.rejected.iter().chain(&batch.rejected) {
            println!(
                "  {} {} [{}, {}) {}: {}",
                "rejected".red(),
                entry.reference,
                entry.start,
                entry.end,
                entry.label,
                entry.reason
            );
        }
        println!();
    }

    let split = partition(batch.examples, &config, |e| e.book());
    let manifest = DatasetWriter::new(&args.output)
        .with_rules_digest(file_digest(&args.rules)?)
        .with_input_digest(file_digest(&args.input)?)
        .write(&split, &config, summary)?;

    println!();
    for (name, count) in &manifest.files {
        println!("  {:20} {}", name, count.to_string().white().bold());
    }
    println!(
        "{} {}",
        "Saved to".green().bold(),
        args.output.display().to_string().white()
    );

    Ok(())
}

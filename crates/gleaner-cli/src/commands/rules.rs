//! Rules command - compile a rule config and report its contents.

use std::path::PathBuf;

use colored::Colorize;
use gleaner::RuleSet;

pub fn run(file: PathBuf, json_output: bool, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let rules = RuleSet::load(&file)?;
    let summary = rules.summary();

    if json_output {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Rule set".cyan().bold(),
        file.display().to_string().white()
    );
    println!();

    println!("{}", "Labels (highest priority first):".yellow().bold());
    for label in &summary.labels {
        let marker = if label.is_override {
            " sticky".magenta().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>2}. {:20} {} codes, {} lemmas, {} surfaces, {} phrases{}",
            label.rank,
            label.label.white().bold(),
            label.codes,
            label.lemmas,
            label.surfaces,
            label.phrases,
            marker
        );
    }
    println!();

    println!("Merge mode: {:?}", summary.merge_mode);
    if let Some(fallback) = &summary.label_on_miss {
        println!("Label on miss: {}", fallback.cyan());
    }
    println!(
        "Gazetteers: {} loaded, {} skipped",
        summary.gazetteers_loaded.to_string().green(),
        summary.gazetteers_skipped.len().to_string().red()
    );
    for skipped in &summary.gazetteers_skipped {
        println!(
            "  {} {} ({}): {}",
            "skipped".red(),
            skipped.path.display(),
            skipped.label,
            skipped.reason
        );
    }

    Ok(())
}

//! Overrides command - validate an override table against a rule set.

use std::path::PathBuf;

use colored::Colorize;
use gleaner::RuleSet;
use gleaner::curation::{LabelPolicy, OverrideLoader};

pub fn run(
    file: PathBuf,
    rules: PathBuf,
    strict_labels: bool,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    for path in [&file, &rules] {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }

    let rules = RuleSet::load(&rules)?;
    let policy = if strict_labels {
        LabelPolicy::Strict
    } else {
        LabelPolicy::Lenient
    };

    let (table, report) = OverrideLoader::new()
        .with_rules(&rules)
        .with_policy(policy)
        .load(&file)?;

    if json_output {
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "accepted": report.accepted,
            "verses": table.verse_count(),
            "rejected": report.rejected,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Override table".cyan().bold(),
        file.display().to_string().white()
    );
    println!(
        "Accepted {} overrides across {} verses",
        report.accepted.to_string().green().bold(),
        table.verse_count()
    );

    if report.rejected.is_empty() {
        println!("{}", "No rejected entries.".green());
    } else {
        println!(
            "Rejected {} entries:",
            report.rejected.len().to_string().red().bold()
        );
        for entry in &report.rejected {
            let line = entry.line.map(|l| format!("line {}: ", l)).unwrap_or_default();
            println!(
                "  {}{} [{}, {}) {}: {}",
                line, entry.reference, entry.start, entry.end, entry.label, entry.reason
            );
        }
    }

    Ok(())
}

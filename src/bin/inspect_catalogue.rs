use anyhow::{Context, Result};
use ragtagger::{RuleCatalogue, RuleCategory};
use std::{env, fs, path::PathBuf};

fn main() -> Result<()> {
    // 1) Read the workbook path from the first CLI argument
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: inspect_catalogue <WORKBOOK.xlsx>")?;
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;

    // 2) Parse it exactly as the pipeline would
    let catalogue = RuleCatalogue::load(&bytes)
        .with_context(|| format!("loading catalogue from {}", path.display()))?;
    println!("{}: {} group(s)\n", path.display(), catalogue.len());

    // 3) Print each group, marking the ones the annotation step ignores
    for group in catalogue.groups() {
        let used = RuleCategory::from_label(&group.name).is_some();
        let rules: Vec<_> = group.rules().collect();
        println!(
            "== {} ({} rule(s){}{})",
            group.name,
            rules.len(),
            if group.has_header() { ", header row" } else { "" },
            if used { "" } else { ", not evaluated" }
        );
        for (position, rule) in rules {
            let flag = if rule.is_complete() { " " } else { "!" };
            println!(
                "{} [{:>3}] {:<10} {:<40} {}",
                flag, position, rule.id, rule.condition, rule.description
            );
        }
        println!();
    }

    // 4) Call out recognised groups the workbook lacks
    for category in RuleCategory::ALL {
        if catalogue.category(category).is_none() {
            println!("missing group: {}", category);
        }
    }
    Ok(())
}

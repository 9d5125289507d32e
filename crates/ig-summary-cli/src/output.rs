//! Console status output

use colored::*;
use ig_summary_core::{DataDictionary, DiffSummary};
use std::path::Path;

pub fn print_header(title: &str) {
    println!("\n{}", title.bold());
}

pub fn print_written(what: &str, path: &Path) {
    println!("  {} {} {}", "✓".green(), what, path.display().to_string().cyan());
}

/// Counts of the tables of a data dictionary
pub fn print_dictionary_summary(doc: &DataDictionary) {
    println!("\n{}", "Summary:".bold());
    println!("  Profiles: {}", doc.profiles.len());
    println!("  Data elements: {}", doc.profile_elements.len());
    println!("  Extensions: {}", doc.extensions.len());
    println!("  Value sets: {}", doc.value_sets.len());
    println!("  Value set codes: {}", doc.value_set_elements.len());
    println!("  Code systems: {}", doc.code_systems.len());
}

pub fn print_diff_summary(summary: &DiffSummary) {
    println!("\n{}", "Differences:".bold());
    if summary.is_empty() {
        println!("  {} No differences found", "✓".green());
        return;
    }
    for line in summary.to_string().lines() {
        println!("  {}", line.yellow());
    }
}

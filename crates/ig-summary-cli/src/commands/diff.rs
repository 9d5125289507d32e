//! Diff Command - compare two data dictionaries
//!
//! ```sh
//! ig-summary diff --a stu1/ig-summary-my-ig.json --b stu2/ig-summary-my-ig.json \
//!     --output ./diff --settings diff-settings.yaml
//! ```

use super::{require_dir, require_file};
use crate::output;
use anyhow::Result;
use ig_summary_core::{
    DataDictionary, DiffSettings, DiffSummary, Differ, JsonWorkbookSink, WorkbookSink,
};
use std::path::Path;
use tracing::info;

pub fn diff_command(a: &Path, b: &Path, output_dir: &Path, settings: Option<&Path>) -> Result<()> {
    output::print_header("Comparing data dictionaries");

    require_file(a, "--a")?;
    require_file(b, "--b")?;
    require_dir(output_dir, "--output")?;
    if let Some(settings) = settings {
        require_file(settings, "--settings")?;
    }

    let left = DataDictionary::load(a)?;
    let right = DataDictionary::load(b)?;
    let settings = match settings {
        Some(path) => DiffSettings::from_file(path)?,
        None => DiffSettings::default(),
    };
    info!(
        "Comparing {} ({}) with {} ({})",
        settings.left_name,
        a.display(),
        settings.right_name,
        b.display()
    );

    let name = settings.filename_or_default().to_string();
    let differ = Differ::new(&left, &right, settings);
    let workbook = differ.to_workbook();
    let path = JsonWorkbookSink::new(output_dir).write(&workbook, &name)?;
    output::print_written("Diff workbook", &path);

    let summary = DiffSummary::of(&differ);
    summary.log();
    output::print_diff_summary(&summary);
    Ok(())
}

//! CLI command implementations
//!
//! - commands/create.rs - build a data dictionary from an IG folder
//! - commands/diff.rs - compare two data dictionaries

pub mod create;
pub mod diff;

use anyhow::{Result, bail};
use std::path::Path;

/// Fail unless `path` is an existing folder
pub(crate) fn require_dir(path: &Path, flag: &str) -> Result<()> {
    if !path.is_dir() {
        bail!("The folder specified in {flag} ({}) does not exist", path.display());
    }
    Ok(())
}

/// Fail unless `path` is an existing file
pub(crate) fn require_file(path: &Path, flag: &str) -> Result<()> {
    if !path.is_file() {
        bail!("The file specified in {flag} ({}) does not exist", path.display());
    }
    Ok(())
}

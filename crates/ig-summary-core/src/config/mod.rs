//! Configuration for data dictionary runs and diffs
//!
//! - [`DataDictionarySettings`]: options for generating a data dictionary
//! - [`DiffSettings`]: options for comparing two data dictionaries
//! - [`IgConfiguration`]: IG metadata from `sushi-config.yaml` or `package.json`
//! - [`ProfileGroups`]: profile id to group name mapping

pub mod diff_settings;
pub mod groups;
pub mod ig_config;
pub mod settings;

pub use diff_settings::{DiffSettings, NoteRule, RemapRule, RenamedValueSet, ValueSetSettings};
pub use groups::{DEFAULT_GROUP, ProfileGroups};
pub use ig_config::{IgConfiguration, IgLayout, ResourceGroup, SushiConfiguration};
pub use settings::{
    DataDictionaryMode, DataDictionarySettings, IncludedValueSets, ResolutionFailurePolicy,
};

use crate::error::IgSummaryError;
use crate::result::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and deserialize a YAML settings file; an empty file yields the defaults
pub(crate) fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| IgSummaryError::io_error(path, e))?;
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| IgSummaryError::parse_error(path, e.to_string()))
}

//! Data dictionary document
//!
//! The JSON file written by a summary run and read back by a later diff run.
//! Its field names are part of the interchange format and must stay stable.

use crate::element::DataElementRow;
use crate::error::IgSummaryError;
use crate::result::Result;
use crate::value_set::ValueSetRow;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A profile, extension, value set or code system of the IG
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryMetadata {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDictionary {
    pub profiles: Vec<SummaryRow>,
    pub profile_elements: Vec<DataElementRow>,
    pub value_sets: Vec<SummaryRow>,
    pub value_set_elements: Vec<ValueSetRow>,
    pub extensions: Vec<SummaryRow>,
    pub code_systems: Vec<SummaryRow>,
    pub metadata: DictionaryMetadata,
}

impl DataDictionary {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a document written by an earlier run
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| IgSummaryError::io_error(path, e))?;
        Self::from_json(&contents).map_err(|e| IgSummaryError::parse_error(path, e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        debug!("Writing data dictionary to {}", path.display());
        std::fs::write(path, self.to_json()?).map_err(|e| IgSummaryError::io_error(path, e))
    }

    /// Whether every profile is in the default group
    pub fn all_groups_default(&self) -> bool {
        self.profiles
            .iter()
            .all(|p| p.group.as_deref().is_none_or(|g| g == crate::config::DEFAULT_GROUP))
    }
}

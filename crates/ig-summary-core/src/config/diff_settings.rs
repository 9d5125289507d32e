//! Settings for comparing two data dictionaries
//!
//! ```yaml
//! leftName: STU1
//! rightName: STU2
//! valueSets:
//!   renamed:
//!     - old: http://example.org/ValueSet/old-name
//!       new: http://example.org/ValueSet/new-name
//! ignoreColumnsWhenComparing:
//!   - Group
//! remapValues:
//!   - column: Source Profile URI
//!     old: http://example.org/StructureDefinition/old-profile
//!     new: http://example.org/StructureDefinition/new-profile
//! notes:
//!   - note: Moved from the primary cancer profile
//!     appearBy:
//!       - Profile Title: Primary Cancer Condition
//! suppressRows:
//!   - FHIR Element (R4): Observation.meta
//! ```

use super::read_yaml;
use crate::result::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_LEFT_NAME: &str = "Left";
pub const DEFAULT_RIGHT_NAME: &str = "Right";

/// Field-equality criteria: every column must hold exactly the given value
pub type MatchCriteria = IndexMap<String, String>;

/// A value set URI that changed between the two dictionaries
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenamedValueSet {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValueSetSettings {
    pub renamed: Vec<RenamedValueSet>,
}

/// Replace `old` with `new` in `column` before comparing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemapRule {
    pub column: String,
    pub old: String,
    pub new: String,
}

/// Annotation attached to rows matching any of the `appear_by` criteria
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRule {
    pub note: String,
    #[serde(default)]
    pub appear_by: Vec<MatchCriteria>,
}

/// Options controlling a diff run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffSettings {
    pub left_name: String,
    pub right_name: String,
    pub filename: Option<String>,
    pub value_sets: ValueSetSettings,
    pub ignore_columns_when_comparing: Vec<String>,
    pub remap_values: Vec<RemapRule>,
    pub notes: Vec<NoteRule>,
    pub suppress_rows: Vec<MatchCriteria>,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            left_name: DEFAULT_LEFT_NAME.to_string(),
            right_name: DEFAULT_RIGHT_NAME.to_string(),
            filename: None,
            value_sets: ValueSetSettings::default(),
            ignore_columns_when_comparing: Vec::new(),
            remap_values: Vec::new(),
            notes: Vec::new(),
            suppress_rows: Vec::new(),
        }
    }
}

impl DiffSettings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        read_yaml(path)
    }

    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Output file stem, `diff` unless configured
    pub fn filename_or_default(&self) -> &str {
        self.filename.as_deref().unwrap_or("diff")
    }

    /// Follow the value set rename table
    pub fn follow_uri_remap<'a>(&'a self, uri: &'a str) -> &'a str {
        self.value_sets
            .renamed
            .iter()
            .find(|rename| rename.old == uri)
            .map(|rename| rename.new.as_str())
            .unwrap_or(uri)
    }

    pub fn is_ignored_column(&self, column: &str) -> bool {
        self.ignore_columns_when_comparing.iter().any(|c| c == column)
    }
}

//! Data dictionary settings (`--settings` YAML file)
//!
//! ## Example
//!
//! ```yaml
//! title: Example IG Data Dictionary
//! filename: example-data-dictionary
//! codeSystems:
//!   http://loinc.org: LOINC
//!   http://hl7.org/fhir/sid/icd-10-cm: ICD-10 CM
//! touchUpHumanizedElementNames:
//!   Dna: DNA
//! suppressFixedCodes: true
//! excludeElement:
//!   - Observation.meta
//! ```

use super::read_yaml;
use crate::result::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which elements end up in the data dictionary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DataDictionaryMode {
    /// Only must-support elements
    #[default]
    #[serde(rename = "ms", alias = "MS")]
    MustSupport,
    /// Every element of every profile
    #[serde(rename = "all", alias = "ALL")]
    All,
}

impl fmt::Display for DataDictionaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataDictionaryMode::MustSupport => write!(f, "MustSupport only"),
            DataDictionaryMode::All => write!(f, "ALL"),
        }
    }
}

/// How `compose.include.valueSet` references are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludedValueSets {
    /// One "Include codes from ..." row per referenced value set
    #[default]
    Reference,
    /// Inline the referenced value set's rows
    Expand,
}

/// What happens when a profile's elements cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionFailurePolicy {
    /// Stop the whole run
    #[default]
    Abort,
    /// Log the failure and leave the profile out
    SkipProfile,
}

/// Options controlling data dictionary generation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDictionarySettings {
    pub title: Option<String>,
    pub mode: DataDictionaryMode,
    pub filename: Option<String>,
    /// Code system URI → display name
    pub code_systems: IndexMap<String, String>,
    /// Extra rows for the "IG information" sheet
    pub information_tab_content: IndexMap<String, String>,
    /// Find → replace applied to humanized element names, in order
    pub touch_up_humanized_element_names: IndexMap<String, String>,
    pub suppress_fixed_codes: bool,
    pub exclude_element: Vec<String>,
    pub included_value_sets: IncludedValueSets,
    pub on_resolution_error: ResolutionFailurePolicy,
}

impl DataDictionarySettings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        read_yaml(path)
    }

    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Output file stem, `ig-summary-<ig id>` unless configured
    pub fn filename_or_default(&self, ig_id: &str) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("ig-summary-{ig_id}"))
    }

    /// Display name of a code system, falling back to its URI
    pub fn code_system_name<'a>(&'a self, uri: &'a str) -> &'a str {
        self.code_systems.get(uri).map(String::as_str).unwrap_or(uri)
    }

    pub fn is_excluded(&self, element_id: &str) -> bool {
        self.exclude_element.iter().any(|id| id == element_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let yaml = r#"
title: Example Data Dictionary
filename: example-dd
codeSystems:
  http://loinc.org: LOINC
touchUpHumanizedElementNames:
  Dna: DNA
  Hgvs: HGVS
suppressFixedCodes: true
excludeElement:
  - Observation.meta
includedValueSets: expand
onResolutionError: skip-profile
"#;

        let settings = DataDictionarySettings::from_yaml(yaml).unwrap();
        assert_eq!(settings.title.as_deref(), Some("Example Data Dictionary"));
        assert_eq!(settings.mode, DataDictionaryMode::MustSupport);
        assert_eq!(settings.code_system_name("http://loinc.org"), "LOINC");
        assert_eq!(settings.code_system_name("http://snomed.info/sct"), "http://snomed.info/sct");
        let touch_ups: Vec<_> = settings.touch_up_humanized_element_names.keys().collect();
        assert_eq!(touch_ups, vec!["Dna", "Hgvs"]);
        assert!(settings.suppress_fixed_codes);
        assert!(settings.is_excluded("Observation.meta"));
        assert_eq!(settings.included_value_sets, IncludedValueSets::Expand);
        assert_eq!(settings.on_resolution_error, ResolutionFailurePolicy::SkipProfile);
    }

    #[test]
    fn test_defaults() {
        let settings = DataDictionarySettings::default();
        assert_eq!(settings.mode, DataDictionaryMode::MustSupport);
        assert_eq!(settings.included_value_sets, IncludedValueSets::Reference);
        assert_eq!(settings.on_resolution_error, ResolutionFailurePolicy::Abort);
        assert_eq!(settings.filename_or_default("example.ig"), "ig-summary-example.ig");
    }

    #[test]
    fn test_mode_from_yaml() {
        let settings = DataDictionarySettings::from_yaml("mode: all").unwrap();
        assert_eq!(settings.mode, DataDictionaryMode::All);
    }
}

//! ElementDefinition model - one node of a profile's snapshot or differential

use super::common::*;
use serde::{Deserialize, Serialize};

/// List of element definitions
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ElementList {
    #[serde(default)]
    pub element: Vec<ElementDefinition>,
}

/// FHIR ElementDefinition
///
/// Only the attributes that feed a data dictionary row are modelled; every
/// other property of the JSON is ignored on load.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    // Core identification
    pub id: String,
    pub path: String,
    pub slice_name: Option<String>,

    // Cardinality
    pub min: Option<u32>,
    pub max: Option<String>, // Can be "*"

    // Type constraints
    #[serde(rename = "type")]
    pub type_: Option<Vec<TypeRef>>,

    // Flags
    pub must_support: Option<bool>,

    // Binding
    pub binding: Option<Binding>,

    // Slicing
    pub slicing: Option<Slicing>,

    // Fixed codes are expressed as patterns by SUSHI
    pub pattern_codeable_concept: Option<CodeableConcept>,

    // Metadata
    pub definition: Option<String>,

    pub extension: Option<Vec<ExtensionRef>>,
}

impl ElementDefinition {
    /// Check if this is a slice (has slice name)
    pub fn is_slice(&self) -> bool {
        self.slice_name.is_some()
    }

    pub fn is_must_support(&self) -> bool {
        self.must_support == Some(true)
    }

    /// All type codes, in declaration order
    pub fn type_codes(&self) -> Vec<&str> {
        self.type_
            .iter()
            .flatten()
            .map(|t| t.code.as_str())
            .collect()
    }

    /// Whether any declared type has the given code
    pub fn has_type(&self, code: &str) -> bool {
        self.type_.iter().flatten().any(|t| t.code == code)
    }

    pub fn first_type_code(&self) -> Option<&str> {
        self.type_
            .as_ref()
            .and_then(|types| types.first())
            .map(|t| t.code.as_str())
    }

    /// First profile of the first type, used to find an extension's own definition
    pub fn first_type_profile(&self) -> Option<&str> {
        self.type_
            .as_ref()
            .and_then(|types| types.first())
            .and_then(|t| t.profile.as_ref())
            .and_then(|profiles| profiles.first())
            .map(String::as_str)
    }

    /// `min..max` equals `0..0`
    pub fn is_prohibited(&self) -> bool {
        self.min == Some(0) && self.max.as_deref() == Some("0")
    }

    /// Value set URI of the binding, when the binding names one
    pub fn bound_value_set(&self) -> Option<&str> {
        self.binding.as_ref().and_then(|b| b.value_set.as_deref())
    }

    /// `(system, code)` when the element is pinned to exactly one coding
    pub fn fixed_coding(&self) -> Option<(&str, &str)> {
        let codings = self.pattern_codeable_concept.as_ref()?.coding.as_ref()?;
        match codings.as_slice() {
            [coding] => Some((coding.system.as_deref()?, coding.code.as_deref()?)),
            _ => None,
        }
    }

    /// Id with a trailing `:sliceName` removed
    pub fn id_without_slice(&self) -> &str {
        match &self.slice_name {
            Some(slice) => self
                .id
                .strip_suffix(slice.as_str())
                .and_then(|rest| rest.strip_suffix(':'))
                .unwrap_or(&self.id),
            None => &self.id,
        }
    }

    pub fn has_extension_url_containing(&self, fragment: &str) -> bool {
        self.extension
            .iter()
            .flatten()
            .any(|ext| ext.url.contains(fragment))
    }
}

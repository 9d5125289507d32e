//! ValueSet model for FHIR terminology

use serde::{Deserialize, Serialize};

/// FHIR ValueSet resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>, // Optional for tagged enum deserialization
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub compose: Option<ValueSetCompose>,
}

/// ValueSet compose element
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ValueSetCompose {
    #[serde(default)]
    pub include: Vec<ValueSetInclude>,
    pub exclude: Option<Vec<ValueSetInclude>>,
}

/// ValueSet include/exclude element
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetInclude {
    pub system: Option<String>,
    pub version: Option<String>,
    pub concept: Option<Vec<ValueSetConcept>>,
    pub filter: Option<Vec<ValueSetFilter>>,
    pub value_set: Option<Vec<String>>,
}

/// ValueSet concept
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValueSetConcept {
    pub code: String,
    pub display: Option<String>,
}

/// ValueSet filter
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValueSetFilter {
    pub property: String,
    pub op: String,
    pub value: String,
}

impl ValueSet {
    /// Human readable title, falling back to the computable name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn includes(&self) -> &[ValueSetInclude] {
        self.compose
            .as_ref()
            .map(|c| c.include.as_slice())
            .unwrap_or(&[])
    }
}

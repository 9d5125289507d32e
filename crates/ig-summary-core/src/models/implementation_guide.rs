//! ImplementationGuide model for FHIR IG metadata

use serde::{Deserialize, Serialize};

/// FHIR ImplementationGuide resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationGuide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub version: Option<String>,
    pub package_id: Option<String>,
    pub fhir_version: Option<Vec<String>>,
    pub depends_on: Option<Vec<ImplementationGuideDependsOn>>,
}

/// ImplementationGuide dependency
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationGuideDependsOn {
    pub uri: String,
    pub package_id: Option<String>,
    pub version: Option<String>,
}

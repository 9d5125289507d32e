//! Common FHIR types used across multiple resources

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type reference in ElementDefinition
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub code: String,
    pub profile: Option<Vec<String>>,
    pub target_profile: Option<Vec<String>>,
}

/// Value set binding
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub strength: BindingStrength,
    pub value_set: Option<String>,
    pub description: Option<String>,
}

/// Binding strength enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    Required,
    Extensible,
    Preferred,
    Example,
}

impl BindingStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStrength::Required => "required",
            BindingStrength::Extensible => "extensible",
            BindingStrength::Preferred => "preferred",
            BindingStrength::Example => "example",
        }
    }
}

impl fmt::Display for BindingStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slicing definition
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Slicing {
    pub discriminator: Option<Vec<Discriminator>>,
    pub description: Option<String>,
    pub ordered: Option<bool>,
    pub rules: Option<String>,
}

/// Slicing discriminator
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Discriminator {
    #[serde(rename = "type")]
    pub type_: String,
    pub path: String,
}

/// CodeableConcept type
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CodeableConcept {
    pub coding: Option<Vec<Coding>>,
    pub text: Option<String>,
}

/// Coding type
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Coding {
    pub system: Option<String>,
    pub version: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

/// An extension attached to a definition; only the url is inspected
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExtensionRef {
    pub url: String,
}

//! StructureDefinition model - represents FHIR profiles, extensions and base resources

use super::element_definition::{ElementDefinition, ElementList};
use serde::{Deserialize, Serialize};

/// Canonical URL of the base Extension definition
pub const BASE_EXTENSION_URL: &str = "http://hl7.org/fhir/StructureDefinition/Extension";

/// FHIR StructureDefinition resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>, // Optional for tagged enum deserialization
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    /// Base resource type constrained by this definition (e.g. `Patient`)
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub base_definition: Option<String>,
    pub derivation: Option<Derivation>,
    pub kind: Option<StructureDefinitionKind>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<bool>,
    pub differential: Option<ElementList>,
    pub snapshot: Option<ElementList>,
}

/// Derivation type (constraint or specialization)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivation {
    Constraint,     // Profile or Extension
    Specialization, // Logical Model or Resource
}

/// StructureDefinition kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    Resource,
    ComplexType,
    PrimitiveType,
    Logical,
}

impl StructureDefinition {
    /// Determine if this is a Profile (a constraint on something other than Extension)
    pub fn is_profile(&self) -> bool {
        matches!(self.derivation, Some(Derivation::Constraint)) && !self.is_extension()
    }

    /// Determine if this is an Extension definition
    pub fn is_extension(&self) -> bool {
        self.type_.as_deref() == Some("Extension")
            || self
                .base_definition
                .as_ref()
                .map(|url| url.ends_with("/Extension"))
                .unwrap_or(false)
    }

    /// An extension whose parent is itself a profiled extension
    pub fn derives_from_extension_profile(&self) -> bool {
        self.is_extension()
            && self
                .base_definition
                .as_deref()
                .is_some_and(|base| base != BASE_EXTENSION_URL)
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_ == Some(true)
    }

    /// Human readable title, falling back to the computable name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn snapshot_elements(&self) -> &[ElementDefinition] {
        self.snapshot
            .as_ref()
            .map(|list| list.element.as_slice())
            .unwrap_or(&[])
    }

    pub fn differential_elements(&self) -> &[ElementDefinition] {
        self.differential
            .as_ref()
            .map(|list| list.element.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_structure_definition() {
        let json = r#"{
            "resourceType": "StructureDefinition",
            "url": "http://example.org/StructureDefinition/MyProfile",
            "name": "MyProfile",
            "status": "active",
            "type": "Patient",
            "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Patient",
            "derivation": "constraint",
            "snapshot": {"element": [{"id": "Patient", "path": "Patient"}]}
        }"#;

        let sd: StructureDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(sd.name, "MyProfile");
        assert_eq!(sd.derivation, Some(Derivation::Constraint));
        assert!(sd.is_profile());
        assert!(!sd.is_extension());
        assert_eq!(sd.snapshot_elements().len(), 1);
        assert!(sd.differential_elements().is_empty());
        assert_eq!(sd.display_title(), "MyProfile");
    }

    #[test]
    fn test_is_extension() {
        let sd = StructureDefinition {
            url: "http://example.org/StructureDefinition/MyExtension".to_string(),
            name: "MyExtension".to_string(),
            type_: Some("Extension".to_string()),
            base_definition: Some(BASE_EXTENSION_URL.to_string()),
            derivation: Some(Derivation::Constraint),
            ..Default::default()
        };

        assert!(sd.is_extension());
        assert!(!sd.is_profile());
        assert!(!sd.derives_from_extension_profile());
    }

    #[test]
    fn test_derives_from_extension_profile() {
        let sd = StructureDefinition {
            url: "http://example.org/StructureDefinition/Narrowed".to_string(),
            type_: Some("Extension".to_string()),
            base_definition: Some("http://example.org/StructureDefinition/Wide".to_string()),
            derivation: Some(Derivation::Constraint),
            ..Default::default()
        };
        assert!(sd.derives_from_extension_profile());
    }
}

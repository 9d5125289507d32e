//! CodeSystem model for FHIR terminology

use serde::{Deserialize, Serialize};

/// FHIR CodeSystem resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>, // Optional for tagged enum deserialization
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
}

impl CodeSystem {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_code_system() {
        let json = r#"{
            "resourceType": "CodeSystem",
            "url": "http://example.org/CodeSystem/example",
            "name": "ExampleCS",
            "title": "Example Code System",
            "status": "active",
            "content": "complete",
            "concept": [{"code": "code1", "display": "Display 1"}]
        }"#;

        let cs: CodeSystem = serde_json::from_str(json).unwrap();
        assert_eq!(cs.name, "ExampleCS");
        assert_eq!(cs.display_title(), "Example Code System");
    }
}

//! FHIR resource enum for deserialization

use super::{CodeSystem, ImplementationGuide, StructureDefinition, ValueSet};
use serde::Deserialize;

/// FHIR resource discriminated union
///
/// Uses Serde's tag-based deserialization to determine resource type
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "resourceType")]
pub enum FhirResource {
    StructureDefinition(Box<StructureDefinition>),
    ValueSet(Box<ValueSet>),
    CodeSystem(Box<CodeSystem>),
    ImplementationGuide(Box<ImplementationGuide>),
    #[serde(other)]
    Other,
}

impl FhirResource {
    /// Get resource type as string
    pub fn resource_type(&self) -> &'static str {
        match self {
            FhirResource::StructureDefinition(_) => "StructureDefinition",
            FhirResource::ValueSet(_) => "ValueSet",
            FhirResource::CodeSystem(_) => "CodeSystem",
            FhirResource::ImplementationGuide(_) => "ImplementationGuide",
            FhirResource::Other => "Other",
        }
    }
}

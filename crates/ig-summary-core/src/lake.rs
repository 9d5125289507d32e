//! DefinitionLake - in-memory store of FHIR conformance resources
//!
//! One lake holds the IG's own definitions, a second one holds everything
//! loaded from dependency packages. Both are filled by the loader before a
//! run starts and are read-only afterwards.

use crate::fishable::{FhirType, Fishable};
use crate::models::*;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Repository of definitions, keyed by canonical URL in insertion order
#[derive(Debug, Default)]
pub struct DefinitionLake {
    /// StructureDefinitions by canonical URL (preserves insertion order)
    structure_definitions: IndexMap<String, StructureDefinition>,

    /// ValueSets by canonical URL
    value_sets: IndexMap<String, ValueSet>,

    /// CodeSystems by canonical URL
    code_systems: IndexMap<String, CodeSystem>,

    implementation_guides: Vec<ImplementationGuide>,

    /// StructureDefinition id → URL
    id_to_url: HashMap<String, String>,

    /// StructureDefinition name → URL
    name_to_url: HashMap<String, String>,
}

/// Counts of resources held by a lake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LakeStats {
    pub structure_definitions: usize,
    pub value_sets: usize,
    pub code_systems: usize,
    pub implementation_guides: usize,
}

impl LakeStats {
    pub fn total(&self) -> usize {
        self.structure_definitions + self.value_sets + self.code_systems + self.implementation_guides
    }
}

impl DefinitionLake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a StructureDefinition to the lake
    pub fn add_structure_definition(&mut self, sd: StructureDefinition) {
        let url = sd.url.clone();

        // Build indices
        if let Some(id) = &sd.id {
            self.id_to_url.insert(id.clone(), url.clone());
        }
        if !sd.name.is_empty() {
            self.name_to_url.insert(sd.name.clone(), url.clone());
        }

        if self.structure_definitions.insert(url.clone(), sd).is_some() {
            debug!("Replaced duplicate StructureDefinition {}", url);
        }
    }

    /// Add a ValueSet to the lake
    pub fn add_value_set(&mut self, vs: ValueSet) {
        self.value_sets.insert(vs.url.clone(), vs);
    }

    /// Add a CodeSystem to the lake
    pub fn add_code_system(&mut self, cs: CodeSystem) {
        self.code_systems.insert(cs.url.clone(), cs);
    }

    pub fn add_implementation_guide(&mut self, ig: ImplementationGuide) {
        self.implementation_guides.push(ig);
    }

    /// Get StructureDefinition by URL
    pub fn get_structure_definition(&self, url: &str) -> Option<&StructureDefinition> {
        self.structure_definitions.get(url)
    }

    /// Get ValueSet by URL
    pub fn get_value_set(&self, url: &str) -> Option<&ValueSet> {
        self.value_sets.get(url)
    }

    /// Get CodeSystem by URL
    pub fn get_code_system(&self, url: &str) -> Option<&CodeSystem> {
        self.code_systems.get(url)
    }

    /// Profiles in load order, unique by id
    pub fn profiles(&self) -> Vec<&StructureDefinition> {
        unique_by_id(self.structure_definitions.values().filter(|sd| sd.is_profile()))
    }

    /// Extension definitions in load order, unique by id
    pub fn extensions(&self) -> Vec<&StructureDefinition> {
        unique_by_id(
            self.structure_definitions
                .values()
                .filter(|sd| sd.is_extension() && sd.derivation == Some(Derivation::Constraint)),
        )
    }

    /// All value sets keyed by URL
    pub fn value_sets(&self) -> &IndexMap<String, ValueSet> {
        &self.value_sets
    }

    pub fn code_systems(&self) -> impl Iterator<Item = &CodeSystem> {
        self.code_systems.values()
    }

    /// Implementation guides, unique by id
    pub fn implementation_guides(&self) -> Vec<&ImplementationGuide> {
        let mut seen = HashSet::new();
        self.implementation_guides
            .iter()
            .filter(|ig| seen.insert(ig.id.clone()))
            .collect()
    }

    pub fn stats(&self) -> LakeStats {
        LakeStats {
            structure_definitions: self.structure_definitions.len(),
            value_sets: self.value_sets.len(),
            code_systems: self.code_systems.len(),
            implementation_guides: self.implementation_guides.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats().total() == 0
    }
}

fn unique_by_id<'a>(
    definitions: impl Iterator<Item = &'a StructureDefinition>,
) -> Vec<&'a StructureDefinition> {
    let mut seen = HashSet::new();
    definitions
        .filter(|sd| seen.insert(sd.id.clone().unwrap_or_else(|| sd.url.clone())))
        .collect()
}

impl Fishable for DefinitionLake {
    /// Lookup by URL, then by id, then by name
    fn fish_structure_definition(
        &self,
        item: &str,
        types: &[FhirType],
    ) -> Option<&StructureDefinition> {
        let url = if self.structure_definitions.contains_key(item) {
            item
        } else if let Some(url) = self.id_to_url.get(item) {
            url.as_str()
        } else {
            self.name_to_url.get(item)?.as_str()
        };

        self.structure_definitions
            .get(url)
            .filter(|sd| FhirType::matches_any(types, sd))
    }
}

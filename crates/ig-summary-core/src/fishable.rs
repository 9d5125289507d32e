//! Fishable trait for StructureDefinition lookups
//!
//! A data dictionary run looks definitions up in two places: the IG's own
//! definitions (the primary set) and the packages it depends on (the external
//! set). Both are fully populated before resolution begins and never change
//! afterwards, so lookups are plain synchronous reads.
//!
//! # Example
//!
//! ```rust
//! use ig_summary_core::{DefinitionLake, DefinitionSources};
//!
//! let primary = DefinitionLake::new();
//! let external = DefinitionLake::new();
//! let sources = DefinitionSources::new(&primary, &external);
//! assert!(sources.fish_everywhere("http://example.org/StructureDefinition/missing").is_none());
//! ```

use crate::models::StructureDefinition;
use tracing::trace;

/// StructureDefinition filter for fishing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhirType {
    /// StructureDefinition (any kind)
    StructureDefinition,
    /// Profile (constraint that is not an extension)
    Profile,
    /// Extension definition
    Extension,
}

impl FhirType {
    /// Check if a definition matches this filter
    pub fn matches(&self, sd: &StructureDefinition) -> bool {
        match self {
            FhirType::StructureDefinition => true,
            FhirType::Profile => sd.is_profile(),
            FhirType::Extension => sd.is_extension(),
        }
    }

    /// Empty filter lists match everything
    pub fn matches_any(types: &[FhirType], sd: &StructureDefinition) -> bool {
        types.is_empty() || types.iter().any(|t| t.matches(sd))
    }
}

/// A read-only set of definitions that can be searched by url, id or name
pub trait Fishable {
    /// Find a StructureDefinition whose url, id or name equals `item`
    fn fish_structure_definition(
        &self,
        item: &str,
        types: &[FhirType],
    ) -> Option<&StructureDefinition>;

    /// Find a profile (a constraint that is not an extension)
    fn fish_profile(&self, item: &str) -> Option<&StructureDefinition> {
        self.fish_structure_definition(item, &[FhirType::Profile])
    }
}

/// The primary definitions of an IG plus its external dependencies
#[derive(Clone, Copy)]
pub struct DefinitionSources<'a> {
    primary: &'a dyn Fishable,
    external: &'a dyn Fishable,
}

impl<'a> DefinitionSources<'a> {
    pub fn new(primary: &'a dyn Fishable, external: &'a dyn Fishable) -> Self {
        Self { primary, external }
    }

    /// Look in the IG first, then in its dependencies
    pub fn fish_everywhere(&self, item: &str) -> Option<&'a StructureDefinition> {
        trace!("Fishing everywhere for {}", item);
        self.primary
            .fish_structure_definition(item, &[])
            .or_else(|| self.external.fish_structure_definition(item, &[]))
    }

    /// Look for a profile in the IG, then for any definition in its dependencies
    pub fn fish_for_profile(&self, item: &str) -> Option<&'a StructureDefinition> {
        trace!("Fishing for profile {}", item);
        self.primary
            .fish_profile(item)
            .or_else(|| self.external.fish_structure_definition(item, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Derivation, StructureDefinition};

    fn profile() -> StructureDefinition {
        StructureDefinition {
            url: "http://example.org/StructureDefinition/p".to_string(),
            name: "P".to_string(),
            derivation: Some(Derivation::Constraint),
            type_: Some("Patient".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_filters() {
        let sd = profile();
        assert!(FhirType::Profile.matches(&sd));
        assert!(!FhirType::Extension.matches(&sd));
        assert!(FhirType::matches_any(&[], &sd));
        assert!(!FhirType::matches_any(&[FhirType::Extension], &sd));
    }
}

//! Profile id → group name mapping

use super::ig_config::IgConfiguration;
use indexmap::IndexMap;

/// Group of every profile that is not listed in a resource group
pub const DEFAULT_GROUP: &str = "Default";

const PROFILE_REFERENCE_PREFIX: &str = "StructureDefinition/";
const PROFILES_LABEL_PREFIX: &str = "Profiles: ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileGroups {
    groups: IndexMap<String, String>,
}

impl ProfileGroups {
    /// Collect `StructureDefinition/<id>` references from the IG's resource groups
    pub fn from_config(config: &IgConfiguration) -> Self {
        let mut groups = IndexMap::new();
        for group in &config.groups {
            let name = group
                .name
                .strip_prefix(PROFILES_LABEL_PREFIX)
                .unwrap_or(&group.name);
            for resource in &group.resources {
                if let Some(id) = resource.strip_prefix(PROFILE_REFERENCE_PREFIX) {
                    groups.insert(id.to_string(), name.to_string());
                }
            }
        }
        Self { groups }
    }

    pub fn group_for(&self, profile_id: &str) -> &str {
        self.groups
            .get(profile_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_GROUP)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

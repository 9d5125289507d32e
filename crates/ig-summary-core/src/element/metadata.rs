//! Context threaded through element resolution

use crate::models::Binding;
use serde::{Deserialize, Serialize};

/// Where an element comes from and how its rows are labelled
///
/// Passed by value into each resolution; extension resolution hands a modified
/// copy to the extension's own elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMetadata {
    pub profile_title: String,
    pub profile_group: String,
    /// Resource type (or root element id) stripped from element names
    pub base_resource_type: String,
    /// URL of the profile the rows are reported under
    pub source_profile_uri: String,
    /// URL of the definition that actually declares the element
    pub element_structure_definition_uri: String,
    /// Id of the element this one was expanded from, for display only
    pub sub_element_of: Option<String>,
}

impl ElementMetadata {
    /// Metadata for an element declared directly by a profile
    pub fn for_profile(
        profile_title: impl Into<String>,
        profile_group: impl Into<String>,
        base_resource_type: impl Into<String>,
        profile_uri: impl Into<String>,
    ) -> Self {
        let profile_uri = profile_uri.into();
        Self {
            profile_title: profile_title.into(),
            profile_group: profile_group.into(),
            base_resource_type: base_resource_type.into(),
            source_profile_uri: profile_uri.clone(),
            element_structure_definition_uri: profile_uri,
            sub_element_of: None,
        }
    }
}

/// Value set URI and binding strength shown for an element
///
/// Both fields are empty when the element is not bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetBinding {
    pub uri: String,
    pub binding: String,
}

impl ValueSetBinding {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_binding(binding: &Binding) -> Self {
        Self {
            uri: binding.value_set.clone().unwrap_or_default(),
            binding: binding.strength.to_string(),
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.binding.is_empty()
    }
}

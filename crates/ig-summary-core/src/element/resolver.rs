//! Element resolution
//!
//! [`ProfileElement::resolve`] turns one element of a profile snapshot into a
//! resolved element: display name, data type, value set binding and, for
//! backbone and extension elements, the nested elements that are reported
//! with it. [`ProfileElement::to_rows`] flattens the result into data
//! dictionary rows.
//!
//! Three variants exist. The first entry of [`ElementKind::DISPATCH`] whose
//! predicate accepts the element decides which one applies:
//!
//! | Kind        | Predicate                         |
//! |-------------|-----------------------------------|
//! | `Extension` | a type code is `Extension`        |
//! | `Backbone`  | a type code is `BackboneElement`  |
//! | `Plain`     | always                            |

use super::extension::resolve_extension;
use super::metadata::{ElementMetadata, ValueSetBinding};
use super::naming::{humanize, join_with_or, last_path_item};
use super::policy;
use super::row::DataElementRow;
use super::tree::ElementTree;
use crate::config::{DataDictionaryMode, DataDictionarySettings};
use crate::error::IgSummaryError;
use crate::fishable::DefinitionSources;
use crate::models::{ElementDefinition, StructureDefinition, TypeRef};
use crate::result::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static NESTED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+\.[A-Za-z.]+\.[A-Za-z]+").expect("valid regex"));

static NESTED_PATH_PARENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+\.([A-Za-z.]+)\.[A-Za-z]+").expect("valid regex"));

/// Everything resolution reads besides the element itself
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub definitions: DefinitionSources<'a>,
    pub settings: &'a DataDictionarySettings,
}

impl<'a> ResolveContext<'a> {
    pub fn new(definitions: DefinitionSources<'a>, settings: &'a DataDictionarySettings) -> Self {
        Self {
            definitions,
            settings,
        }
    }
}

/// Resolution variant of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Extension,
    Backbone,
    Plain,
}

fn is_extension_element(elem: &ElementDefinition) -> bool {
    elem.has_type("Extension")
}

fn is_backbone_element(elem: &ElementDefinition) -> bool {
    elem.has_type("BackboneElement")
}

fn is_any_element(_: &ElementDefinition) -> bool {
    true
}

impl ElementKind {
    /// Candidate variants in priority order
    pub const DISPATCH: [(ElementKind, fn(&ElementDefinition) -> bool); 3] = [
        (ElementKind::Extension, is_extension_element),
        (ElementKind::Backbone, is_backbone_element),
        (ElementKind::Plain, is_any_element),
    ];

    pub fn of(elem: &ElementDefinition) -> Result<Self> {
        Self::DISPATCH
            .iter()
            .find(|(_, accepts)| accepts(elem))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| {
                IgSummaryError::resolution_error(&elem.id, "no element variant accepts it")
            })
    }
}

/// A fully resolved element
#[derive(Clone)]
pub struct ProfileElement<'a> {
    pub(super) elem: &'a ElementDefinition,
    pub(super) metadata: ElementMetadata,
    pub(super) kind: ElementKind,
    pub(super) ctx: ResolveContext<'a>,
    /// Definition the sibling lookups run against
    pub(super) structure: &'a StructureDefinition,
    pub(super) elem_name: String,
    pub(super) elem_type: String,
    pub(super) value_set: ValueSetBinding,
    pub(super) sub_elements: Vec<ProfileElement<'a>>,
    /// Backbone slice whose binding is already shown on its `value[x]` row
    pub(super) repeats_value_binding: bool,
}

impl<'a> ProfileElement<'a> {
    pub fn resolve(
        elem: &'a ElementDefinition,
        metadata: ElementMetadata,
        ctx: ResolveContext<'a>,
    ) -> Result<Self> {
        match &metadata.sub_element_of {
            Some(parent) => debug!("Processing {} (sub-element of {parent})", elem.id),
            None => debug!("Processing {}", elem.id),
        }

        let kind = ElementKind::of(elem)?;
        let structure = locate_structure(kind, elem, &metadata, ctx)?;
        let tree = ElementTree::snapshot(structure);
        let elem_name = element_name(elem, &metadata, &tree, ctx.settings)?;

        let mut element = Self {
            elem,
            metadata,
            kind,
            ctx,
            structure,
            elem_name,
            elem_type: String::new(),
            value_set: ValueSetBinding::none(),
            sub_elements: Vec::new(),
            repeats_value_binding: false,
        };

        match kind {
            ElementKind::Plain => {
                element.elem_type = element_type(elem, ctx);
                element.value_set = element_value_set(elem, &tree);
            }
            ElementKind::Backbone => match policy::backbone_value_element(elem, &tree) {
                Some(value_x) => {
                    let value = Self::resolve(value_x, element.metadata.clone(), ctx)?;
                    element.elem_type = value.elem_type;
                    element.value_set = value.value_set;
                }
                None => {
                    element.elem_type = element_type(elem, ctx);
                    element.value_set = element_value_set(elem, &tree);
                }
            },
            ElementKind::Extension => {
                let resolved = resolve_extension(&element, &tree)?;
                element.elem_type = resolved.elem_type;
                element.value_set = resolved.value_set;
                element.sub_elements = resolved.sub_elements;
            }
        }

        element.repeats_value_binding =
            policy::backbone_value_duplicates_binding(elem, &element.value_set, &tree)?;

        Ok(element)
    }

    pub fn element(&self) -> &'a ElementDefinition {
        self.elem
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn metadata(&self) -> &ElementMetadata {
        &self.metadata
    }

    pub fn elem_name(&self) -> &str {
        &self.elem_name
    }

    pub fn elem_type(&self) -> &str {
        &self.elem_type
    }

    pub fn value_set(&self) -> &ValueSetBinding {
        &self.value_set
    }

    pub fn sub_elements(&self) -> &[ProfileElement<'a>] {
        &self.sub_elements
    }

    /// `Required`, `Required if known` or empty, with a condition when nested
    pub fn required(&self) -> String {
        let path = &self.elem.path;
        let conditional = if NESTED_PATH.is_match(path) {
            let parent = NESTED_PATH_PARENT.replacen(path, 1, "$1");
            format!(
                " (conditional on {})",
                humanize(&parent, &self.ctx.settings.touch_up_humanized_element_names)
            )
        } else {
            String::new()
        };

        if self.elem.min == Some(1) {
            format!("Required{conditional}")
        } else if self.elem.is_must_support() && self.elem.min == Some(0) {
            format!("Required if known{conditional}")
        } else {
            String::new()
        }
    }

    pub fn occurrences(&self) -> String {
        match (self.elem.min, self.elem.max.as_deref()) {
            (_, Some("1")) => "Single".to_string(),
            (Some(0), Some("0")) => "None".to_string(),
            (_, Some("*")) => "Multiple".to_string(),
            (_, Some(max)) if max != "0" => max.to_string(),
            _ => String::new(),
        }
    }

    /// Rows for this element followed by the rows of its sub-elements
    pub fn to_rows(&self) -> Vec<DataElementRow> {
        self.rows_for_source(&self.metadata.source_profile_uri)
    }

    /// Rows reported under `source_profile_uri`, which nested elements inherit from their parent
    fn rows_for_source(&self, source_profile_uri: &str) -> Vec<DataElementRow> {
        let settings = self.ctx.settings;
        let tree = ElementTree::snapshot(self.structure);

        let mut required = self.required();
        if let Some((system, code)) = self.elem.fixed_coding() {
            if settings.suppress_fixed_codes {
                return Vec::new();
            }
            if !required.is_empty() {
                required.push(' ');
            }
            required.push_str(&format!("[Fixed to {system}#{code}]"));
        }

        if settings.mode == DataDictionaryMode::MustSupport {
            if policy::must_support_slices_replace_parent(self.elem, &tree) {
                return Vec::new();
            }
            if self.repeats_value_binding {
                return Vec::new();
            }
        }

        let fhir_element = match &self.elem.slice_name {
            Some(slice) if policy::is_collapsible_value_x_slice(self.elem, &tree) => {
                self.elem.id.replacen(&format!(":{slice}"), "", 1)
            }
            _ => self.elem.id.clone(),
        };

        let mut rows = vec![DataElementRow {
            group: self.metadata.profile_group.clone(),
            profile_title: self.metadata.profile_title.clone(),
            data_element_name: self.elem_name.clone(),
            definition: self.elem.definition.clone().unwrap_or_default(),
            required,
            occurrences_allowed: self.occurrences(),
            data_type: self.elem_type.clone(),
            value_set_uri: self.value_set.uri.clone(),
            value_set_binding: self.value_set.binding.clone(),
            fhir_element,
            source_profile_uri: source_profile_uri.to_string(),
            element_structure_definition_uri: self
                .metadata
                .element_structure_definition_uri
                .clone(),
            used_by_measure: None,
            extra: Default::default(),
        }];

        for sub in &self.sub_elements {
            rows.extend(sub.rows_for_source(source_profile_uri));
        }
        rows
    }
}

/// Extensions are looked up in their own definition, everything else in the source profile
fn locate_structure<'a>(
    kind: ElementKind,
    elem: &'a ElementDefinition,
    metadata: &ElementMetadata,
    ctx: ResolveContext<'a>,
) -> Result<&'a StructureDefinition> {
    let (identifier, what) = match kind {
        ElementKind::Extension => (
            elem.first_type_profile()
                .unwrap_or(&metadata.element_structure_definition_uri),
            "extension definition",
        ),
        ElementKind::Backbone | ElementKind::Plain => {
            (metadata.source_profile_uri.as_str(), "source profile")
        }
    };

    ctx.definitions.fish_everywhere(identifier).ok_or_else(|| {
        IgSummaryError::definition_not_found(
            identifier,
            format!("{what} of {} in {}", elem.path, metadata.profile_title),
        )
    })
}

/// Display name: path without profile and resource prefixes, slices spliced in, humanized
pub(super) fn element_name(
    elem: &ElementDefinition,
    metadata: &ElementMetadata,
    tree: &ElementTree<'_>,
    settings: &DataDictionarySettings,
) -> Result<String> {
    let mut name = elem.path.clone();
    for prefix in [&metadata.profile_title, &metadata.base_resource_type] {
        if !prefix.is_empty() {
            name = name.replacen(&format!("{prefix}."), "", 1);
        }
    }

    match &elem.slice_name {
        Some(slice) => {
            if name == "extension" {
                name = slice.clone();
            } else if !policy::is_collapsible_value_x_slice(elem, tree) {
                name = format!("{name} > {slice}");
            }
            if elem.path.ends_with("extension") {
                name = name.replacen(".extension", "", 1);
            }
        }
        None => {
            // Children of a slice carry the slice only in their id
            let last = last_path_item(&elem.path);
            let pattern = Regex::new(&format!(r":([a-zA-Z]+)\.{}", regex::escape(&last)))
                .map_err(|e| IgSummaryError::internal_error(e.to_string()))?;
            if let Some(captures) = pattern.captures(&elem.id) {
                name = name.replacen(&last, &format!("{}.{last}", &captures[1]), 1);
            }
        }
    }

    Ok(humanize(&name, &settings.touch_up_humanized_element_names))
}

pub(super) fn element_type(elem: &ElementDefinition, ctx: ResolveContext<'_>) -> String {
    let Some(types) = &elem.type_ else {
        return "n/a".to_string();
    };

    let labels: Vec<String> = types
        .iter()
        .map(|t| {
            if t.code == "Reference" {
                reference_type(t, ctx)
            } else {
                t.code.clone()
            }
        })
        .collect();

    match labels.as_slice() {
        [single] => single.clone(),
        _ if policy::is_any_type_set(&labels) => "Any".to_string(),
        [] => "Polymorphic with no defined types".to_string(),
        _ => join_with_or(&labels),
    }
}

/// `Reference: Patient or Group`, with target names from the definitions
fn reference_type(reference: &TypeRef, ctx: ResolveContext<'_>) -> String {
    let targets = match &reference.target_profile {
        Some(targets) if !targets.is_empty() => targets,
        _ => return "Reference: Any".to_string(),
    };

    let names: Vec<&str> = targets
        .iter()
        .map(|target| {
            ctx.definitions
                .fish_for_profile(target)
                .map(|sd| sd.name.as_str())
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown")
        })
        .collect();

    format!("Reference: {}", join_with_or(&names))
}

pub(super) fn element_value_set(elem: &ElementDefinition, tree: &ElementTree<'_>) -> ValueSetBinding {
    if let Some(binding) = policy::sibling_slice_binding(elem, tree) {
        return ValueSetBinding::from_binding(binding);
    }

    match &elem.binding {
        Some(binding) if elem.bound_value_set().is_some() && policy::has_coded_type(elem) => {
            ValueSetBinding::from_binding(binding)
        }
        _ => ValueSetBinding::none(),
    }
}

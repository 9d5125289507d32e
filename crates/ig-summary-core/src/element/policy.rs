//! Heuristics tuned to common IG authoring patterns
//!
//! None of these are FHIR rules. Each one recognizes a shape that profile
//! authoring tools produce and decides how the data dictionary presents it.
//! They are kept as separate functions so a new pattern can be added without
//! touching the others.

use super::metadata::ValueSetBinding;
use super::tree::ElementTree;
use crate::models::{Binding, ElementDefinition, StructureDefinition};
use crate::result::Result;
use tracing::{error, warn};

/// Type codes that make a binding worth showing
const CODED_TYPES: [&str; 3] = ["codeableconcept", "code", "coding"];

/// Type set that FHIR documents as "Any" for Observation.value[x]-like elements
pub const ANY_TYPES: [&str; 11] = [
    "Quantity",
    "CodeableConcept",
    "string",
    "boolean",
    "integer",
    "Range",
    "Ratio",
    "SampledData",
    "time",
    "dateTime",
    "Period",
];

/// Whether the type codes are exactly [`ANY_TYPES`], in any order
pub fn is_any_type_set<S: AsRef<str>>(codes: &[S]) -> bool {
    codes.len() == ANY_TYPES.len()
        && ANY_TYPES
            .iter()
            .all(|any| codes.iter().any(|code| code.as_ref() == *any))
}

pub fn has_coded_type(elem: &ElementDefinition) -> bool {
    elem.type_codes()
        .iter()
        .any(|code| CODED_TYPES.contains(&code.to_lowercase().as_str()))
}

/// A `value[x]` slice that is the only slice of `value[x]`
///
/// Equivalent to constraining the type of `value[x]` directly, so rows show
/// the unsliced path and name.
pub fn is_collapsible_value_x_slice(elem: &ElementDefinition, tree: &ElementTree<'_>) -> bool {
    if !elem.path.ends_with("value[x]") || elem.slice_name.is_none() {
        return false;
    }
    tree.with_prefix(&format!("{}:", elem.id_without_slice())).len() == 1
}

/// Binding of the first bound slice of an unbound `value[x]`
///
/// Produced by FSH such as `* value[x] only CodeableConcept` followed by
/// `* valueCodeableConcept from SomeVS (required)`.
pub fn sibling_slice_binding<'a>(
    elem: &ElementDefinition,
    tree: &ElementTree<'a>,
) -> Option<&'a Binding> {
    if !elem.path.ends_with("value[x]") || elem.binding.is_some() {
        return None;
    }
    tree.with_prefix(&elem.id)
        .into_iter()
        .find_map(|slice| slice.binding.as_ref())
}

/// In must-support mode a sliced element whose named slices are all MS is
/// represented by the slices alone
pub fn must_support_slices_replace_parent(
    elem: &ElementDefinition,
    tree: &ElementTree<'_>,
) -> bool {
    if elem.slicing.is_none() {
        return false;
    }
    let slices = tree.with_prefix(&format!("{}:", elem.path));
    !slices.is_empty() && slices.iter().all(|slice| slice.is_must_support())
}

/// Polymorphic `value[x]` below a backbone element whose type and binding the
/// backbone shows as its own
pub fn backbone_value_element<'a>(
    elem: &ElementDefinition,
    tree: &ElementTree<'a>,
) -> Option<&'a ElementDefinition> {
    tree.with_prefix_and_suffix(&elem.id, "value[x]")
        .into_iter()
        .next()
}

/// A backbone slice whose bubbled-up binding repeats the binding of its MS `value[x]`
///
/// A slice is expected to hold a single `value[x]`; more than one is an error.
pub fn backbone_value_duplicates_binding(
    elem: &ElementDefinition,
    value_set: &ValueSetBinding,
    tree: &ElementTree<'_>,
) -> Result<bool> {
    if !elem.is_slice() || elem.first_type_code() != Some("BackboneElement") || !value_set.is_bound()
    {
        return Ok(false);
    }
    let value_x = tree.unique_with_prefix_and_suffix(&format!("{}.", elem.id), "value[x]")?;
    Ok(value_x.is_some_and(|value_x| value_x.binding.is_some() && value_x.is_must_support()))
}

/// Whether an extension carries a single value or nested extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionComplexity {
    Simple,
    Complex,
}

/// Classify an extension, first matching rule wins:
///
/// 1. `extension` is `0..0`: simple
/// 2. a slice with a required `value[x]` slice: simple
/// 3. not derived from another extension profile and the differential never
///    touches `extension`: simple
/// 4. otherwise complex
pub fn extension_complexity(
    elem: &ElementDefinition,
    name_root: &str,
    extension: &StructureDefinition,
    tree: &ElementTree<'_>,
    source_profile_uri: &str,
) -> ExtensionComplexity {
    let value_x = tree.by_id(&format!("{name_root}.value[x]"));
    let nested = tree.by_id(&format!("{name_root}.extension"));

    if nested.is_some_and(ElementDefinition::is_prohibited) {
        if value_x.is_some_and(ElementDefinition::is_prohibited) {
            error!(
                "{} in {} is an extension with 0..0 extensions and 0..0 values. This is likely an error in the IG.",
                elem.id, source_profile_uri
            );
        }
        return ExtensionComplexity::Simple;
    }

    let required_value = tree
        .with_prefix(&format!("{name_root}.value[x]"))
        .iter()
        .any(|e| e.min.unwrap_or(0) > 0);
    if elem.is_slice() && required_value {
        warn!(
            "{} is a slice with a required value[x], but child extensions are also allowed. Treating it as a simple extension.",
            elem.id
        );
        return ExtensionComplexity::Simple;
    }

    let differential = ElementTree::differential(extension);
    if !extension.derives_from_extension_profile()
        && !differential.any_with_prefix(&format!("{name_root}.extension"))
    {
        warn!(
            "{} does not require .value[x] or .extension and its differential leaves .extension alone. Treating it as a simple extension.",
            elem.id
        );
        return ExtensionComplexity::Simple;
    }

    ExtensionComplexity::Complex
}

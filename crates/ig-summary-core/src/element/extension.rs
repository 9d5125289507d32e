//! Extension elements
//!
//! An extension is shown as one row when it carries a single value (a
//! "simple" extension) and as a row followed by rows for its nested elements
//! when it is complex. A complex extension with a single bound sub-element,
//! and a simple extension with a single sub-element, fold that sub-element
//! into their own row.

use super::metadata::{ElementMetadata, ValueSetBinding};
use super::naming::join_with_or;
use super::policy::{self, ExtensionComplexity};
use super::resolver::ProfileElement;
use super::tree::ElementTree;
use crate::config::DataDictionaryMode;
use crate::error::IgSummaryError;
use crate::models::ElementDefinition;
use crate::result::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static VALUE_TYPE_SLICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"value\[x\]:value[A-Z][a-zA-Z0-9]+").expect("valid regex"));

/// Value elements that may carry the binding of a simple extension
const BOUND_VALUE_SUFFIXES: [&str; 3] = ["valueCoding", "valueCode", "valueCodeableConcept"];

pub(super) struct ExtensionResolution<'a> {
    pub elem_type: String,
    pub value_set: ValueSetBinding,
    pub sub_elements: Vec<ProfileElement<'a>>,
}

pub(super) fn resolve_extension<'a>(
    element: &ProfileElement<'a>,
    tree: &ElementTree<'a>,
) -> Result<ExtensionResolution<'a>> {
    let elem = element.elem;
    let metadata = &element.metadata;
    let ctx = element.ctx;
    let extension_profile = elem.first_type_profile();

    // Profiled extensions are searched from their own root
    let name_root = if extension_profile.is_some() {
        "Extension"
    } else {
        elem.id.as_str()
    };

    let sub_metadata = ElementMetadata {
        profile_title: metadata.profile_title.clone(),
        profile_group: metadata.profile_group.clone(),
        base_resource_type: tree.root().map(|root| root.id.clone()).unwrap_or_default(),
        source_profile_uri: metadata.source_profile_uri.clone(),
        element_structure_definition_uri: extension_profile
            .unwrap_or(&metadata.source_profile_uri)
            .to_string(),
        sub_element_of: Some(elem.id.clone()),
    };

    let complexity = policy::extension_complexity(
        elem,
        name_root,
        element.structure,
        tree,
        &metadata.source_profile_uri,
    );

    let mut resolution = match complexity {
        ExtensionComplexity::Simple => simple_extension(element, tree, name_root, &sub_metadata)?,
        ExtensionComplexity::Complex => ExtensionResolution {
            elem_type: format!("Extension: {}", element.structure.display_title()),
            value_set: ValueSetBinding::none(),
            sub_elements: Vec::new(),
        },
    };

    let include: fn(&ElementDefinition) -> bool = match ctx.settings.mode {
        DataDictionaryMode::MustSupport => |e: &ElementDefinition| e.is_must_support(),
        // Optional extension elements repeat what the host profile already shows
        DataDictionaryMode::All => |e: &ElementDefinition| e.min.unwrap_or(0) > 0,
    };
    let prefix = format!("{} > ", element.elem_name);
    for sub in tree.with_prefix(name_root).into_iter().filter(|e| include(e)) {
        let mut resolved = ProfileElement::resolve(sub, sub_metadata.clone(), ctx)?;
        if !resolved.elem_name.starts_with(&prefix) {
            resolved.elem_name = format!("{prefix}{}", resolved.elem_name);
        }
        resolution.sub_elements.push(resolved);
    }

    if let [only] = resolution.sub_elements.as_slice() {
        let collapse = complexity == ExtensionComplexity::Simple || only.value_set.is_bound();
        if collapse {
            if only.value_set.is_bound() {
                resolution.value_set = only.value_set.clone();
            }
            resolution.elem_type = only.elem_type.clone();
            resolution.sub_elements.clear();
        }
    }

    Ok(resolution)
}

fn simple_extension<'a>(
    element: &ProfileElement<'a>,
    tree: &ElementTree<'a>,
    name_root: &str,
    sub_metadata: &ElementMetadata,
) -> Result<ExtensionResolution<'a>> {
    let ctx = element.ctx;
    let value_x_id = format!("{name_root}.value[x]");

    let bound: Vec<&ElementDefinition> = tree
        .by_id(&value_x_id)
        .into_iter()
        .chain(
            BOUND_VALUE_SUFFIXES
                .iter()
                .flat_map(|suffix| tree.with_prefix_and_suffix(name_root, suffix)),
        )
        .filter(|e| e.binding.is_some())
        .collect();

    let value_set = if let [only] = bound.as_slice() {
        ProfileElement::resolve(*only, sub_metadata.clone(), ctx)?.value_set
    } else {
        host_profile_binding(element)?
    };

    let slice_types: Vec<&str> = tree
        .with_prefix(name_root)
        .into_iter()
        .filter(|e| VALUE_TYPE_SLICE.is_match(&e.id))
        .filter_map(|e| e.first_type_code())
        .collect();

    let elem_type = if !slice_types.is_empty() {
        join_with_or(&slice_types)
    } else {
        match tree.by_id(&value_x_id) {
            Some(value_x) if !value_x.type_codes().is_empty() => {
                ProfileElement::resolve(value_x, sub_metadata.clone(), ctx)?.elem_type
            }
            _ => "Extension (simple)".to_string(),
        }
    };

    Ok(ExtensionResolution {
        elem_type,
        value_set,
        sub_elements: Vec::new(),
    })
}

/// The host profile may bind `<extension>.value[x]` on its own slice
fn host_profile_binding(element: &ProfileElement<'_>) -> Result<ValueSetBinding> {
    let elem = element.elem;
    let source = &element.metadata.source_profile_uri;
    let host = element
        .ctx
        .definitions
        .fish_for_profile(source)
        .ok_or_else(|| {
            IgSummaryError::definition_not_found(
                source,
                format!("host profile of {}", elem.id),
            )
        })?;

    let prefix = format!("{}.value[x]", elem.id);
    let bound: Vec<&ElementDefinition> = host
        .snapshot_elements()
        .iter()
        .filter(|e| e.id.starts_with(&prefix) && e.binding.is_some())
        .collect();

    Ok(match bound.as_slice() {
        [only] => only
            .binding
            .as_ref()
            .map(ValueSetBinding::from_binding)
            .unwrap_or_default(),
        _ => ValueSetBinding::none(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataDictionarySettings;
    use crate::element::resolver::{ElementKind, ResolveContext};
    use crate::fishable::DefinitionSources;
    use crate::lake::DefinitionLake;
    use crate::models::{BindingStrength, StructureDefinition};
    use crate::test_helpers::{ElementBuilder, ProfileBuilder};
    use pretty_assertions::assert_eq;

    const HOST: &str = "http://example.org/StructureDefinition/cancer-condition";
    const STATUS_VS: &str = "http://example.org/ValueSet/status";
    const STAGE_VS: &str = "http://example.org/ValueSet/stage";
    const MARKER_VS: &str = "http://example.org/ValueSet/marker";
    const LATERALITY_VS: &str = "http://example.org/ValueSet/laterality";
    const HISTOLOGY_VS: &str = "http://example.org/ValueSet/histology";

    fn url(id: &str) -> String {
        format!("http://example.org/StructureDefinition/{id}")
    }

    fn host_slice(slice: &str, extension: &str) -> ElementDefinition {
        ElementBuilder::new(&format!("Condition.extension:{slice}"))
            .path("Condition.extension")
            .slice(slice)
            .cardinality(0, "1")
            .extension(&url(extension))
            .must_support()
            .build()
    }

    /// `Extension.extension:<slice>` of a complex extension and its `value[x]`
    fn nested(slice: &str, must_support: bool) -> ElementDefinition {
        let element = ElementBuilder::new(&format!("Extension.extension:{slice}"))
            .path("Extension.extension")
            .slice(slice)
            .cardinality(0, "1")
            .types(&["Extension"]);
        if must_support {
            element.must_support().build()
        } else {
            element.build()
        }
    }

    fn nested_value(slice: &str, code: &str) -> ElementBuilder {
        ElementBuilder::new(&format!("Extension.extension:{slice}.value[x]"))
            .path("Extension.extension.value[x]")
            .cardinality(0, "1")
            .types(&[code])
    }

    fn no_children() -> ElementDefinition {
        ElementBuilder::new("Extension.extension").cardinality(0, "0").build()
    }

    fn no_value() -> ElementDefinition {
        ElementBuilder::new("Extension.value[x]").cardinality(0, "0").build()
    }

    fn extension(id: &str, title: &str, snapshot: Vec<ElementDefinition>) -> ProfileBuilder {
        let mut elements = vec![ElementBuilder::new("Extension").build()];
        elements.extend(snapshot);
        ProfileBuilder::new(id, "Extension")
            .title(title)
            .snapshot(elements)
    }

    fn lake() -> DefinitionLake {
        let mut lake = DefinitionLake::new();
        lake.add_structure_definition(
            ProfileBuilder::new("cancer-condition", "Condition")
                .title("Cancer Condition")
                .snapshot(vec![
                    ElementBuilder::new("Condition").build(),
                    ElementBuilder::new("Condition.extension").cardinality(0, "*").build(),
                    host_slice("diseaseStatus", "disease-status"),
                    host_slice("statusDetail", "disease-status-detail"),
                    host_slice("tumorMarker", "tumor-marker"),
                    host_slice("tumorSize", "tumor-size"),
                    host_slice("broken", "broken"),
                    host_slice("laterality", "laterality"),
                    host_slice("histology", "histology"),
                    ElementBuilder::new("Condition.extension:histology.value[x]")
                        .path("Condition.extension.value[x]")
                        .types(&["CodeableConcept"])
                        .binding(HISTOLOGY_VS, BindingStrength::Required)
                        .build(),
                ])
                .build(),
        );

        // Single bound value
        lake.add_structure_definition(
            extension(
                "disease-status",
                "Disease Status",
                vec![
                    no_children(),
                    ElementBuilder::new("Extension.url").cardinality(1, "1").types(&["uri"]).build(),
                    ElementBuilder::new("Extension.value[x]")
                        .cardinality(0, "1")
                        .types(&["CodeableConcept"])
                        .binding(STATUS_VS, BindingStrength::Required)
                        .must_support()
                        .build(),
                ],
            )
            .build(),
        );

        // Two nested extensions
        lake.add_structure_definition(
            extension(
                "disease-status-detail",
                "Disease Status Detail",
                vec![
                    ElementBuilder::new("Extension.extension").cardinality(0, "*").build(),
                    nested("stage", true),
                    ElementBuilder::new("Extension.extension:stage.url")
                        .path("Extension.extension.url")
                        .types(&["uri"])
                        .build(),
                    nested_value("stage", "CodeableConcept")
                        .binding(STAGE_VS, BindingStrength::Required)
                        .must_support()
                        .build(),
                    nested("date", true),
                    nested_value("date", "dateTime").must_support().build(),
                    ElementBuilder::new("Extension.url").types(&["uri"]).build(),
                    no_value(),
                ],
            )
            .differential(vec![nested("stage", true), nested("date", true)])
            .build(),
        );

        // One must-support nested extension, bound
        lake.add_structure_definition(
            extension(
                "tumor-marker",
                "Tumor Marker",
                vec![
                    ElementBuilder::new("Extension.extension").cardinality(0, "*").build(),
                    nested("kind", true),
                    nested_value("kind", "CodeableConcept")
                        .binding(MARKER_VS, BindingStrength::Extensible)
                        .build(),
                    nested("note", false),
                    nested_value("note", "string").build(),
                    no_value(),
                ],
            )
            .differential(vec![nested("kind", true)])
            .build(),
        );

        // One must-support nested extension, unbound
        lake.add_structure_definition(
            extension(
                "tumor-size",
                "Tumor Size",
                vec![
                    ElementBuilder::new("Extension.extension").cardinality(0, "*").build(),
                    nested("size", true),
                    nested_value("size", "Quantity").build(),
                    no_value(),
                ],
            )
            .differential(vec![nested("size", true)])
            .build(),
        );

        // Neither children nor a value
        lake.add_structure_definition(
            extension("broken", "Broken", vec![no_children(), no_value()]).build(),
        );

        // Children allowed, but the value slice is required
        lake.add_structure_definition(
            extension(
                "laterality",
                "Laterality",
                vec![
                    ElementBuilder::new("Extension.extension").cardinality(0, "*").build(),
                    ElementBuilder::new("Extension.value[x]")
                        .cardinality(0, "1")
                        .types(&["CodeableConcept"])
                        .build(),
                    ElementBuilder::new("Extension.value[x]:valueCodeableConcept")
                        .path("Extension.value[x]")
                        .slice("valueCodeableConcept")
                        .cardinality(1, "1")
                        .types(&["CodeableConcept"])
                        .binding(LATERALITY_VS, BindingStrength::Required)
                        .build(),
                ],
            )
            .differential(vec![
                ElementBuilder::new("Extension.extension").cardinality(0, "*").build(),
            ])
            .build(),
        );

        // Unbound value, bound by the host profile's slice
        lake.add_structure_definition(
            extension(
                "histology",
                "Histology",
                vec![
                    no_children(),
                    ElementBuilder::new("Extension.value[x]")
                        .cardinality(0, "1")
                        .types(&["CodeableConcept"])
                        .build(),
                ],
            )
            .build(),
        );

        lake
    }

    fn resolve<'a>(
        lake: &'a DefinitionLake,
        empty: &'a DefinitionLake,
        settings: &'a DataDictionarySettings,
        slice: &str,
    ) -> ProfileElement<'a> {
        let host = lake.get_structure_definition(HOST).unwrap();
        let id = format!("Condition.extension:{slice}");
        let elem = host.snapshot_elements().iter().find(|e| e.id == id).unwrap();
        let metadata =
            ElementMetadata::for_profile(host.display_title(), "Default", "Condition", HOST);
        let ctx = ResolveContext::new(DefinitionSources::new(lake, empty), settings);
        ProfileElement::resolve(elem, metadata, ctx).unwrap()
    }

    fn columns(element: &ProfileElement<'_>) -> Vec<(String, String, String)> {
        element
            .to_rows()
            .into_iter()
            .map(|row| (row.data_element_name, row.data_type, row.value_set_uri))
            .collect()
    }

    fn row(name: &str, data_type: &str, value_set: &str) -> (String, String, String) {
        (name.to_string(), data_type.to_string(), value_set.to_string())
    }

    fn complexity_of(lake: &DefinitionLake, extension: &str, elem: &ElementDefinition) -> ExtensionComplexity {
        let sd: &StructureDefinition = lake.get_structure_definition(&url(extension)).unwrap();
        let tree = ElementTree::snapshot(sd);
        policy::extension_complexity(elem, "Extension", sd, &tree, HOST)
    }

    #[test]
    fn test_simple_bound_extension_is_one_row() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();
        let element = resolve(&lake, &empty, &settings, "diseaseStatus");

        assert_eq!(element.kind(), ElementKind::Extension);
        assert!(element.sub_elements().is_empty());
        assert_eq!(element.value_set().binding, "required");
        assert_eq!(
            columns(&element),
            vec![row("Disease Status", "CodeableConcept", STATUS_VS)]
        );

        let rows = element.to_rows();
        assert_eq!(rows[0].fhir_element, "Condition.extension:diseaseStatus");
        assert_eq!(rows[0].required, "Required if known");
        assert_eq!(rows[0].element_structure_definition_uri, HOST);
    }

    #[test]
    fn test_complex_extension_lists_its_nested_elements() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();
        let element = resolve(&lake, &empty, &settings, "statusDetail");

        assert_eq!(
            columns(&element),
            vec![
                row("Status Detail", "Extension: Disease Status Detail", ""),
                row("Status Detail > Stage", "CodeableConcept", STAGE_VS),
                row("Status Detail > Extension > Stage > Value", "CodeableConcept", STAGE_VS),
                row("Status Detail > Date", "dateTime", ""),
                row("Status Detail > Extension > Date > Value", "dateTime", ""),
            ]
        );

        let rows = element.to_rows();
        assert!(rows.iter().all(|r| r.source_profile_uri == HOST));
        assert_eq!(rows[0].element_structure_definition_uri, HOST);
        assert!(
            rows[1..]
                .iter()
                .all(|r| r.element_structure_definition_uri == url("disease-status-detail"))
        );
        assert_eq!(rows[1].fhir_element, "Extension.extension:stage");
    }

    #[test]
    fn test_complex_extension_with_single_bound_element_collapses() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();
        let element = resolve(&lake, &empty, &settings, "tumorMarker");

        assert!(element.sub_elements().is_empty());
        assert_eq!(element.value_set().binding, "extensible");
        assert_eq!(
            columns(&element),
            vec![row("Tumor Marker", "CodeableConcept", MARKER_VS)]
        );
    }

    #[test]
    fn test_complex_extension_with_single_unbound_element_keeps_it() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();
        let element = resolve(&lake, &empty, &settings, "tumorSize");

        assert_eq!(
            columns(&element),
            vec![
                row("Tumor Size", "Extension: Tumor Size", ""),
                row("Tumor Size > Size", "Quantity", ""),
            ]
        );
    }

    #[test]
    fn test_extension_without_children_or_value_is_simple() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();

        let host = lake.get_structure_definition(HOST).unwrap();
        let elem = &host.snapshot_elements()[6];
        assert_eq!(elem.id, "Condition.extension:broken");
        assert_eq!(complexity_of(&lake, "broken", elem), ExtensionComplexity::Simple);

        let element = resolve(&lake, &empty, &settings, "broken");
        assert_eq!(columns(&element), vec![row("Broken", "Extension (simple)", "")]);
    }

    #[test]
    fn test_slice_with_required_value_is_simple() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();

        let slice = host_slice("laterality", "laterality");
        assert_eq!(complexity_of(&lake, "laterality", &slice), ExtensionComplexity::Simple);

        // The same extension used without a slice falls through to the differential check
        let unsliced = ElementBuilder::new("Condition.extension")
            .extension(&url("laterality"))
            .build();
        assert_eq!(complexity_of(&lake, "laterality", &unsliced), ExtensionComplexity::Complex);

        let element = resolve(&lake, &empty, &settings, "laterality");
        assert_eq!(
            columns(&element),
            vec![row("Laterality", "CodeableConcept", LATERALITY_VS)]
        );
    }

    #[test]
    fn test_value_set_from_host_profile_slice() {
        let (lake, empty) = (lake(), DefinitionLake::new());
        let settings = DataDictionarySettings::default();
        let element = resolve(&lake, &empty, &settings, "histology");

        assert_eq!(
            columns(&element),
            vec![row("Histology", "CodeableConcept", HISTOLOGY_VS)]
        );
        assert_eq!(element.value_set().binding, "required");
    }
}

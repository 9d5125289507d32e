//! Summary assembly over definitions loaded from disk

use ig_summary_core::config::{
    DataDictionaryMode, DataDictionarySettings, IgConfiguration, ResolutionFailurePolicy,
};
use ig_summary_core::{DefinitionLake, DefinitionLoader, SummaryAssembler, dictionary_workbook};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CANON: &str = "http://example.org/fhir/cancer";

fn write_resource(dir: &Path, name: &str, resource: Value) {
    fs::write(
        dir.join(format!("{name}.json")),
        serde_json::to_string_pretty(&resource).unwrap(),
    )
    .unwrap();
}

fn cancer_patient() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "cancer-patient",
        "url": format!("{CANON}/StructureDefinition/cancer-patient"),
        "name": "CancerPatient",
        "title": "Cancer Patient",
        "description": "A patient with cancer",
        "status": "active",
        "kind": "resource",
        "abstract": false,
        "type": "Patient",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Patient",
        "derivation": "constraint",
        "snapshot": {
            "element": [
                { "id": "Patient", "path": "Patient", "min": 0, "max": "*" },
                {
                    "id": "Patient.name",
                    "path": "Patient.name",
                    "min": 1,
                    "max": "*",
                    "type": [{ "code": "HumanName" }],
                    "mustSupport": true,
                    "definition": "A name associated with the patient."
                },
                {
                    "id": "Patient.gender",
                    "path": "Patient.gender",
                    "min": 0,
                    "max": "1",
                    "type": [{ "code": "code" }],
                    "mustSupport": true,
                    "binding": {
                        "strength": "required",
                        "valueSet": format!("{CANON}/ValueSet/gender")
                    },
                    "extension": [{
                        "url": format!("{CANON}/StructureDefinition/used-by-measure"),
                        "valueBoolean": true
                    }]
                },
                {
                    "id": "Patient.birthDate",
                    "path": "Patient.birthDate",
                    "min": 0,
                    "max": "1",
                    "type": [{ "code": "date" }]
                }
            ]
        }
    })
}

/// A profile whose extension definition is not available anywhere
fn broken_observation() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "broken-observation",
        "url": format!("{CANON}/StructureDefinition/broken-observation"),
        "name": "BrokenObservation",
        "title": "Broken Observation",
        "status": "active",
        "kind": "resource",
        "abstract": false,
        "type": "Observation",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Observation",
        "derivation": "constraint",
        "snapshot": {
            "element": [
                { "id": "Observation", "path": "Observation" },
                {
                    "id": "Observation.extension:missing",
                    "path": "Observation.extension",
                    "sliceName": "missing",
                    "min": 0,
                    "max": "1",
                    "type": [{
                        "code": "Extension",
                        "profile": [format!("{CANON}/StructureDefinition/not-published")]
                    }],
                    "mustSupport": true
                }
            ]
        }
    })
}

fn gender_value_set() -> Value {
    json!({
        "resourceType": "ValueSet",
        "id": "gender",
        "url": format!("{CANON}/ValueSet/gender"),
        "name": "GenderVS",
        "title": "Gender Value Set",
        "status": "active",
        "compose": {
            "include": [{
                "system": "http://hl7.org/fhir/administrative-gender",
                "concept": [
                    { "code": "male", "display": "Male" },
                    { "code": "female", "display": "Female" }
                ]
            }]
        }
    })
}

fn disease_extension() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "disease-status",
        "url": format!("{CANON}/StructureDefinition/disease-status"),
        "name": "DiseaseStatus",
        "title": "Disease Status",
        "status": "active",
        "kind": "complex-type",
        "abstract": false,
        "type": "Extension",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Extension",
        "derivation": "constraint"
    })
}

fn stage_code_system() -> Value {
    json!({
        "resourceType": "CodeSystem",
        "id": "stage",
        "url": format!("{CANON}/CodeSystem/stage"),
        "name": "StageCS",
        "title": "Stage Codes",
        "status": "active",
        "content": "complete"
    })
}

fn load(resources: Vec<(&str, Value)>) -> DefinitionLake {
    let dir = TempDir::new().unwrap();
    for (name, resource) in resources {
        write_resource(dir.path(), name, resource);
    }
    let mut lake = DefinitionLake::new();
    let stats = DefinitionLoader::new()
        .load_into_lake(dir.path(), &mut lake)
        .unwrap();
    assert_eq!(stats.errors, 0);
    lake
}

fn full_lake() -> DefinitionLake {
    load(vec![
        ("StructureDefinition-cancer-patient", cancer_patient()),
        ("ValueSet-gender", gender_value_set()),
        ("StructureDefinition-disease-status", disease_extension()),
        ("CodeSystem-stage", stage_code_system()),
    ])
}

fn ig_config() -> IgConfiguration {
    IgConfiguration {
        id: "example.fhir.cancer".to_string(),
        canonical: CANON.to_string(),
        name: Some("CancerIG".to_string()),
        title: Some("Cancer IG".to_string()),
        version: Some("1.0.0".to_string()),
        status: Some("active".to_string()),
        fhir_version: vec!["4.0.1".to_string()],
        ..Default::default()
    }
}

#[test]
fn test_must_support_dictionary() {
    let lake = full_lake();
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings::default();
    let config = ig_config();

    let doc = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap();

    assert_eq!(doc.metadata.title, "Cancer IG");
    assert_eq!(doc.metadata.version, "1.0.0");
    assert_eq!(doc.profiles.len(), 1);
    assert_eq!(doc.profiles[0].group.as_deref(), Some("Default"));
    assert_eq!(doc.extensions.len(), 1);
    assert_eq!(doc.extensions[0].title, "Disease Status");
    assert_eq!(doc.code_systems.len(), 1);
    assert_eq!(doc.value_sets.len(), 1);

    let elements: Vec<&str> = doc
        .profile_elements
        .iter()
        .map(|row| row.fhir_element.as_str())
        .collect();
    assert_eq!(elements, vec!["Patient.name", "Patient.gender"]);

    let name = &doc.profile_elements[0];
    assert_eq!(name.data_element_name, "Name");
    assert_eq!(name.required, "Required");
    assert_eq!(name.occurrences_allowed, "Multiple");
    assert_eq!(name.data_type, "HumanName");
    assert_eq!(name.used_by_measure, None);

    let gender = &doc.profile_elements[1];
    assert_eq!(gender.required, "Required if known");
    assert_eq!(gender.value_set_uri, format!("{CANON}/ValueSet/gender"));
    assert_eq!(gender.used_by_measure.as_deref(), Some("true"));

    let codes: Vec<Option<&str>> = doc
        .value_set_elements
        .iter()
        .map(|row| row.code.as_deref())
        .collect();
    assert_eq!(codes, vec![Some("female"), Some("male")]);
}

#[test]
fn test_all_mode_includes_every_element() {
    let lake = full_lake();
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings {
        mode: DataDictionaryMode::All,
        ..Default::default()
    };
    let config = ig_config();

    let doc = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap();
    assert_eq!(doc.profile_elements.len(), 3);
    assert_eq!(doc.profile_elements[2].data_type, "date");
}

#[test]
fn test_excluded_elements_are_left_out() {
    let lake = full_lake();
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings {
        exclude_element: vec!["Patient.gender".to_string()],
        ..Default::default()
    };
    let config = ig_config();

    let doc = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap();
    assert_eq!(doc.profile_elements.len(), 1);
    assert_eq!(doc.profile_elements[0].fhir_element, "Patient.name");
}

#[test]
fn test_assembly_is_deterministic() {
    let lake = full_lake();
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings::default();
    let config = ig_config();
    let assembler = SummaryAssembler::new(&lake, &external, &settings, &config);

    let first = assembler.assemble().unwrap();
    let second = assembler.assemble().unwrap();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());

    let mut keys: Vec<String> = first.profile_elements.iter().map(|r| r.diff_key()).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_unresolvable_profile_aborts_by_default() {
    let lake = load(vec![
        ("StructureDefinition-cancer-patient", cancer_patient()),
        ("StructureDefinition-broken-observation", broken_observation()),
    ]);
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings::default();
    let config = ig_config();

    let err = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap_err();
    assert!(err.to_string().contains("not-published"));
}

#[test]
fn test_unresolvable_profile_can_be_skipped() {
    let lake = load(vec![
        ("StructureDefinition-cancer-patient", cancer_patient()),
        ("StructureDefinition-broken-observation", broken_observation()),
    ]);
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings {
        on_resolution_error: ResolutionFailurePolicy::SkipProfile,
        ..Default::default()
    };
    let config = ig_config();

    let doc = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap();
    assert_eq!(doc.profiles.len(), 2);
    assert!(
        doc.profile_elements
            .iter()
            .all(|row| row.profile_title == "Cancer Patient")
    );
}

#[test]
fn test_no_profiles_is_an_error() {
    let lake = load(vec![("ValueSet-gender", gender_value_set())]);
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings::default();
    let config = ig_config();

    let result = SummaryAssembler::new(&lake, &external, &settings, &config).assemble();
    assert!(result.is_err());
}

#[test]
fn test_dictionary_workbook_from_assembled_document() {
    let lake = full_lake();
    let external = DefinitionLake::new();
    let settings = DataDictionarySettings::default();
    let config = ig_config();
    let doc = SummaryAssembler::new(&lake, &external, &settings, &config)
        .assemble()
        .unwrap();

    let workbook = dictionary_workbook(&doc, &settings, &config);
    assert_eq!(
        workbook.sheet_names(),
        vec![
            "IG information",
            "Profiles",
            "Data elements",
            "Value sets",
            "Value set codes",
            "Extensions"
        ]
    );
    let info = workbook.sheet("IG information").unwrap();
    assert_eq!(info.rows[0].cells[2], "CancerIG");
    assert_eq!(workbook.sheet("Data elements").unwrap().data_rows().count(), 2);
}

//! Value set rows
//!
//! Each value set of the IG becomes a list of [`ValueSetRow`]s: one per
//! enumerated code, one per included value set, and one per code system for
//! filter based (intensional) membership.

use crate::config::{DataDictionarySettings, IncludedValueSets};
use crate::element::TabularRow;
use crate::models::{ValueSet, ValueSetFilter};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{error, warn};

/// Column names of the value set codes sheet
pub mod columns {
    pub const VALUE_SET_NAME: &str = "Value set name";
    pub const VALUE_SET_URI: &str = "Value set URI";
    pub const CODE_SYSTEM: &str = "Code system";
    pub const LOGICAL_DEFINITION: &str = "Logical definition";
    pub const CODE: &str = "Code";
    pub const CODE_DESCRIPTION: &str = "Code description";
}

/// Display name and canonical URL under which ICD-10-CM codes are compared without dots
pub const ICD_10_CM_NAME: &str = "ICD-10 CM";
pub const ICD_10_CM_URL: &str = "http://hl7.org/fhir/sid/icd-10-cm";

/// One code, included value set or logical definition of a value set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueSetRow {
    #[serde(rename = "Value set name")]
    pub value_set_name: String,
    #[serde(rename = "Value set URI")]
    pub value_set_uri: String,
    #[serde(rename = "Code system")]
    pub code_system: String,
    #[serde(rename = "Logical definition", skip_serializing_if = "Option::is_none")]
    pub logical_definition: Option<String>,
    #[serde(rename = "Code", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "Code description", skip_serializing_if = "Option::is_none")]
    pub code_description: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl ValueSetRow {
    fn code_row(vs: &ValueSet, code_system: &str, code: &str, description: Option<&str>) -> Self {
        Self {
            value_set_name: vs.display_title().to_string(),
            value_set_uri: vs.url.clone(),
            code_system: code_system.to_string(),
            code: Some(code.to_string()),
            code_description: description.map(str::to_string),
            ..Default::default()
        }
    }

    fn logic_row(vs: &ValueSet, code_system: &str, logic: String) -> Self {
        Self {
            value_set_name: vs.display_title().to_string(),
            value_set_uri: vs.url.clone(),
            code_system: code_system.to_string(),
            logical_definition: Some(logic),
            ..Default::default()
        }
    }

    pub fn is_icd_10_cm(&self) -> bool {
        self.code_system == ICD_10_CM_NAME || self.code_system == ICD_10_CM_URL
    }

    /// Code used for matching; ICD-10-CM codes lose their dots
    pub fn comparable_code(&self) -> Option<String> {
        let code = self.code.as_deref()?;
        Some(if self.is_icd_10_cm() {
            code.replace('.', "")
        } else {
            code.to_string()
        })
    }

    /// `<uri>>code=<code>` or `<uri>>logic=<definition>`
    pub fn lookup_key(&self, value_set_uri: &str) -> String {
        match self.comparable_code() {
            Some(code) => format!("{value_set_uri}>code={code}"),
            None => format!(
                "{value_set_uri}>logic={}",
                self.logical_definition.as_deref().unwrap_or_default()
            ),
        }
    }
}

impl TabularRow for ValueSetRow {
    fn get(&self, column: &str) -> Option<&str> {
        use columns::*;
        match column {
            VALUE_SET_NAME => Some(self.value_set_name.as_str()),
            VALUE_SET_URI => Some(self.value_set_uri.as_str()),
            CODE_SYSTEM => Some(self.code_system.as_str()),
            LOGICAL_DEFINITION => self.logical_definition.as_deref(),
            CODE => self.code.as_deref(),
            CODE_DESCRIPTION => self.code_description.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    fn set(&mut self, column: &str, value: String) {
        use columns::*;
        match column {
            VALUE_SET_NAME => self.value_set_name = value,
            VALUE_SET_URI => self.value_set_uri = value,
            CODE_SYSTEM => self.code_system = value,
            LOGICAL_DEFINITION => self.logical_definition = Some(value),
            CODE => self.code = Some(value),
            CODE_DESCRIPTION => self.code_description = Some(value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    fn remove(&mut self, column: &str) -> Option<String> {
        use columns::*;
        match column {
            LOGICAL_DEFINITION => self.logical_definition.take(),
            CODE => self.code.take(),
            CODE_DESCRIPTION => self.code_description.take(),
            other => self.extra.shift_remove(other),
        }
    }

    fn column_names(&self) -> Vec<&str> {
        use columns::*;
        let mut names = vec![VALUE_SET_NAME, VALUE_SET_URI, CODE_SYSTEM];
        if self.logical_definition.is_some() {
            names.push(LOGICAL_DEFINITION);
        }
        if self.code.is_some() {
            names.push(CODE);
        }
        if self.code_description.is_some() {
            names.push(CODE_DESCRIPTION);
        }
        names.extend(self.extra.keys().map(String::as_str));
        names
    }
}

/// Phrase placed between a filter's property and value
pub fn filter_operator_phrase(op: &str) -> &'static str {
    match op {
        "=" => " = ",
        "is-a" => " is ",
        "descendent-of" => " is a descendent of ",
        "is-not-a" => " is not ",
        "regex" => " matches pattern ",
        "in" => " in ",
        "not-in" => " not in ",
        "generalizes" => " generalizes ",
        "exists" => " exists ",
        _ => " ",
    }
}

fn describe_filter(filter: &ValueSetFilter) -> String {
    format!(
        "{}{}{}",
        filter.property,
        filter_operator_phrase(&filter.op),
        filter.value
    )
}

/// Turns value sets into rows, resolving `compose.include.valueSet` against the IG's value sets
pub struct ValueSetExpander<'a> {
    value_sets: &'a IndexMap<String, ValueSet>,
    settings: &'a DataDictionarySettings,
}

impl<'a> ValueSetExpander<'a> {
    pub fn new(
        value_sets: &'a IndexMap<String, ValueSet>,
        settings: &'a DataDictionarySettings,
    ) -> Self {
        Self {
            value_sets,
            settings,
        }
    }

    /// Rows of one value set, sorted by code system then code
    pub fn expand(&self, vs: &ValueSet) -> Vec<ValueSetRow> {
        let mut visiting = vec![vs.url.clone()];
        let mut rows = self.rows(vs, &mut visiting);
        rows.sort_by(compare_rows);
        rows
    }

    /// Rows of every value set in order
    pub fn expand_all(&self) -> Vec<ValueSetRow> {
        self.value_sets
            .values()
            .flat_map(|vs| self.expand(vs))
            .collect()
    }

    fn rows(&self, vs: &ValueSet, visiting: &mut Vec<String>) -> Vec<ValueSetRow> {
        let mut rows = Vec::new();
        let mut filters: IndexMap<&str, Vec<String>> = IndexMap::new();

        for include in vs.includes() {
            let system = include.system.as_deref().unwrap_or_default();

            if let Some(concepts) = &include.concept {
                let code_system = self.settings.code_system_name(system);
                rows.extend(concepts.iter().map(|concept| {
                    ValueSetRow::code_row(vs, code_system, &concept.code, concept.display.as_deref())
                }));
            } else if let Some(included) = &include.value_set {
                for url in included {
                    let Some(referenced) = self.value_sets.get(url) else {
                        error!("Value set expansion {} could not be found.", url);
                        break;
                    };

                    match self.settings.included_value_sets {
                        IncludedValueSets::Reference => rows.push(ValueSetRow::logic_row(
                            vs,
                            "n/a",
                            format!("Include codes from {}", referenced.display_title()),
                        )),
                        IncludedValueSets::Expand => {
                            if visiting.contains(url) {
                                warn!("{} includes itself through {}; not expanding again", vs.url, url);
                                continue;
                            }
                            visiting.push(url.clone());
                            let expansion = self.rows(referenced, visiting);
                            visiting.pop();

                            rows.extend(expansion.into_iter().map(|mut row| {
                                row.value_set_name = vs.display_title().to_string();
                                row.value_set_uri = vs.url.clone();
                                row
                            }));
                        }
                    }
                }
            } else if let Some(include_filters) = &include.filter {
                filters
                    .entry(system)
                    .or_default()
                    .extend(include_filters.iter().map(describe_filter));
            }
        }

        rows.extend(filters.into_iter().map(|(system, clauses)| {
            ValueSetRow::logic_row(vs, self.settings.code_system_name(system), clauses.join(" OR "))
        }));
        rows
    }
}

/// Ascending by code system, then code; rows without a code last
fn compare_rows(a: &ValueSetRow, b: &ValueSetRow) -> Ordering {
    a.code_system
        .cmp(&b.code_system)
        .then_with(|| match (&a.code, &b.code) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ValueSetCompose, ValueSetConcept, ValueSetInclude};
    use pretty_assertions::assert_eq;

    fn value_set(url: &str, title: &str, include: Vec<ValueSetInclude>) -> ValueSet {
        ValueSet {
            url: url.to_string(),
            name: title.replace(' ', ""),
            title: Some(title.to_string()),
            compose: Some(ValueSetCompose {
                include,
                exclude: None,
            }),
            ..Default::default()
        }
    }

    fn concepts(system: &str, codes: &[(&str, &str)]) -> ValueSetInclude {
        ValueSetInclude {
            system: Some(system.to_string()),
            concept: Some(
                codes
                    .iter()
                    .map(|(code, display)| ValueSetConcept {
                        code: code.to_string(),
                        display: Some(display.to_string()),
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn settings() -> DataDictionarySettings {
        let mut settings = DataDictionarySettings::default();
        settings
            .code_systems
            .insert("http://snomed.info/sct".to_string(), "SNOMED CT".to_string());
        settings
    }

    #[test]
    fn test_concepts_are_sorted_by_system_and_code() {
        let vs = value_set(
            "http://example.org/ValueSet/a",
            "A",
            vec![
                concepts("http://snomed.info/sct", &[("2", "two"), ("1", "one")]),
                concepts("http://loinc.org", &[("9", "nine")]),
            ],
        );
        let all = IndexMap::new();
        let settings = settings();
        let rows = ValueSetExpander::new(&all, &settings).expand(&vs);

        let summary: Vec<_> = rows
            .iter()
            .map(|r| (r.code_system.as_str(), r.code.as_deref().unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![("SNOMED CT", "1"), ("SNOMED CT", "2"), ("http://loinc.org", "9")]
        );
        assert_eq!(rows[0].value_set_name, "A");
        assert_eq!(rows[0].code_description.as_deref(), Some("one"));
    }

    #[test]
    fn test_filters_grouped_per_system() {
        let include = |property: &str, op: &str, value: &str| ValueSetInclude {
            system: Some("http://snomed.info/sct".to_string()),
            filter: Some(vec![ValueSetFilter {
                property: property.to_string(),
                op: op.to_string(),
                value: value.to_string(),
            }]),
            ..Default::default()
        };
        let vs = value_set(
            "http://example.org/ValueSet/f",
            "F",
            vec![
                include("concept", "is-a", "123"),
                include("concept", "descendent-of", "456"),
                include("concept", "bogus", "789"),
            ],
        );
        let all = IndexMap::new();
        let settings = settings();
        let rows = ValueSetExpander::new(&all, &settings).expand(&vs);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code_system, "SNOMED CT");
        assert_eq!(
            rows[0].logical_definition.as_deref(),
            Some("concept is 123 OR concept is a descendent of 456 OR concept 789")
        );
        assert!(rows[0].code.is_none());
    }

    #[test]
    fn test_included_value_sets_reference_and_expand() {
        let child = value_set(
            "http://example.org/ValueSet/child",
            "Child",
            vec![concepts("http://loinc.org", &[("1", "one")])],
        );
        let parent = value_set(
            "http://example.org/ValueSet/parent",
            "Parent",
            vec![ValueSetInclude {
                value_set: Some(vec![
                    child.url.clone(),
                    "http://example.org/ValueSet/missing".to_string(),
                ]),
                ..Default::default()
            }],
        );
        let mut all = IndexMap::new();
        all.insert(child.url.clone(), child.clone());
        all.insert(parent.url.clone(), parent.clone());

        let mut settings = settings();
        let rows = ValueSetExpander::new(&all, &settings).expand(&parent);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code_system, "n/a");
        assert_eq!(rows[0].logical_definition.as_deref(), Some("Include codes from Child"));

        settings.included_value_sets = IncludedValueSets::Expand;
        let rows = ValueSetExpander::new(&all, &settings).expand(&parent);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code.as_deref(), Some("1"));
        assert_eq!(rows[0].value_set_name, "Parent");
        assert_eq!(rows[0].value_set_uri, parent.url);
    }

    #[test]
    fn test_expand_cuts_cycles() {
        let a = value_set(
            "http://example.org/ValueSet/a",
            "A",
            vec![ValueSetInclude {
                value_set: Some(vec!["http://example.org/ValueSet/a".to_string()]),
                ..Default::default()
            }],
        );
        let mut all = IndexMap::new();
        all.insert(a.url.clone(), a.clone());
        let settings = DataDictionarySettings {
            included_value_sets: IncludedValueSets::Expand,
            ..Default::default()
        };
        assert!(ValueSetExpander::new(&all, &settings).expand(&a).is_empty());
    }

    #[test]
    fn test_icd_10_cm_keys_ignore_dots() {
        let row = |code: &str| ValueSetRow {
            value_set_uri: "http://example.org/ValueSet/dx".to_string(),
            code_system: ICD_10_CM_NAME.to_string(),
            code: Some(code.to_string()),
            ..Default::default()
        };
        let dotted = row("C50.1");
        let plain = row("C501");

        assert_eq!(dotted.lookup_key(&dotted.value_set_uri), plain.lookup_key(&plain.value_set_uri));
        assert_ne!(dotted.code, plain.code);

        let mut loinc = row("1.2");
        loinc.code_system = "LOINC".to_string();
        assert_eq!(loinc.lookup_key("u"), "u>code=1.2");
    }
}

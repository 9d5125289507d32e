//! Data dictionary rows
//!
//! A [`DataElementRow`] is one line of the "Data elements" sheet. It is
//! serialized with the human column names as keys, so the JSON document doubles
//! as the interchange format read back by the differ.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column names of the data elements sheet
pub mod columns {
    pub const GROUP: &str = "Group";
    pub const PROFILE_TITLE: &str = "Profile Title";
    pub const DATA_ELEMENT_NAME: &str = "Data Element Name";
    pub const DEFINITION: &str = "Definition";
    pub const REQUIRED: &str = "Required?";
    pub const OCCURRENCES_ALLOWED: &str = "Occurrences Allowed";
    pub const DATA_TYPE: &str = "Data Type";
    pub const VALUE_SET_URI: &str = "Value Set URI";
    pub const VALUE_SET_BINDING: &str = "Value Set Binding";
    pub const FHIR_ELEMENT: &str = "FHIR Element (R4)";
    pub const SOURCE_PROFILE_URI: &str = "Source Profile URI";
    pub const ELEMENT_STRUCTURE_DEFINITION_URI: &str = "Element StructureDefinition URI";
    pub const USED_BY_MEASURE: &str = "Used By Measure";

    /// Annotation added by the differ
    pub const NOTE: &str = "Note";
    /// Dataset origin marker added by the differ
    pub const FILE: &str = "File";

    pub const ELEMENT_COLUMNS: [&str; 12] = [
        GROUP,
        PROFILE_TITLE,
        DATA_ELEMENT_NAME,
        DEFINITION,
        REQUIRED,
        OCCURRENCES_ALLOWED,
        DATA_TYPE,
        VALUE_SET_URI,
        VALUE_SET_BINDING,
        FHIR_ELEMENT,
        SOURCE_PROFILE_URI,
        ELEMENT_STRUCTURE_DEFINITION_URI,
    ];
}

/// Uniform access to the cells of a row by column name
pub trait TabularRow {
    /// Cell value, `None` when the row has no such column
    fn get(&self, column: &str) -> Option<&str>;

    /// Overwrite a cell, adding the column when it is not a named one
    fn set(&mut self, column: &str, value: String);

    /// Drop an extension column
    fn remove(&mut self, column: &str) -> Option<String>;

    /// Columns present on this row, named columns first
    fn column_names(&self) -> Vec<&str>;

    /// Whether every `column: value` pair holds on this row
    fn matches_all<'c>(&self, criteria: impl IntoIterator<Item = (&'c String, &'c String)>) -> bool
    where
        Self: Sized,
    {
        criteria
            .into_iter()
            .all(|(column, value)| self.get(column) == Some(value.as_str()))
    }
}

/// One resolved data element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataElementRow {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Profile Title")]
    pub profile_title: String,
    #[serde(rename = "Data Element Name")]
    pub data_element_name: String,
    #[serde(rename = "Definition")]
    pub definition: String,
    #[serde(rename = "Required?")]
    pub required: String,
    #[serde(rename = "Occurrences Allowed")]
    pub occurrences_allowed: String,
    #[serde(rename = "Data Type")]
    pub data_type: String,
    #[serde(rename = "Value Set URI")]
    pub value_set_uri: String,
    #[serde(rename = "Value Set Binding")]
    pub value_set_binding: String,
    #[serde(rename = "FHIR Element (R4)")]
    pub fhir_element: String,
    #[serde(rename = "Source Profile URI")]
    pub source_profile_uri: String,
    #[serde(rename = "Element StructureDefinition URI")]
    pub element_structure_definition_uri: String,
    #[serde(rename = "Used By Measure", skip_serializing_if = "Option::is_none")]
    pub used_by_measure: Option<String>,
    /// `Note`, `File` and any other column not listed above
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl DataElementRow {
    /// Key used to match the same element across two dictionaries
    pub fn diff_key(&self) -> String {
        format!(
            "{}>{}>{}",
            self.source_profile_uri, self.element_structure_definition_uri, self.fhir_element
        )
    }

    fn named_mut(&mut self, column: &str) -> Option<&mut String> {
        use columns::*;
        let field = match column {
            GROUP => &mut self.group,
            PROFILE_TITLE => &mut self.profile_title,
            DATA_ELEMENT_NAME => &mut self.data_element_name,
            DEFINITION => &mut self.definition,
            REQUIRED => &mut self.required,
            OCCURRENCES_ALLOWED => &mut self.occurrences_allowed,
            DATA_TYPE => &mut self.data_type,
            VALUE_SET_URI => &mut self.value_set_uri,
            VALUE_SET_BINDING => &mut self.value_set_binding,
            FHIR_ELEMENT => &mut self.fhir_element,
            SOURCE_PROFILE_URI => &mut self.source_profile_uri,
            ELEMENT_STRUCTURE_DEFINITION_URI => &mut self.element_structure_definition_uri,
            _ => return None,
        };
        Some(field)
    }
}

impl TabularRow for DataElementRow {
    fn get(&self, column: &str) -> Option<&str> {
        use columns::*;
        let value = match column {
            GROUP => &self.group,
            PROFILE_TITLE => &self.profile_title,
            DATA_ELEMENT_NAME => &self.data_element_name,
            DEFINITION => &self.definition,
            REQUIRED => &self.required,
            OCCURRENCES_ALLOWED => &self.occurrences_allowed,
            DATA_TYPE => &self.data_type,
            VALUE_SET_URI => &self.value_set_uri,
            VALUE_SET_BINDING => &self.value_set_binding,
            FHIR_ELEMENT => &self.fhir_element,
            SOURCE_PROFILE_URI => &self.source_profile_uri,
            ELEMENT_STRUCTURE_DEFINITION_URI => &self.element_structure_definition_uri,
            USED_BY_MEASURE => return self.used_by_measure.as_deref(),
            other => return self.extra.get(other).map(String::as_str),
        };
        Some(value.as_str())
    }

    fn set(&mut self, column: &str, value: String) {
        if column == columns::USED_BY_MEASURE {
            self.used_by_measure = Some(value);
        } else if let Some(field) = self.named_mut(column) {
            *field = value;
        } else {
            self.extra.insert(column.to_string(), value);
        }
    }

    fn remove(&mut self, column: &str) -> Option<String> {
        if column == columns::USED_BY_MEASURE {
            return self.used_by_measure.take();
        }
        self.extra.shift_remove(column)
    }

    fn column_names(&self) -> Vec<&str> {
        let mut names = columns::ELEMENT_COLUMNS.to_vec();
        if self.used_by_measure.is_some() {
            names.push(columns::USED_BY_MEASURE);
        }
        names.extend(self.extra.keys().map(String::as_str));
        names
    }
}

//! Data dictionary workbook layout

use super::{RowKind, Sheet, SheetRow, Workbook};
use crate::config::{DataDictionarySettings, IgConfiguration};
use crate::dictionary::{DataDictionary, SummaryRow};
use crate::element::{TabularRow, columns};
use crate::element::naming::title_case;
use crate::value_set::columns as vs_columns;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Keys of `informationTabContent` written in capitals become headings
static HEADING_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z ]*$").expect("valid regex"));

/// Keys with this prefix produce a row with an empty label
const EMPTY_KEY_PREFIX: &str = "EMPTY-";

const VALUE_SET_CODE_COLUMNS: [&str; 5] = [
    vs_columns::VALUE_SET_NAME,
    vs_columns::CODE_SYSTEM,
    vs_columns::LOGICAL_DEFINITION,
    vs_columns::CODE,
    vs_columns::CODE_DESCRIPTION,
];

pub fn dictionary_workbook(
    doc: &DataDictionary,
    settings: &DataDictionarySettings,
    ig: &IgConfiguration,
) -> Workbook {
    let all_default = doc.all_groups_default();
    let mut workbook = Workbook::new();

    workbook.add_sheet(information_sheet(doc, settings, ig));
    workbook.add_sheet(profiles_sheet(&doc.profiles, all_default));
    workbook.add_sheet(data_elements_sheet(doc, all_default));

    if doc.value_sets.is_empty() {
        warn!("No value set found. Skipped creating tab for value set");
    } else {
        workbook.add_sheet(summary_sheet("Value sets", &doc.value_sets));
        workbook.add_sheet(value_set_codes_sheet(doc));
    }

    if doc.extensions.is_empty() {
        warn!("No extension found. Skipped creating tab for extensions");
    } else {
        workbook.add_sheet(summary_sheet("Extensions", &doc.extensions));
    }

    workbook
}

fn information_sheet(
    doc: &DataDictionary,
    settings: &DataDictionarySettings,
    ig: &IgConfiguration,
) -> Sheet {
    let title = settings.title.as_deref().unwrap_or("IG Summary");
    let mut sheet = Sheet::new("IG information").with_title(title);

    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    let lines: [(&str, String); 5] = [
        ("IG name", optional(&ig.name)),
        ("IG URL", ig.canonical.clone()),
        ("IG version", optional(&ig.version)),
        ("IG status", optional(&ig.status)),
        ("Base FHIR version", ig.fhir_version.join(", ")),
    ];
    for (label, value) in lines {
        sheet.push_cells([String::new(), label.to_string(), value]);
    }
    sheet.push(SheetRow::spacer());

    let counts = [
        ("# Profiles", doc.profiles.len()),
        ("# Extensions", doc.extensions.len()),
        ("# Value Sets", doc.value_sets.len()),
        ("# Code Systems", doc.code_systems.len()),
    ];
    for (label, count) in counts {
        sheet.push_cells([String::new(), label.to_string(), count.to_string()]);
    }
    sheet.push(SheetRow::spacer());

    let generated = Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string();
    sheet.push_cells([
        String::new(),
        "Data dictionary generated date".to_string(),
        generated,
    ]);

    for (key, text) in &settings.information_tab_content {
        sheet.push(information_row(key, text));
    }
    sheet
}

fn information_row(key: &str, text: &str) -> SheetRow {
    let (kind, label) = if key.starts_with(EMPTY_KEY_PREFIX) {
        (RowKind::Data, String::new())
    } else if HEADING_KEY.is_match(key) {
        (RowKind::Section, title_case(&key.to_lowercase()))
    } else {
        (RowKind::Data, key.to_string())
    };
    SheetRow {
        kind,
        cells: vec![String::new(), label, text.to_string()],
        highlighted: Vec::new(),
    }
}

fn profiles_sheet(profiles: &[SummaryRow], all_default: bool) -> Sheet {
    let mut sheet = Sheet::new("Profiles").with_columns(&["Group", "Title", "Url", "Description"]);
    for row in profiles {
        sheet.push_cells([
            row.group.clone().unwrap_or_default(),
            row.title.clone(),
            row.url.clone(),
            row.description.clone(),
        ]);
    }
    if all_default {
        sheet.hide_column(0);
    }
    sheet
}

fn summary_sheet(name: &str, rows: &[SummaryRow]) -> Sheet {
    let mut sheet = Sheet::new(name).with_columns(&["Title", "Url", "Description"]);
    for row in rows {
        sheet.push_cells([row.title.as_str(), row.url.as_str(), row.description.as_str()]);
    }
    sheet
}

fn data_elements_sheet(doc: &DataDictionary, all_default: bool) -> Sheet {
    let mut headers = columns::ELEMENT_COLUMNS.to_vec();
    headers.push(columns::USED_BY_MEASURE);

    let mut sheet = Sheet::new("Data elements")
        .with_columns(&headers)
        .frozen(1, 3);
    for row in &doc.profile_elements {
        let cells: Vec<String> = headers
            .iter()
            .map(|&column| row.get(column).unwrap_or_default().to_string())
            .collect();
        sheet.push(SheetRow::data(cells));
    }

    for uri_column in [
        columns::SOURCE_PROFILE_URI,
        columns::ELEMENT_STRUCTURE_DEFINITION_URI,
    ] {
        if let Some(index) = sheet.column_index(uri_column) {
            sheet.hide_column(index);
        }
    }
    if all_default {
        sheet.hide_column(0);
    }
    sheet
}

/// One section row per value set followed by its codes
fn value_set_codes_sheet(doc: &DataDictionary) -> Sheet {
    let mut sheet = Sheet::new("Value set codes").with_columns(&[
        "Value Set Name",
        "Code System",
        "Logical Definition",
        "Code",
        "Code Description",
    ]);

    let mut current: Option<&str> = None;
    for row in &doc.value_set_elements {
        if current != Some(row.value_set_name.as_str()) {
            sheet.push(SheetRow::section(row.value_set_name.as_str()));
            current = Some(row.value_set_name.as_str());
        }
        let cells = VALUE_SET_CODE_COLUMNS.map(|column| row.get(column).unwrap_or_default().to_string());
        sheet.push(SheetRow::data(cells.into()));
    }
    sheet
}

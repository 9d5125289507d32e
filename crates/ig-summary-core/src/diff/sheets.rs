//! Diff workbook layout

use super::differ::{Differ, IndexedSummaries};
use crate::element::{DataElementRow, TabularRow, columns};
use crate::value_set::{ValueSetRow, columns as vs_columns};
use crate::workbook::{RowKind, Sheet, SheetRow, Workbook};
use indexmap::IndexMap;

const VALUE_SET_COLUMNS: [&str; 5] = [
    vs_columns::VALUE_SET_NAME,
    vs_columns::CODE_SYSTEM,
    vs_columns::LOGICAL_DEFINITION,
    vs_columns::CODE,
    vs_columns::CODE_DESCRIPTION,
];

const SHEET_DESCRIPTIONS: [&str; 11] = [
    "This workbook shows the difference between two data dictionaries.",
    "**Added profiles:** profiles absent from the \"old\" data dictionary that appear in the \"new\" one. Their elements are not repeated in the diff.",
    "**Removed profiles:** profiles of the \"old\" data dictionary that are absent from the \"new\" one. Their elements are not repeated in the diff.",
    "**Added elements:** elements of existing profiles that only appear in the \"new\" data dictionary.",
    "**Removed elements:** elements of existing profiles that only appear in the \"old\" data dictionary.",
    "**Changed elements:** elements in both data dictionaries with at least one changed attribute. Changes are highlighted.",
    "**Added value sets:** value sets absent from the \"old\" data dictionary that appear in the \"new\" one.",
    "**Removed value sets:** value sets of the \"old\" data dictionary that are absent from the \"new\" one.",
    "**Value sets - added codes:** codes of existing value sets that only appear in the \"new\" data dictionary.",
    "**Value sets - removed codes:** codes of existing value sets that only appear in the \"old\" data dictionary.",
    "**Value sets - changed codes:** codes whose description changed. Changes are highlighted.",
];

impl Differ<'_> {
    pub fn to_workbook(&self) -> Workbook {
        let all_default = self.all_groups_default();
        let mut workbook = Workbook::new();

        workbook.add_sheet(self.information_sheet());
        workbook.add_sheet(
            profiles_sheet("Added profiles", self.added_profiles(), all_default).with_description(
                "Profiles which appear in the \"new\" data dictionary and do not appear in the \"old\" data dictionary.",
            ),
        );
        workbook.add_sheet(
            profiles_sheet("Removed profiles", self.removed_profiles(), all_default)
                .with_description(
                    "Profiles which do not appear in the \"new\" data dictionary but do appear in the \"old\" data dictionary.",
                ),
        );
        workbook.add_sheet(
            elements_sheet(
                "Added elements",
                &self.added_elements_in_existing_profiles(),
                all_default,
                "No added elements",
            )
            .with_title("Elements added to existing profiles")
            .with_description(
                "Elements added to _existing_ profiles. Elements of entirely new profiles are shown in the \"Data elements\" sheet of the \"new\" data dictionary.",
            ),
        );
        workbook.add_sheet(
            elements_sheet(
                "Removed elements",
                &self.removed_elements_in_existing_profiles(),
                all_default,
                "No removed elements",
            )
            .with_title("Elements removed from existing profiles")
            .with_description(
                "Elements removed from _existing_ profiles. Elements of entirely removed profiles are shown in the \"Data elements\" sheet of the \"old\" data dictionary.",
            ),
        );
        workbook.add_sheet(self.changed_elements_sheet());
        workbook.add_sheet(value_sets_sheet("Added value sets", self.added_value_sets()));
        workbook.add_sheet(value_sets_sheet(
            "Removed value sets",
            self.removed_value_sets(),
        ));
        workbook.add_sheet(
            values_sheet(
                "Value sets - added codes",
                &self.added_values_in_existing_value_sets(),
                "No added values",
            )
            .with_title("Codes added to existing value sets"),
        );
        workbook.add_sheet(
            values_sheet(
                "Value sets - removed codes",
                &self.removed_values_in_existing_value_sets(),
                "No removed values",
            )
            .with_title("Codes removed from existing value sets"),
        );
        workbook.add_sheet(self.changed_values_sheet());

        workbook
    }

    fn information_sheet(&self) -> Sheet {
        let settings = self.settings();
        let mut sheet = Sheet::new("IG information").with_title("Data Dictionary Diff");
        sheet.push_cells(["", "Implementation guide", self.right.metadata.title.as_str()]);
        sheet.push(SheetRow::spacer());
        sheet.push_cells([
            String::new(),
            "\"Old\" data dictionary".to_string(),
            format!("{} ({})", settings.left_name, self.left.metadata.version),
        ]);
        sheet.push_cells([
            String::new(),
            "\"New\" data dictionary".to_string(),
            format!("{} ({})", settings.right_name, self.right.metadata.version),
        ]);
        sheet.push(SheetRow::spacer());
        sheet.push_cells([
            "",
            "Sheet descriptions",
            SHEET_DESCRIPTIONS.join("\n\n").as_str(),
        ]);
        sheet
    }

    /// Left row, right row, then the note or a spacer, for every changed element
    fn changed_elements_sheet(&self) -> Sheet {
        let element_columns = column_union(
            self.left_elements()
                .values()
                .chain(self.right_elements().values()),
        );
        let mut headers = vec![columns::FILE];
        headers.extend(
            element_columns
                .iter()
                .copied()
                .filter(|&column| column != columns::NOTE),
        );

        let mut sheet = Sheet::new("Changed elements")
            .with_columns(&headers)
            .frozen(1, 4);
        let settings = self.settings();
        for (key, changed) in self.changed_elements() {
            let (Some(left), Some(right)) =
                (self.left_elements().get(key), self.right_elements().get(key))
            else {
                continue;
            };
            let highlights: Vec<usize> = changed
                .iter()
                .filter_map(|column| headers.iter().position(|&h| h == column.as_str()))
                .collect();

            for (row, file) in [(left, &settings.left_name), (right, &settings.right_name)] {
                let cells = cells_with_file(row, &headers, file);
                sheet.push(SheetRow::data(cells).with_highlights(highlights.clone()));
            }

            match left.get(columns::NOTE) {
                Some(note) => {
                    let mut cells = vec![String::new(); headers.len()];
                    if let Some(index) = headers.iter().position(|&h| h == columns::DEFINITION) {
                        cells[index] = note.to_string();
                    }
                    sheet.push(SheetRow {
                        kind: RowKind::Note,
                        cells,
                        highlighted: Vec::new(),
                    });
                }
                None => sheet.push(SheetRow::spacer()),
            }
        }
        sheet
    }

    fn changed_values_sheet(&self) -> Sheet {
        let mut headers = vec![columns::FILE];
        headers.extend(VALUE_SET_COLUMNS);

        let mut sheet = Sheet::new("Value sets - changed codes").with_columns(&headers);
        let settings = self.settings();
        for (key, changed) in self.changed_value_set_values() {
            let (Some(left), Some(right)) =
                (self.left_values().get(key), self.right_values().get(key))
            else {
                continue;
            };
            let highlights: Vec<usize> = changed
                .iter()
                .filter_map(|column| headers.iter().position(|&h| h == column.as_str()))
                .collect();

            for (row, file) in [(left, &settings.left_name), (right, &settings.right_name)] {
                let cells = cells_with_file(row, &headers, file);
                sheet.push(SheetRow::data(cells).with_highlights(highlights.clone()));
            }
            sheet.push(SheetRow::spacer());
        }
        sheet
    }
}

fn cells_with_file<R: TabularRow>(row: &R, headers: &[&str], file: &str) -> Vec<String> {
    headers
        .iter()
        .map(|&column| {
            if column == columns::FILE {
                file.to_string()
            } else {
                row.get(column).unwrap_or_default().to_string()
            }
        })
        .collect()
}

/// Columns of all rows, in first-seen order
fn column_union<'r, R: TabularRow + 'r>(rows: impl IntoIterator<Item = &'r R>) -> Vec<&'r str> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for name in row.column_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn profiles_sheet(name: &str, profiles: &IndexedSummaries, all_default: bool) -> Sheet {
    let headers: &[&str] = if all_default {
        &["Title", "Url", "Description"]
    } else {
        &["Group", "Title", "Url", "Description"]
    };
    let mut sheet = Sheet::new(name)
        .with_title(name)
        .with_columns(headers)
        .frozen(1, 1);
    for row in profiles.values() {
        let mut cells = Vec::with_capacity(4);
        if !all_default {
            cells.push(row.group.clone().unwrap_or_default());
        }
        cells.extend([row.title.clone(), row.url.clone(), row.description.clone()]);
        sheet.push(SheetRow::data(cells));
    }
    sheet
}

fn value_sets_sheet(name: &str, value_sets: &IndexedSummaries) -> Sheet {
    let mut sheet = Sheet::new(name)
        .with_title(name)
        .with_columns(&["Title", "Url", "Description"])
        .frozen(1, 1);
    for row in value_sets.values() {
        sheet.push_cells([row.title.as_str(), row.url.as_str(), row.description.as_str()]);
    }
    sheet
}

fn elements_sheet(
    name: &str,
    elements: &IndexMap<&str, &DataElementRow>,
    all_default: bool,
    empty_message: &str,
) -> Sheet {
    let headers: Vec<&str> = column_union(elements.values().copied())
        .into_iter()
        .filter(|&column| !(all_default && column == columns::GROUP))
        .collect();
    let frozen_columns = if all_default { 2 } else { 3 };

    let mut sheet = Sheet::new(name)
        .with_columns(&headers)
        .frozen(1, frozen_columns);
    if elements.is_empty() {
        sheet.push(note_row(empty_message));
        return sheet;
    }
    for row in elements.values() {
        let cells = headers
            .iter()
            .map(|&column| row.get(column).unwrap_or_default().to_string())
            .collect();
        sheet.push(SheetRow::data(cells));
    }
    sheet
}

fn values_sheet(
    name: &str,
    values: &IndexMap<&str, &ValueSetRow>,
    empty_message: &str,
) -> Sheet {
    let mut sheet = Sheet::new(name)
        .with_columns(&VALUE_SET_COLUMNS)
        .frozen(1, 1);
    if values.is_empty() {
        sheet.push(note_row(empty_message));
        return sheet;
    }
    for row in values.values() {
        let cells = VALUE_SET_COLUMNS.map(|column| row.get(column).unwrap_or_default().to_string());
        sheet.push(SheetRow::data(cells.into()));
    }
    sheet
}

fn note_row(text: &str) -> SheetRow {
    SheetRow {
        kind: RowKind::Note,
        cells: vec![text.to_string()],
        highlighted: Vec::new(),
    }
}

//! Classification of two data dictionaries

use crate::config::{DiffSettings, RemapRule};
use crate::config::diff_settings::MatchCriteria;
use crate::dictionary::{DataDictionary, SummaryRow};
use crate::element::{DataElementRow, TabularRow, columns};
use crate::value_set::ValueSetRow;
use indexmap::{IndexMap, IndexSet};
use once_cell::unsync::OnceCell;
use tracing::{debug, warn};

pub type IndexedSummaries = IndexMap<String, SummaryRow>;
pub type IndexedElements = IndexMap<String, DataElementRow>;
pub type IndexedValues = IndexMap<String, ValueSetRow>;
/// Key → names of the columns that differ
pub type ChangedColumns = IndexMap<String, IndexSet<String>>;

/// Compares an older ("left") and a newer ("right") data dictionary
///
/// Both documents are copied into keyed working sets when the differ is
/// built; settings are applied to those copies only. Every classification is
/// computed on first access and cached for the lifetime of the differ.
pub struct Differ<'a> {
    pub(super) left: &'a DataDictionary,
    pub(super) right: &'a DataDictionary,
    pub(super) settings: DiffSettings,

    pub(super) left_profiles: IndexedSummaries,
    pub(super) right_profiles: IndexedSummaries,
    pub(super) left_elements: IndexedElements,
    pub(super) right_elements: IndexedElements,
    pub(super) left_value_sets: IndexedSummaries,
    pub(super) right_value_sets: IndexedSummaries,
    pub(super) left_values: IndexedValues,
    pub(super) right_values: IndexedValues,

    added_profiles: OnceCell<IndexedSummaries>,
    removed_profiles: OnceCell<IndexedSummaries>,
    added_elements: OnceCell<IndexedElements>,
    removed_elements: OnceCell<IndexedElements>,
    changed_elements: OnceCell<ChangedColumns>,
    added_value_sets: OnceCell<IndexedSummaries>,
    removed_value_sets: OnceCell<IndexedSummaries>,
    added_values: OnceCell<IndexedValues>,
    removed_values: OnceCell<IndexedValues>,
    changed_values: OnceCell<ChangedColumns>,
}

impl<'a> Differ<'a> {
    pub fn new(left: &'a DataDictionary, right: &'a DataDictionary, settings: DiffSettings) -> Self {
        // A remapped `Source Profile URI` also renames the left profile itself
        let left_profiles = left
            .profiles
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if let Some(rule) = settings.remap_values.iter().find(|rule| {
                    rule.column == columns::SOURCE_PROFILE_URI && rule.old == row.url
                }) {
                    row.url = rule.new.clone();
                }
                (row.url.clone(), row)
            })
            .collect();
        let right_profiles = index_summaries(&right.profiles, |url| url.to_string());

        let left_elements = index_elements(&left.profile_elements, &settings);
        let right_elements = index_elements(&right.profile_elements, &settings);

        let left_value_sets = index_summaries(&left.value_sets, |url| {
            settings.follow_uri_remap(url).to_string()
        });
        let right_value_sets = index_summaries(&right.value_sets, |url| url.to_string());

        let left_values = index_values(&left.value_set_elements, &settings);
        let right_values = index_values(&right.value_set_elements, &settings);

        debug!(
            "Indexed {} left and {} right elements",
            left_elements.len(),
            right_elements.len()
        );

        Self {
            left,
            right,
            settings,
            left_profiles,
            right_profiles,
            left_elements,
            right_elements,
            left_value_sets,
            right_value_sets,
            left_values,
            right_values,
            added_profiles: OnceCell::new(),
            removed_profiles: OnceCell::new(),
            added_elements: OnceCell::new(),
            removed_elements: OnceCell::new(),
            changed_elements: OnceCell::new(),
            added_value_sets: OnceCell::new(),
            removed_value_sets: OnceCell::new(),
            added_values: OnceCell::new(),
            removed_values: OnceCell::new(),
            changed_values: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    pub fn left_elements(&self) -> &IndexedElements {
        &self.left_elements
    }

    pub fn right_elements(&self) -> &IndexedElements {
        &self.right_elements
    }

    pub fn left_values(&self) -> &IndexedValues {
        &self.left_values
    }

    pub fn right_values(&self) -> &IndexedValues {
        &self.right_values
    }

    pub fn added_profiles(&self) -> &IndexedSummaries {
        self.added_profiles
            .get_or_init(|| missing_from(&self.right_profiles, &self.left_profiles))
    }

    pub fn removed_profiles(&self) -> &IndexedSummaries {
        self.removed_profiles
            .get_or_init(|| missing_from(&self.left_profiles, &self.right_profiles))
    }

    /// Elements only in the right dictionary, with any note folded into the definition
    pub fn added_elements(&self) -> &IndexedElements {
        self.added_elements.get_or_init(|| {
            let mut added = missing_from(&self.right_elements, &self.left_elements);
            added.values_mut().for_each(fold_note_into_definition);
            added
        })
    }

    /// Elements only in the left dictionary, with any note folded into the definition
    pub fn removed_elements(&self) -> &IndexedElements {
        self.removed_elements.get_or_init(|| {
            let mut removed = missing_from(&self.left_elements, &self.right_elements);
            removed.values_mut().for_each(fold_note_into_definition);
            removed
        })
    }

    /// Elements in both dictionaries whose compared columns differ
    pub fn changed_elements(&self) -> &ChangedColumns {
        self.changed_elements.get_or_init(|| {
            let settings = &self.settings;
            changed_rows(&self.left_elements, &self.right_elements, |column| {
                column == columns::NOTE || settings.is_ignored_column(column)
            })
        })
    }

    pub fn added_value_sets(&self) -> &IndexedSummaries {
        self.added_value_sets
            .get_or_init(|| missing_from(&self.right_value_sets, &self.left_value_sets))
    }

    pub fn removed_value_sets(&self) -> &IndexedSummaries {
        self.removed_value_sets
            .get_or_init(|| missing_from(&self.left_value_sets, &self.right_value_sets))
    }

    pub fn added_value_set_values(&self) -> &IndexedValues {
        self.added_values
            .get_or_init(|| missing_from(&self.right_values, &self.left_values))
    }

    pub fn removed_value_set_values(&self) -> &IndexedValues {
        self.removed_values
            .get_or_init(|| missing_from(&self.left_values, &self.right_values))
    }

    pub fn changed_value_set_values(&self) -> &ChangedColumns {
        self.changed_values
            .get_or_init(|| changed_rows(&self.left_values, &self.right_values, |_| false))
    }

    /// Added elements whose profile existed before
    pub fn added_elements_in_existing_profiles(&self) -> IndexMap<&str, &DataElementRow> {
        let added_profiles = self.added_profiles();
        self.added_elements()
            .iter()
            .filter(|(_, row)| !added_profiles.contains_key(&row.source_profile_uri))
            .map(|(key, row)| (key.as_str(), row))
            .collect()
    }

    /// Removed elements whose profile still exists
    pub fn removed_elements_in_existing_profiles(&self) -> IndexMap<&str, &DataElementRow> {
        let removed_profiles = self.removed_profiles();
        self.removed_elements()
            .iter()
            .filter(|(_, row)| !removed_profiles.contains_key(&row.source_profile_uri))
            .map(|(key, row)| (key.as_str(), row))
            .collect()
    }

    /// Added codes of value sets that existed before
    pub fn added_values_in_existing_value_sets(&self) -> IndexMap<&str, &ValueSetRow> {
        in_existing(self.added_value_set_values(), self.added_value_sets())
    }

    /// Removed codes of value sets that still exist
    pub fn removed_values_in_existing_value_sets(&self) -> IndexMap<&str, &ValueSetRow> {
        in_existing(self.removed_value_set_values(), self.removed_value_sets())
    }

    pub fn number_of_added_elements(&self) -> usize {
        self.added_elements().len()
    }

    pub fn number_of_removed_elements(&self) -> usize {
        self.removed_elements().len()
    }

    pub fn number_of_changed_elements(&self) -> usize {
        self.changed_elements().len()
    }

    pub fn number_of_added_profiles(&self) -> usize {
        self.added_profiles().len()
    }

    pub fn number_of_removed_profiles(&self) -> usize {
        self.removed_profiles().len()
    }

    pub fn number_of_added_value_sets(&self) -> usize {
        self.added_value_sets().len()
    }

    pub fn number_of_removed_value_sets(&self) -> usize {
        self.removed_value_sets().len()
    }

    pub fn number_of_added_value_set_values(&self) -> usize {
        self.added_value_set_values().len()
    }

    pub fn number_of_removed_value_set_values(&self) -> usize {
        self.removed_value_set_values().len()
    }

    pub fn number_of_changed_value_set_values(&self) -> usize {
        self.changed_value_set_values().len()
    }

    /// Whether every profile on either side is in the default group
    pub fn all_groups_default(&self) -> bool {
        self.left.all_groups_default() && self.right.all_groups_default()
    }
}

fn index_summaries(rows: &[SummaryRow], key: impl Fn(&str) -> String) -> IndexedSummaries {
    rows.iter().map(|row| (key(&row.url), row.clone())).collect()
}

/// Remap, then drop suppressed rows, then annotate, keyed by [`DataElementRow::diff_key`]
fn index_elements(rows: &[DataElementRow], settings: &DiffSettings) -> IndexedElements {
    let mut indexed = IndexMap::new();
    for row in rows {
        let mut row = row.clone();
        remap_cells(&mut row, &settings.remap_values);
        if is_suppressed(&row, &settings.suppress_rows) {
            warn!("Suppressing {}", row.fhir_element);
            continue;
        }
        if let Some(note) = settings
            .notes
            .iter()
            .find(|rule| rule.appear_by.iter().any(|criteria| row.matches_all(criteria)))
        {
            row.set(columns::NOTE, format!("**Note:** {}", note.note));
        }
        indexed.insert(row.diff_key(), row);
    }
    indexed
}

fn index_values(rows: &[ValueSetRow], settings: &DiffSettings) -> IndexedValues {
    let mut indexed = IndexMap::new();
    for row in rows {
        let key = row.lookup_key(settings.follow_uri_remap(&row.value_set_uri));
        let mut row = row.clone();
        remap_cells(&mut row, &settings.remap_values);
        indexed.insert(key, row);
    }
    indexed
}

fn remap_cells<R: TabularRow>(row: &mut R, rules: &[RemapRule]) {
    for rule in rules {
        if row.get(&rule.column) == Some(rule.old.as_str()) {
            row.set(&rule.column, rule.new.clone());
        }
    }
}

fn is_suppressed<R: TabularRow>(row: &R, rules: &[MatchCriteria]) -> bool {
    rules.iter().any(|criteria| row.matches_all(criteria))
}

fn fold_note_into_definition(row: &mut DataElementRow) {
    if let Some(note) = row.remove(columns::NOTE) {
        row.definition = format!("{}\n\n{note}", row.definition);
    }
}

/// Entries of `from` whose key is absent in `other`
fn missing_from<T: Clone>(from: &IndexMap<String, T>, other: &IndexMap<String, T>) -> IndexMap<String, T> {
    from.iter()
        .filter(|(key, _)| !other.contains_key(*key))
        .map(|(key, row)| (key.clone(), row.clone()))
        .collect()
}

/// Columns that differ for every key present on both sides
///
/// A column present on one side only counts as changed. Keys whose rows agree
/// on every compared column are left out.
fn changed_rows<R: TabularRow>(
    left: &IndexMap<String, R>,
    right: &IndexMap<String, R>,
    skip: impl Fn(&str) -> bool,
) -> ChangedColumns {
    let mut changed = IndexMap::new();
    for (key, right_row) in right {
        let Some(left_row) = left.get(key) else {
            continue;
        };
        let columns: IndexSet<String> = left_row
            .column_names()
            .into_iter()
            .chain(right_row.column_names())
            .filter(|column| !skip(column))
            .filter(|column| left_row.get(column) != right_row.get(column))
            .map(str::to_string)
            .collect();
        if !columns.is_empty() {
            changed.insert(key.clone(), columns);
        }
    }
    changed
}

/// Rows whose key does not belong to one of `value_sets`
fn in_existing<'v>(
    values: &'v IndexedValues,
    value_sets: &IndexedSummaries,
) -> IndexMap<&'v str, &'v ValueSetRow> {
    values
        .iter()
        .filter(|(key, _)| {
            !value_sets
                .keys()
                .any(|uri| key.starts_with(&format!("{uri}>")))
        })
        .map(|(key, row)| (key.as_str(), row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoteRule, RenamedValueSet};
    use pretty_assertions::assert_eq;

    fn element(key: (&str, &str, &str)) -> DataElementRow {
        DataElementRow {
            group: "Default".to_string(),
            profile_title: "Profile".to_string(),
            data_element_name: key.2.to_string(),
            source_profile_uri: key.0.to_string(),
            element_structure_definition_uri: key.1.to_string(),
            fhir_element: key.2.to_string(),
            ..Default::default()
        }
    }

    fn document(elements: Vec<DataElementRow>) -> DataDictionary {
        DataDictionary {
            profile_elements: elements,
            ..Default::default()
        }
    }

    #[test]
    fn test_notes_fold_into_added_definitions() {
        let left = document(vec![]);
        let mut row = element(("P", "S", "1"));
        row.definition = "Original".to_string();
        let right = document(vec![row]);

        let mut criteria = MatchCriteria::new();
        criteria.insert(columns::FHIR_ELEMENT.to_string(), "1".to_string());
        let settings = DiffSettings {
            notes: vec![
                NoteRule {
                    note: "First".to_string(),
                    appear_by: vec![criteria.clone()],
                },
                NoteRule {
                    note: "Second".to_string(),
                    appear_by: vec![criteria],
                },
            ],
            ..Default::default()
        };

        let differ = Differ::new(&left, &right, settings);
        let added = &differ.added_elements()["P>S>1"];
        assert_eq!(added.definition, "Original\n\n**Note:** First");
        assert_eq!(added.get(columns::NOTE), None);
        // The working copy keeps the note for the changed sheet
        assert_eq!(
            differ.right_elements()["P>S>1"].get(columns::NOTE),
            Some("**Note:** First")
        );
    }

    #[test]
    fn test_notes_do_not_count_as_changes() {
        let left = document(vec![element(("P", "S", "1"))]);
        let right = document(vec![element(("P", "S", "1"))]);
        let mut criteria = MatchCriteria::new();
        criteria.insert(columns::GROUP.to_string(), "Default".to_string());
        let settings = DiffSettings {
            notes: vec![NoteRule {
                note: "Everything".to_string(),
                appear_by: vec![criteria],
            }],
            ..Default::default()
        };

        let differ = Differ::new(&left, &right, settings);
        assert_eq!(differ.number_of_changed_elements(), 0);
    }

    #[test]
    fn test_elements_of_new_profiles_are_not_in_existing_profiles() {
        let left = DataDictionary {
            profiles: vec![SummaryRow {
                url: "P".to_string(),
                ..Default::default()
            }],
            profile_elements: vec![element(("P", "S", "1"))],
            ..Default::default()
        };
        let right = DataDictionary {
            profiles: vec![
                SummaryRow {
                    url: "P".to_string(),
                    ..Default::default()
                },
                SummaryRow {
                    url: "Q".to_string(),
                    ..Default::default()
                },
            ],
            profile_elements: vec![
                element(("P", "S", "1")),
                element(("P", "S", "2")),
                element(("Q", "Q", "1")),
            ],
            ..Default::default()
        };

        let differ = Differ::new(&left, &right, DiffSettings::default());
        assert_eq!(differ.number_of_added_elements(), 2);
        let existing: Vec<&str> = differ
            .added_elements_in_existing_profiles()
            .keys()
            .copied()
            .collect();
        assert_eq!(existing, vec!["P>S>2"]);
    }

    #[test]
    fn test_renamed_value_sets_match() {
        let code = |uri: &str, code: &str, description: &str| ValueSetRow {
            value_set_name: "Trend".to_string(),
            value_set_uri: uri.to_string(),
            code_system: "http://example.org/cs".to_string(),
            code: Some(code.to_string()),
            code_description: Some(description.to_string()),
            ..Default::default()
        };
        let summary = |uri: &str| SummaryRow {
            url: uri.to_string(),
            ..Default::default()
        };

        let left = DataDictionary {
            value_sets: vec![summary("http://example.org/ValueSet/old")],
            value_set_elements: vec![
                code("http://example.org/ValueSet/old", "up", "Up"),
                code("http://example.org/ValueSet/old", "down", "Down"),
            ],
            ..Default::default()
        };
        let right = DataDictionary {
            value_sets: vec![
                summary("http://example.org/ValueSet/new"),
                summary("http://example.org/ValueSet/other"),
            ],
            value_set_elements: vec![
                code("http://example.org/ValueSet/new", "up", "Going up"),
                code("http://example.org/ValueSet/new", "flat", "Flat"),
                code("http://example.org/ValueSet/other", "x", "X"),
            ],
            ..Default::default()
        };
        let settings = DiffSettings {
            value_sets: crate::config::ValueSetSettings {
                renamed: vec![RenamedValueSet {
                    old: "http://example.org/ValueSet/old".to_string(),
                    new: "http://example.org/ValueSet/new".to_string(),
                }],
            },
            ..Default::default()
        };

        let differ = Differ::new(&left, &right, settings);
        let added_sets: Vec<&String> = differ.added_value_sets().keys().collect();
        assert_eq!(added_sets, vec!["http://example.org/ValueSet/other"]);
        assert!(differ.removed_value_sets().is_empty());

        let added: Vec<&str> = differ
            .added_values_in_existing_value_sets()
            .keys()
            .copied()
            .collect();
        assert_eq!(added, vec!["http://example.org/ValueSet/new>code=flat"]);
        assert_eq!(differ.number_of_removed_value_set_values(), 1);

        let changed = differ.changed_value_set_values();
        let columns: Vec<&String> = changed["http://example.org/ValueSet/new>code=up"]
            .iter()
            .collect();
        assert_eq!(columns, vec!["Value set URI", "Code description"]);
    }

    #[test]
    fn test_classifications_are_cached() {
        let left = document(vec![element(("P", "S", "1"))]);
        let right = document(vec![element(("P", "S", "2"))]);
        let differ = Differ::new(&left, &right, DiffSettings::default());
        let first = differ.added_elements() as *const IndexedElements;
        let second = differ.added_elements() as *const IndexedElements;
        assert_eq!(first, second);
    }
}

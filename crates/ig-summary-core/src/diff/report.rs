//! Console reports of a diff

use super::differ::Differ;
use crate::element::{DataElementRow, TabularRow};
use comfy_table::Table;
use std::fmt;
use tracing::{info, warn};

/// Cell width in the changed element tables
const CELL_WIDTH: usize = 30;
const OMISSION: &str = "...";

/// Counts of every classified set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub added_profiles: usize,
    pub removed_profiles: usize,
    pub added_elements: usize,
    pub removed_elements: usize,
    pub changed_elements: usize,
    pub added_value_sets: usize,
    pub removed_value_sets: usize,
    pub added_codes: usize,
    pub removed_codes: usize,
    pub changed_codes: usize,
}

impl DiffSummary {
    pub fn of(differ: &Differ<'_>) -> Self {
        Self {
            added_profiles: differ.number_of_added_profiles(),
            removed_profiles: differ.number_of_removed_profiles(),
            added_elements: differ.number_of_added_elements(),
            removed_elements: differ.number_of_removed_elements(),
            changed_elements: differ.number_of_changed_elements(),
            added_value_sets: differ.number_of_added_value_sets(),
            removed_value_sets: differ.number_of_removed_value_sets(),
            added_codes: differ.number_of_added_value_set_values(),
            removed_codes: differ.number_of_removed_value_set_values(),
            changed_codes: differ.number_of_changed_value_set_values(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Element counts at info level when zero, warn level otherwise
    pub fn log(&self) {
        for (count, word) in [
            (self.added_elements, "added"),
            (self.removed_elements, "removed"),
            (self.changed_elements, "changed"),
        ] {
            if count == 0 {
                info!("0 {word} elements");
            } else {
                warn!("{count} {word} element(s)");
            }
        }
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Profiles: {} added, {} removed",
            self.added_profiles, self.removed_profiles
        )?;
        writeln!(
            f,
            "Elements: {} added, {} removed, {} changed",
            self.added_elements, self.removed_elements, self.changed_elements
        )?;
        writeln!(
            f,
            "Value sets: {} added, {} removed",
            self.added_value_sets, self.removed_value_sets
        )?;
        write!(
            f,
            "Value set codes: {} added, {} removed, {} changed",
            self.added_codes, self.removed_codes, self.changed_codes
        )
    }
}

/// Added and removed element listings plus a before/after table per changed element
pub struct DiffDetails<'d, 'a>(pub &'d Differ<'a>);

impl fmt::Display for DiffDetails<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let differ = self.0;

        for (elements, word) in [
            (differ.added_elements(), "added"),
            (differ.removed_elements(), "removed"),
        ] {
            if elements.is_empty() {
                continue;
            }
            writeln!(f, "\n{} {word} element(s)", elements.len())?;
            for (key, row) in elements {
                writeln!(f, "    {}", element_heading(row))?;
                writeln!(f, "         {key}\n")?;
            }
        }

        let changed = differ.changed_elements();
        if changed.is_empty() {
            return Ok(());
        }
        writeln!(f, "\n{} changed element(s)", changed.len())?;
        for (key, changed_columns) in changed {
            let (Some(left), Some(right)) = (
                differ.left_elements().get(key),
                differ.right_elements().get(key),
            ) else {
                continue;
            };

            let mut table = Table::new();
            table.set_header(vec!["Field", "Old", "New"]);
            for column in changed_columns {
                table.add_row(vec![
                    column.clone(),
                    truncate(left.get(column).unwrap_or_default(), CELL_WIDTH),
                    truncate(right.get(column).unwrap_or_default(), CELL_WIDTH),
                ]);
            }
            writeln!(f, "{}", element_heading(left))?;
            writeln!(f, "{key}")?;
            writeln!(f, "{table}\n")?;
        }
        Ok(())
    }
}

/// [`DiffDetails`] as text, empty when nothing was added, removed or changed
pub fn render_details(differ: &Differ<'_>) -> String {
    DiffDetails(differ).to_string()
}

fn element_heading(row: &DataElementRow) -> String {
    format!(
        "{} > {} {}",
        row.group, row.profile_title, row.data_element_name
    )
}

/// Shorten to at most `width` characters, cutting at the last space and appending `...`
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(OMISSION.len());
    let head: String = text.chars().take(keep).collect();
    let head = match head.rfind(' ') {
        Some(space) if space > 0 => &head[..space],
        _ => head.as_str(),
    };
    format!("{head}{OMISSION}")
}

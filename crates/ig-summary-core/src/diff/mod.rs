//! Comparison of two data dictionaries
//!
//! [`Differ`] classifies profiles, elements, value sets and value set codes of
//! an older and a newer data dictionary as added, removed or changed.
//! [`Differ::to_workbook`] lays the result out as a diff workbook and
//! [`render_details`] as console text.

mod differ;
mod report;
mod sheets;

pub use differ::{ChangedColumns, Differ, IndexedElements, IndexedSummaries, IndexedValues};
pub use report::{DiffDetails, DiffSummary, render_details, truncate};

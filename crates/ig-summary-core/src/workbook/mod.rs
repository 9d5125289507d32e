//! Spreadsheet model
//!
//! Data dictionaries and diffs are laid out as a [`Workbook`] of named
//! [`Sheet`]s. The model carries the cell text plus the few presentation hints
//! the layout depends on (highlighted cells, hidden columns, frozen panes,
//! section rows) and leaves fonts, widths and file formats to the
//! [`WorkbookSink`] that writes it.

mod dictionary;

pub use dictionary::dictionary_workbook;

use crate::error::IgSummaryError;
use crate::result::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// How a sink should present a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    #[default]
    Data,
    /// Heading of a group of rows, e.g. one value set on the codes sheet
    Section,
    /// Emphasized annotation below the rows it refers to
    Note,
    /// Empty separator row
    Spacer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub kind: RowKind,
    pub cells: Vec<String>,
    /// Indexes of cells to highlight
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlighted: Vec<usize>,
}

impl SheetRow {
    pub fn data(cells: Vec<String>) -> Self {
        Self {
            kind: RowKind::Data,
            cells,
            highlighted: Vec::new(),
        }
    }

    pub fn section(title: impl Into<String>) -> Self {
        Self {
            kind: RowKind::Section,
            cells: vec![title.into()],
            highlighted: Vec::new(),
        }
    }

    pub fn spacer() -> Self {
        Self {
            kind: RowKind::Spacer,
            cells: Vec::new(),
            highlighted: Vec::new(),
        }
    }

    pub fn with_highlights(mut self, highlighted: Vec<usize>) -> Self {
        self.highlighted = highlighted;
        self
    }
}

/// Rows and columns kept in view while scrolling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenPane {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<SheetRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_columns: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<FrozenPane>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    pub fn frozen(mut self, rows: usize, columns: usize) -> Self {
        self.frozen = Some(FrozenPane { rows, columns });
        self
    }

    pub fn push(&mut self, row: SheetRow) {
        self.rows.push(row);
    }

    /// Add a data row whose cells follow [`Sheet::columns`]
    pub fn push_cells<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows
            .push(SheetRow::data(cells.into_iter().map(Into::into).collect()));
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn hide_column(&mut self, index: usize) {
        if !self.hidden_columns.contains(&index) {
            self.hidden_columns.push(index);
        }
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden_columns.contains(&index)
    }

    /// Data rows, skipping sections, notes and spacers
    pub fn data_rows(&self) -> impl Iterator<Item = &SheetRow> {
        self.rows.iter().filter(|row| row.kind == RowKind::Data)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}

/// Destination for a finished workbook
pub trait WorkbookSink {
    /// Write `workbook` under the file stem `name`, returning the written path
    fn write(&self, workbook: &Workbook, name: &str) -> Result<PathBuf>;
}

/// Writes the workbook model as pretty JSON to `<dir>/<name>.workbook.json`
#[derive(Debug, Clone)]
pub struct JsonWorkbookSink {
    output_dir: PathBuf,
}

impl JsonWorkbookSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl WorkbookSink for JsonWorkbookSink {
    fn write(&self, workbook: &Workbook, name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{name}.workbook.json"));
        let json = serde_json::to_string_pretty(workbook)?;
        std::fs::write(&path, json).map_err(|e| IgSummaryError::io_error(&path, e))?;
        info!("Workbook written to {}", path.display());
        Ok(path)
    }
}

//! Grid to record conversion shared by every reader.
//!
//! Readers produce a raw grid of cells, header row first. This module names
//! the columns, drops blank rows and reports rows whose key set differs from
//! the first record.

use std::collections::{BTreeSet, HashMap};

use auditdesk_core::cell::{CellValue, RowRecord};

const EMPTY_HEADER: &str = "__EMPTY";

/// A record whose populated columns differ from the first record's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDrift {
    /// Position of the record in [`ParsedSheet::records`].
    pub row_index: usize,
    /// Canonical columns absent from this record.
    pub missing: Vec<String>,
    /// Columns present in this record but not in the canonical set.
    pub extra: Vec<String>,
}

/// First sheet of a checklist file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub sheet_name: String,
    /// Key set of the first record, in column order.
    pub columns: Vec<String>,
    pub records: Vec<RowRecord>,
    pub drift: Vec<ColumnDrift>,
}

impl ParsedSheet {
    /// Build records from a raw grid whose first row is the header.
    #[must_use]
    pub fn from_grid(sheet_name: impl Into<String>, grid: Vec<Vec<CellValue>>) -> Self {
        let mut rows = grid.into_iter();
        let width = rows.len();
        let header_row = rows.next().unwrap_or_default();
        let mut data: Vec<Vec<CellValue>> = Vec::with_capacity(width.saturating_sub(1));
        let mut max_width = header_row.len();
        for row in rows {
            max_width = max_width.max(row.len());
            data.push(row);
        }

        let headers = name_headers(&header_row, max_width);
        let records: Vec<RowRecord> = data
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row)
                    .collect::<RowRecord>()
            })
            .collect();

        let columns: Vec<String> = records
            .first()
            .map(|first| first.columns().map(String::from).collect())
            .unwrap_or_default();
        let drift = find_drift(&columns, &records);

        Self {
            sheet_name: sheet_name.into(),
            columns,
            records,
            drift,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}

/// Header text for each column. Blank cells become `__EMPTY`, repeated
/// names get `_1`, `_2`, ... suffixes.
fn name_headers(header_row: &[CellValue], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(width);

    for column in 0..width {
        let raw = header_row
            .get(column)
            .map(|cell| cell.display_text().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| EMPTY_HEADER.to_string());

        let name = match seen.get(&raw).copied() {
            None => {
                seen.insert(raw.clone(), 1);
                raw
            }
            Some(mut counter) => {
                let mut candidate = format!("{raw}_{counter}");
                counter += 1;
                while seen.contains_key(&candidate) {
                    candidate = format!("{raw}_{counter}");
                    counter += 1;
                }
                seen.insert(raw, counter);
                seen.insert(candidate.clone(), 1);
                candidate
            }
        };
        names.push(name);
    }
    names
}

fn find_drift(columns: &[String], records: &[RowRecord]) -> Vec<ColumnDrift> {
    let canonical: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
    records
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(row_index, record)| {
            let missing: Vec<String> = columns
                .iter()
                .filter(|c| !record.contains(c))
                .cloned()
                .collect();
            let extra: Vec<String> = record
                .columns()
                .filter(|c| !canonical.contains(c))
                .map(String::from)
                .collect();
            if missing.is_empty() && extra.is_empty() {
                None
            } else {
                Some(ColumnDrift {
                    row_index,
                    missing,
                    extra,
                })
            }
        })
        .collect()
}

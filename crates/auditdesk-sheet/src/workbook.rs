//! Binary and XML workbooks via calamine.

use std::io::Cursor;

use auditdesk_core::cell::CellValue;
use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::ParseError;

/// Read the first sheet of a workbook into a raw grid.
pub(crate) fn read_first_sheet(bytes: &[u8]) -> Result<(String, Vec<Vec<CellValue>>), ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::NoSheets)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoSheets)?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    tracing::debug!(sheet = %sheet_name, rows = range.height(), "read workbook sheet");

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Ok((sheet_name, grid))
}

/// Map a calamine cell onto a [`CellValue`]. Dates keep their serial number;
/// error cells keep their display text.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            CellValue::Text(s.clone())
        }
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn scalar_cells_map_directly() {
        assert_eq!(cell_from_data(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_from_data(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Boolean(true));
        assert_eq!(
            cell_from_data(&Data::String("Exits clear?".into())),
            CellValue::Text("Exits clear?".into())
        );
    }

    #[test]
    fn empty_strings_are_empty_cells() {
        assert_eq!(cell_from_data(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn error_cells_become_text() {
        assert_eq!(
            cell_from_data(&Data::Error(CellErrorType::Div0)),
            CellValue::Text("#DIV/0!".into())
        );
    }

    #[test]
    fn corrupt_zip_is_unreadable() {
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(&[0; 64]);
        assert!(matches!(
            read_first_sheet(&bytes),
            Err(ParseError::Workbook(_))
        ));
    }
}

//! # auditdesk-sheet
//!
//! Turns an uploaded checklist file into ordered row records.
//!
//! Only the first sheet is read. The first row supplies column names; every
//! later non-blank row becomes one [`RowRecord`](auditdesk_core::cell::RowRecord).
//! Cells keep their sheet type (text, number, boolean) and blank cells are
//! left out of the record. No schema validation happens here.

mod delimited;
mod detect;
mod error;
mod sheet;
mod workbook;

pub use delimited::CSV_SHEET_NAME;
pub use detect::{ACCEPTED_EXTENSIONS, SheetFormat, accepted_extension, detect_format};
pub use error::ParseError;
pub use sheet::{ColumnDrift, ParsedSheet};

/// Parse the first sheet of a workbook or CSV file.
///
/// # Errors
///
/// Returns `ParseError` when the bytes are empty, not a recognized format,
/// or a workbook without sheets.
pub fn parse_first_sheet(bytes: &[u8]) -> Result<ParsedSheet, ParseError> {
    let format = detect_format(bytes)?;
    let (sheet_name, grid) = if format.is_workbook() {
        workbook::read_first_sheet(bytes)?
    } else {
        (CSV_SHEET_NAME.to_string(), delimited::read_csv(bytes)?)
    };
    let parsed = ParsedSheet::from_grid(sheet_name, grid);
    tracing::debug!(
        ?format,
        sheet = %parsed.sheet_name,
        rows = parsed.row_count(),
        columns = parsed.columns.len(),
        "parsed checklist sheet"
    );
    Ok(parsed)
}

/// Like [`parse_first_sheet`], rejecting inputs over `max_bytes` up front.
///
/// # Errors
///
/// Returns `ParseError::TooLarge` before any parsing when the input exceeds
/// the limit, otherwise whatever [`parse_first_sheet`] returns.
pub fn parse_with_limit(bytes: &[u8], max_bytes: usize) -> Result<ParsedSheet, ParseError> {
    if bytes.len() > max_bytes {
        return Err(ParseError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    parse_first_sheet(bytes)
}

//! Comma separated text.

use auditdesk_core::cell::CellValue;

use crate::ParseError;

/// Name given to the single sheet of a CSV file.
pub const CSV_SHEET_NAME: &str = "Sheet1";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub(crate) fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(infer_cell).collect());
    }
    Ok(grid)
}

/// Infer a typed cell from CSV text: blank, boolean, number, else text.
pub(crate) fn infer_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    if looks_numeric(trimmed)
        && let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return CellValue::Number(n);
    }
    CellValue::Text(raw.to_string())
}

/// `f64::from_str` also accepts `inf`, `NaN` and friends; those stay text.
fn looks_numeric(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && s.bytes().any(|b| b.is_ascii_digit())
}

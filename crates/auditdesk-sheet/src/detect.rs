//! Content-based format detection.
//!
//! File names lie, so the reader is picked from the leading bytes.

use crate::ParseError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Extensions offered when picking a checklist file.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv", "ods"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Office Open XML or OpenDocument, both ZIP containers.
    ZipWorkbook,
    /// Legacy binary `.xls` in an OLE compound file.
    OleWorkbook,
    /// UTF-8 delimited text.
    Delimited,
}

impl SheetFormat {
    #[must_use]
    pub const fn is_workbook(self) -> bool {
        matches!(self, Self::ZipWorkbook | Self::OleWorkbook)
    }
}

/// # Errors
///
/// Returns `ParseError::Empty` for zero bytes and
/// `ParseError::UnrecognizedFormat` for binary data that is neither a
/// workbook nor UTF-8 text.
pub fn detect_format(bytes: &[u8]) -> Result<SheetFormat, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC) {
        return Ok(SheetFormat::ZipWorkbook);
    }
    if bytes.starts_with(OLE_MAGIC) {
        return Ok(SheetFormat::OleWorkbook);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Ok(SheetFormat::Delimited);
    }
    Err(ParseError::UnrecognizedFormat)
}

/// Whether `file_name` ends in one of [`ACCEPTED_EXTENSIONS`], case-insensitively.
#[must_use]
pub fn accepted_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

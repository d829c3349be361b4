use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Checklist file is empty")]
    Empty,

    #[error("Checklist file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Not a recognized spreadsheet or CSV file")]
    UnrecognizedFormat,

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Unreadable workbook: {0}")]
    Workbook(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

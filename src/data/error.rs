use thiserror::Error;

/// Structured reasons a tracking file cannot become a dataset.
///
/// All of these are fatal at startup: the dashboard never renders a partial
/// dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("workbook contains no worksheets")]
    NoSheets,

    #[error("first worksheet is empty (no header row)")]
    EmptySheet,

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}', row {row}: cannot parse '{value}' as a timestamp")]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read workbook: {0}")]
    Workbook(String),

    /// A required vendor column is absent. Fatal for the whole file.
    #[error("Missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A cell could not be coerced. Fatal for the whole file; `row` is 1-based
    /// within the data rows (the header is not counted).
    #[error("Row {row}: cannot parse {column} from {value:?} (expected {expected})")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl DashError {
    /// True for the two whole-file normalization failures.
    pub fn is_normalization(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

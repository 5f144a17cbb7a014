use thiserror::Error;

#[derive(Debug, Error)]
pub enum CongestionError {
    /// Required columns absent from the dataset header, in lookup order.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("dataset has no header row")]
    EmptyDataset,

    #[error("sheet not found in workbook: {0}")]
    SheetNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CongestionError {
    /// Errors caused by user input rather than by processing faults.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CongestionError::MissingColumns(_) | CongestionError::InvalidParameter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CongestionError>;

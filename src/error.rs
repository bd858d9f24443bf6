//! Error types for the shapefile cursor engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShapeError>;

#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cursor is not on a row: {0}")]
    CursorNotPositioned(String),

    #[error("A column named '{0}' was not found in the result set")]
    ColumnNotFound(String),

    #[error("The column index ({index}) is not within the range of 1 and {count}")]
    InvalidColumn { index: usize, count: usize },

    #[error("Column '{column}' ({found}) cannot be returned as a {target}")]
    TypeConversion {
        column: String,
        target: &'static str,
        found: String,
    },

    #[error("Could not convert a null value in column '{0}' to the appropriate default")]
    NullConversion(String),

    /// The seek-then-read protocol returned a different record than requested.
    /// Fatal for the owning result set.
    #[error("Record sync lost: expected record {expected}, read {}", describe_found(.found))]
    RecordSync { expected: usize, found: Option<usize> },

    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data corruption: {0}")]
    Corruption(String),

    #[error("File not found: {0}")]
    FileNotFound(std::path::PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_found(found: &Option<usize>) -> String {
    match found {
        Some(n) => n.to_string(),
        None => "nothing".to_string(),
    }
}

impl ShapeError {
    /// True for errors a caller may recover from by retrying with another
    /// column or representation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShapeError::CursorNotPositioned(_)
                | ShapeError::ColumnNotFound(_)
                | ShapeError::InvalidColumn { .. }
                | ShapeError::TypeConversion { .. }
                | ShapeError::NullConversion(_)
        )
    }
}

impl From<serde_json::Error> for ShapeError {
    fn from(err: serde_json::Error) -> Self {
        ShapeError::Config(err.to_string())
    }
}

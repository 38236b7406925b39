use std::path::PathBuf;
use thiserror::Error;

pub type SheetmapResult<T> = Result<T, SheetmapError>;

#[derive(Error, Debug)]
pub enum SheetmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cannot read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Cannot write {path}: file is open in another program or not writable")]
    WriteConflict { path: PathBuf },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Mapping store error: {0}")]
    Store(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

impl SheetmapError {
    pub fn workbook(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        SheetmapError::Workbook {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Why a single worksheet was skipped. The rest of the batch keeps going.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("missing mapped columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("unreadable sheet: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Write(#[from] SheetmapError),
}

/// A row that could not be (fully) split. The row is kept as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowWarning {
    #[error("row {row}: column '{column}' not present in row")]
    ColumnAbsent { row: usize, column: String },

    #[error("row {row}: cannot split column '{column}': {reason}")]
    SplitFailed {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("split column '{column}' is not part of the mapped columns")]
    UnknownSplitColumn { column: String },
}

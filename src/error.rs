use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library entry points.
///
/// Per-sentence tokenizer failures and per-keyword test failures are not
/// represented here: they are recovered locally and reported alongside the
/// results instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed for {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("no .txt or .pdf files found under {}", .0.display())]
    NoInput(PathBuf),
    #[error("tokenizer initialization failed: {0}")]
    TokenizerInit(String),
    #[error("invalid ending policy: {0}")]
    InvalidPolicy(String),
    #[error("at least one keyword is required for association testing")]
    NoKeywords,
    #[error("Combined run aborted: {0}")]
    CombinedAborted(String),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PrepError {
    #[error("GDC request failed: {0}")]
    GdcHttp(String),

    #[error("GDC returned status {status}: {message}")]
    GdcStatus { status: u16, message: String },

    #[error("failed to parse GDC response: {0}")]
    GdcParse(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read reports file at {path}: {message}")]
    ReportsRead { path: PathBuf, message: String },

    #[error("delimited output error: {0}")]
    Delimited(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("embedding failed for {case_id}/{file_id}: {message}")]
    Embedding {
        case_id: String,
        file_id: String,
        message: String,
    },
}

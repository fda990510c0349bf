use std::{path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Command Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("String Conversion Error: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("Could not read pip output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Line {line_no}: cannot parse '{line}': {reason}")]
    Parse {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("Select a requirements.txt file first")]
    ManifestNotSelected,

    #[error("Requirements file does not exist: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Select a Python environment first")]
    InterpreterNotSelected,

    #[error("No Python interpreter found in {}", .0.display())]
    InterpreterNotFound(PathBuf),

    #[error("Python environment at {} does not work: {reason}", .path.display())]
    InterpreterUnusable { path: PathBuf, reason: String },

    #[error("{command} failed{}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Another command is still running")]
    Busy,

    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn parse(line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

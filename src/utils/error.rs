// Common error types for chainops

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainopsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error in {file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("'{program}' exited with code {code}{}", format_stderr(.stderr))]
    Execution {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0} Cargo.toml file(s) are not sorted")]
    Unsorted(usize),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl ChainopsError {
    /// Attach a path to an IO error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainopsError>;

/// Error as presented to the operator, with the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub exit_code: i32,
}

impl UserError {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const EXECUTION: i32 = 3;

    pub fn from_error(err: &ChainopsError) -> Self {
        let exit_code = match err {
            ChainopsError::Config(_) | ChainopsError::Validation(_) => Self::USAGE,
            ChainopsError::Execution { .. } => Self::EXECUTION,
            _ => Self::GENERAL,
        };

        Self {
            message: err.to_string(),
            exit_code,
        }
    }

    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
    }
}

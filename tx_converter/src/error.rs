//! Converter error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Texture tool not found: {tool} ({hint})")]
    ToolNotFound { tool: String, hint: String },

    #[error("Input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unsupported texture extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Output would overwrite its source: {}", .0.display())]
    OutputConflict(PathBuf),

    #[error("Rename target already exists: {}", .0.display())]
    RenameConflict(PathBuf),

    #[error("Unsafe directory: {0}")]
    UnsafeDirectory(#[from] shared_utils::SafetyError),

    #[error("Failed to launch {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("Failed to create worker pool: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TxError>;

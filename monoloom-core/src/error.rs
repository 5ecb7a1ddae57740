//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in {context}: {error}")]
    Json {
        error: serde_json::Error,
        context: String,
    },

    #[error("Config file not found: {0}. Expected 'packages.json' in the current directory.")]
    ConfigNotFound(PathBuf),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Link creation failed for {path}: {message}")]
    Link { path: PathBuf, message: String },

    #[error("Manifest write failed for {package}: {message}")]
    ManifestWrite { package: String, message: String },

    #[error("Reference write failed for {package}: {message}")]
    ReferenceWrite { package: String, message: String },

    #[error("Module analysis failed for {package}: {message}")]
    Analysis { package: String, message: String },

    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    #[error("Task join error: {0}")]
    Join(String),
}

impl Error {
    pub fn json(error: serde_json::Error, context: impl Into<String>) -> Self {
        Error::Json {
            error,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

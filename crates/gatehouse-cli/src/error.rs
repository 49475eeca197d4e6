//! CLI error types.

use std::fmt;

use gatehouse_core::{CatalogError, ValidationError, ViewerError};

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(String),

    /// Contact form incomplete
    Validation(ValidationError),

    /// Catalog file unreadable or malformed
    Catalog(String),

    /// Resource URL cannot be opened
    Viewer(ViewerError),

    /// Resource is gated and the visitor is locked
    Locked,

    /// Terminal or file I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Validation(err) => write!(f, "invalid contact: {}", err),
            Self::Catalog(msg) => write!(f, "catalog error: {}", msg),
            Self::Viewer(err) => write!(f, "viewer error: {}", err),
            Self::Locked => write!(f, "gated resource is locked; run `gatehouse grant` first"),
            Self::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Viewer(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<ViewerError> for CliError {
    fn from(err: ViewerError) -> Self {
        Self::Viewer(err)
    }
}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

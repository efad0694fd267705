use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::services::{mpd::MpdError, mpris::MprisError};

/// Error types for the mpd-mpris application.
///
/// Covers configuration loading and validation as well as failures surfacing
/// from the MPD and D-Bus sides while the bridge runs.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Session bus failure outside an interface call
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// MPD connection or protocol failure
    #[error(transparent)]
    Mpd(#[from] MpdError),

    /// Bridge failure
    #[error(transparent)]
    Mpris(#[from] MprisError),
}

/// A specialized `Result` type for mpd-mpris operations.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Creates a validation error for `component`.
    pub fn validation(component: &str, details: impl Into<String>) -> Self {
        AppError::ConfigValidation {
            component: component.to_string(),
            details: details.into(),
        }
    }

    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        AppError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates an I/O error with file path context.
    pub fn io(error: impl std::fmt::Display, path: &Path) -> Self {
        AppError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }
}

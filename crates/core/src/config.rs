//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services, so request
//! handling never reads process-wide environment variables.

use crate::constants::DEFAULT_DATA_FILE;
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if the path is empty, names an existing
    /// directory, or its parent directory does not exist.
    pub fn new(data_file: PathBuf) -> PatientResult<Self> {
        if data_file.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "data file path cannot be empty".into(),
            ));
        }

        if data_file.is_dir() {
            return Err(PatientError::InvalidInput(format!(
                "data file path is a directory: {}",
                data_file.display()
            )));
        }

        // A bare filename has an empty parent, meaning the working directory.
        if let Some(parent) = data_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(PatientError::InvalidInput(format!(
                    "data file directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        Ok(Self { data_file })
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

/// Resolve the store path from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATA_FILE`].
pub fn data_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

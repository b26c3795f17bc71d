#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("patient already exists: {0}")]
    Conflict(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read patient store: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write patient store: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize patient store: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize patient store: {0}")]
    Deserialization(serde_path_to_error::Error<serde_json::Error>),
}

impl PatientError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        PatientError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures of the backing store rather than of the request.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            PatientError::FileRead(_)
                | PatientError::FileWrite(_)
                | PatientError::Serialization(_)
                | PatientError::Deserialization(_)
        )
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

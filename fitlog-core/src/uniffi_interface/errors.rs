use thiserror::Error as ThisError;
use uniffi::Error;

#[derive(Debug, ThisError, Error)]
#[non_exhaustive]
pub enum FitlogError {
    #[error("error: {0}")]
    Common(String),
}

impl From<anyhow::Error> for FitlogError {
    fn from(e: anyhow::Error) -> Self {
        // Alternate formatting keeps the context chain.
        FitlogError::Common(format!("{:#}", e))
    }
}

impl From<String> for FitlogError {
    fn from(s: String) -> Self {
        FitlogError::Common(s)
    }
}

impl From<&str> for FitlogError {
    fn from(s: &str) -> Self {
        FitlogError::Common(s.to_string())
    }
}

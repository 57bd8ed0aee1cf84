use std::fmt;

use color_eyre::eyre::{eyre, Error as EyreError};

/// Failures that have no dedicated variant, carried as an eyre report.
#[derive(Debug)]
pub struct OtherError(EyreError);

impl fmt::Display for OtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for OtherError {}

impl PartialEq for OtherError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl From<EyreError> for OtherError {
    fn from(err: EyreError) -> Self {
        OtherError(err)
    }
}

impl From<String> for OtherError {
    fn from(error_string: String) -> Self {
        OtherError(eyre!(error_string))
    }
}

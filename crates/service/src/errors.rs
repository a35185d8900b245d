use thiserror::Error;

use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Service(#[from] SettingsError),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn banner_not_found(id: &str) -> Self {
        Self::NotFound(format!("The following banner was not found: {id}"))
    }

    /// True for problems in the caller's input, as opposed to failures of the settings service.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

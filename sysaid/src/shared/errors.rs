use thiserror::Error;

use crate::infrastructure::config::ConfigError;
use crate::modules::assistant::application::ApplicationError;
use crate::modules::assistant::ports::{ReasoningError, RepositoryError};

/// 应用级错误（组装和入口层使用）
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] RepositoryError),

    #[error("Reasoning error: {0}")]
    ReasoningError(#[from] ReasoningError),

    #[error(transparent)]
    ApplicationError(#[from] ApplicationError),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

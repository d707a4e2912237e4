use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarningError {
    #[error("failed to load dataset {path}: {message}")]
    DataLoad { path: PathBuf, message: String },

    #[error("no weekly case records found for region '{region}'")]
    EmptySeries { region: String },

    #[error("forecast model could not be fitted: {0}")]
    ModelFit(String),
}

impl WarningError {
    pub fn data_load(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        WarningError::DataLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn model_fit(message: impl Into<String>) -> Self {
        WarningError::ModelFit(message.into())
    }
}

pub type Result<T> = std::result::Result<T, WarningError>;

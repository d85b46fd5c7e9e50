//! コアのエラー型

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("The process has been terminated")]
    SinkTerminated,

    #[error("Invalid web app id: {0}")]
    InvalidWebAppId(String),

    #[error("Invalid image name: {0}")]
    InvalidImage(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, CoreError>;

use thiserror::Error;
use wadeploy_core::CoreError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No wadeploy config file found. Looked in:\n\
        - current directory: wadeploy.local.yaml, .wadeploy.local.yaml, wadeploy.yaml, .wadeploy.yaml\n\
        - ./.wadeploy/ directory\n\
        - ~/.config/wadeploy/wadeploy.yaml\n\
        Set WADEPLOY_CONFIG to point at a file directly"
    )]
    ConfigFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing setting: {0} (set it in the config file or pass it on the command line)")]
    MissingField(&'static str),

    #[error("Environment variable {name} referenced in {field} is not set")]
    UndefinedVariable { name: String, field: &'static str },

    #[error("Invalid deploy settings: {0}")]
    InvalidJob(#[from] CoreError),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("pom.xml not found: {0}")]
    PomNotFound(PathBuf),

    #[error("Invalid pom.xml {path}: {message}")]
    InvalidPom { path: PathBuf, message: String },

    #[error("Build artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Invalid tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Maven goal '{goal}' failed: {message}")]
    MavenFailed { goal: String, message: String },

    #[error("Invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// よくあるケースの対処ヒント付きのエラーテキスト
    pub fn user_message(&self) -> String {
        match self {
            BuildError::PomNotFound(path) => {
                format!(
                    "pom.xml not found: {}\n\
                     \n\
                     Point --project at the directory containing pom.xml.",
                    path.display()
                )
            }
            BuildError::ArtifactNotFound(path) => {
                format!(
                    "Build artifact not found: {}\n\
                     \n\
                     Run `mvn package` first, or pass --package.",
                    path.display()
                )
            }
            BuildError::DockerConnection(e) => {
                format!(
                    "Docker connection error: {}\n\
                     \n\
                     Check that the Docker daemon is running and DOCKER_HOST is correct.",
                    e
                )
            }
            BuildError::PushFailed { message } => {
                format!(
                    "Push failed: {}\n\
                     \n\
                     Check the registry server, username and password.",
                    message
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;

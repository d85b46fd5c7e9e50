use thiserror::Error;
use wadeploy_build::BuildError;
use wadeploy_cloud::CloudError;
use wadeploy_core::CoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Web app update failed: {0}")]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Deploy job was cancelled")]
    Cancelled,

    #[error("Deploy job panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// ジョブ失敗時にコンソールへ書き込むテキスト
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Build(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

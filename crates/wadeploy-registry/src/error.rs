//! レジストリクライアントのエラー型

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 失敗ステータス。`message` はサーバーの返したメッセージ
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Malformed link header: {0}")]
    MalformedLink(String),

    #[error("Invalid repository name: '{0}'")]
    InvalidRepository(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

//! レジストリHTTP APIクライアント

use crate::cursor::PaginationCursor;
use crate::error::{RegistryError, Result};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wadeploy_core::RegistryCredential;

pub const CATALOG_PATH: &str = "/v2/_catalog";
pub const HEADER_LINK: &str = "link";

#[derive(Debug, Deserialize)]
struct CatalogPage {
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagsPage {
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: String,
}

/// レジストリのリポジトリとタグを一覧する
///
/// ホストが一度だけ作って共有する `reqwest::Client` を包み、
/// コネクションプールを呼び出し間で再利用する。呼び出し間で状態は持たず、
/// 各リクエストは渡された認証情報で認証する。
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// レジストリの全リポジトリ（サーバーの順序）
    pub async fn list_repositories(&self, credential: &RegistryCredential) -> Result<Vec<String>> {
        self.paginate(credential, CATALOG_PATH.to_string(), |page: CatalogPage| {
            page.repositories.unwrap_or_default()
        })
        .await
    }

    /// `repository` の全タグ（サーバーの順序）
    pub async fn list_tags(
        &self,
        credential: &RegistryCredential,
        repository: &str,
    ) -> Result<Vec<String>> {
        let repository = repository.trim_matches('/');
        if repository.is_empty() || repository.contains(char::is_whitespace) {
            return Err(RegistryError::InvalidRepository(repository.to_string()));
        }
        self.paginate(
            credential,
            format!("/v2/{}/tags/list", repository),
            |page: TagsPage| page.tags.unwrap_or_default(),
        )
        .await
    }

    /// `first_path` と、その後にリンクされた全ページを取得
    ///
    /// ページ数の上限はない。常に `link` ヘッダーを返すサーバーでは
    /// ループし続ける。
    async fn paginate<T, F>(
        &self,
        credential: &RegistryCredential,
        first_path: String,
        extract: F,
    ) -> Result<Vec<String>>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Vec<String>,
    {
        let base_url = credential.base_url();
        let mut names = Vec::new();
        let mut next = Some(PaginationCursor::new(first_path));

        while let Some(cursor) = next.take() {
            let url = format!("{}{}", base_url, cursor.path());
            tracing::debug!("GET {}", url);

            let response = self
                .http
                .get(&url)
                .header(AUTHORIZATION, credential.basic_auth_header())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Self::server_error(response).await);
            }

            let link = match response.headers().get(HEADER_LINK) {
                Some(value) => Some(String::from_utf8(value.as_bytes().to_vec()).map_err(|_| {
                    RegistryError::MalformedLink(String::from_utf8_lossy(value.as_bytes()).into_owned())
                })?),
                None => None,
            };

            let body = response.bytes().await?;
            let page: T = serde_json::from_slice(&body)?;
            names.extend(extract(page));

            next = match link {
                Some(header) => PaginationCursor::from_link_header(&header)?,
                None => None,
            };
        }

        Ok(names)
    }

    /// サーバーのメッセージ付きのエラー。本文の最初のレジストリエラー
    /// メッセージ、なければHTTPのリーズンフレーズ
    async fn server_error(response: reqwest::Response) -> RegistryError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.errors.into_iter().map(|e| e.message).find(|m| !m.is_empty()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        tracing::debug!("Registry returned {}: {}", status, message);
        RegistryError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

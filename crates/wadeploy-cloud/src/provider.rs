//! Webアプリプロバイダーのトレイト定義

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wadeploy_core::{PrivateRegistryImageSetting, WebAppTarget};

/// Webアプリをコンテナイメージに向けるもの
#[async_trait]
pub trait WebAppProvider: Send + Sync {
    /// ログ用のプロバイダー名（例: "azure"）
    fn name(&self) -> &str;

    /// `target` が `setting` のイメージを実行するよう再設定する。
    /// イメージの取得には `setting` の認証情報を使う。
    ///
    /// `Ok(None)` は更新は成功したが、その後アプリを読み戻せなかったことを表す。
    async fn update_container_image(
        &self,
        target: &WebAppTarget,
        setting: &PrivateRegistryImageSetting,
    ) -> Result<Option<WebApp>>;
}

/// プロバイダーが返すWebアプリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebApp {
    pub id: Option<String>,
    pub name: Option<String>,
    pub default_host_name: Option<String>,
}

impl WebApp {
    /// `http://{name}.azurewebsites.net/{project}`（アプリに名前がある場合）
    pub fn public_url(&self, project_name: &str) -> Option<String> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|name| format!("http://{}.azurewebsites.net/{}", name, project_name))
    }
}

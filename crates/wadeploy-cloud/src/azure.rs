//! Azure App Service クライアント
//!
//! Bearerトークンで Azure Resource Manager と直接やり取りする。
//! LinuxのWebアプリをプライベートレジストリのイメージに切り替えるのに
//! 必要な3つの呼び出しのみを実装している。

use crate::error::{CloudError, Result};
use crate::provider::{WebApp, WebAppProvider};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use wadeploy_core::{PrivateRegistryImageSetting, WebAppTarget};

pub const ARM_ENDPOINT: &str = "https://management.azure.com";
const API_VERSION: &str = "2022-03-01";

const SETTING_REGISTRY_URL: &str = "DOCKER_REGISTRY_SERVER_URL";
const SETTING_REGISTRY_USERNAME: &str = "DOCKER_REGISTRY_SERVER_USERNAME";
const SETTING_REGISTRY_PASSWORD: &str = "DOCKER_REGISTRY_SERVER_PASSWORD";

/// Azureクライアントの設定
#[derive(Clone)]
pub struct AzureConfig {
    pub access_token: String,
    pub endpoint: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            endpoint: ARM_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 環境変数からAzureConfigを作成
    ///
    /// `AZURE_ACCESS_TOKEN` は必須。`AZURE_RESOURCE_MANAGER_ENDPOINT` で
    /// パブリッククラウドのエンドポイントを上書きできる。
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("AZURE_ACCESS_TOKEN")
            .map_err(|_| CloudError::MissingEnvVar("AZURE_ACCESS_TOKEN".to_string()))?;
        let config = Self::new(access_token);
        Ok(match std::env::var("AZURE_RESOURCE_MANAGER_ENDPOINT") {
            Ok(endpoint) if !endpoint.is_empty() => config.with_endpoint(endpoint),
            _ => config,
        })
    }
}

/// [`WebAppProvider`] の Azure App Service 実装
pub struct AzureWebApps {
    client: reqwest::Client,
    access_token: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ArmErrorResponse {
    error: ArmError,
}

#[derive(Debug, Deserialize)]
struct ArmError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ArmSite {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    properties: ArmSiteProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmSiteProperties {
    default_host_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppSettings {
    #[serde(default)]
    properties: Map<String, Value>,
}

impl AzureWebApps {
    /// `client` はホスト全体で共有される
    pub fn new(client: reqwest::Client, config: AzureConfig) -> Self {
        Self {
            client,
            access_token: config.access_token,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, web_app_id: &str, suffix: &str) -> String {
        format!(
            "{}{}{}?api-version={}",
            self.endpoint,
            web_app_id.trim_end_matches('/'),
            suffix,
            API_VERSION
        )
    }

    /// 失敗レスポンスをARMのメッセージ付きのエラーに変換
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ArmErrorResponse>(&body) {
            Ok(err) if !err.error.message.is_empty() => {
                format!("{}: {}", err.error.code, err.error.message)
            }
            _ => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(CloudError::AuthenticationFailed(message));
        }
        Err(CloudError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    /// サイトがイメージを実行するよう `linuxFxVersion` を設定
    async fn set_linux_fx_version(&self, web_app_id: &str, image: &str) -> Result<()> {
        let body = json!({
            "properties": {
                "linuxFxVersion": format!("DOCKER|{}", image),
            }
        });
        let response = self
            .client
            .patch(self.url(web_app_id, "/config/web"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_app_settings(&self, web_app_id: &str) -> Result<Map<String, Value>> {
        let response = self
            .client
            .post(self.url(web_app_id, "/config/appsettings/list"))
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        let settings: AppSettings = Self::check(response).await?.json().await?;
        Ok(settings.properties)
    }

    /// 既存のアプリ設定にレジストリ設定をマージ
    async fn set_registry_settings(
        &self,
        web_app_id: &str,
        setting: &PrivateRegistryImageSetting,
    ) -> Result<()> {
        let mut properties = self.list_app_settings(web_app_id).await?;
        properties.insert(
            SETTING_REGISTRY_URL.to_string(),
            Value::String(setting.credential.base_url()),
        );
        properties.insert(
            SETTING_REGISTRY_USERNAME.to_string(),
            Value::String(setting.credential.username.clone()),
        );
        properties.insert(
            SETTING_REGISTRY_PASSWORD.to_string(),
            Value::String(setting.credential.password.clone()),
        );

        let response = self
            .client
            .put(self.url(web_app_id, "/config/appsettings"))
            .bearer_auth(&self.access_token)
            .json(&json!({ "properties": properties }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// サイトを読み戻す。存在しなければ `None`
    pub async fn get_web_app(&self, web_app_id: &str) -> Result<Option<WebApp>> {
        let response = self
            .client
            .get(self.url(web_app_id, ""))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let site: ArmSite = Self::check(response).await?.json().await?;
        Ok(Some(WebApp {
            id: site.id,
            name: site.name,
            default_host_name: site.properties.default_host_name,
        }))
    }
}

#[async_trait]
impl WebAppProvider for AzureWebApps {
    fn name(&self) -> &str {
        "azure"
    }

    async fn update_container_image(
        &self,
        target: &WebAppTarget,
        setting: &PrivateRegistryImageSetting,
    ) -> Result<Option<WebApp>> {
        let image = setting.full_image();
        tracing::info!("Updating {} to {}", target.web_app_id, image);

        self.set_linux_fx_version(&target.web_app_id, &image).await?;
        self.set_registry_settings(&target.web_app_id, setting)
            .await?;
        self.get_web_app(&target.web_app_id).await
    }
}

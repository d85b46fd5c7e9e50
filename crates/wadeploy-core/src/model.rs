//! デプロイのデータモデル

use crate::error::{CoreError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// プライベートコンテナレジストリの認証情報
///
/// `Authorization: Basic` ヘッダーかデーモン用の認証情報にだけ変換され、
/// 派生した値はキャッシュしない。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredential {
    /// レジストリホスト（例: `myregistry.azurecr.io`）。スキーム付きも許容
    pub server_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredential")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

impl RegistryCredential {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Basic base64(username:password)`
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    /// スキームと末尾のスラッシュを除いたレジストリホスト
    ///
    /// # Examples
    /// - `myacr.azurecr.io` -> `myacr.azurecr.io`
    /// - `https://myacr.azurecr.io/` -> `myacr.azurecr.io`
    pub fn host(&self) -> &str {
        let server = self.server_url.trim();
        let server = server
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(server);
        server.trim_end_matches('/')
    }

    /// レジストリAPIのベースURL。スキーム指定がなければ `https://`
    pub fn base_url(&self) -> String {
        let server = self.server_url.trim().trim_end_matches('/');
        if server.contains("://") {
            server.to_string()
        } else {
            format!("https://{}", server)
        }
    }
}

/// レジストリの認証情報と、そこへ公開するタグ付きイメージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateRegistryImageSetting {
    #[serde(flatten)]
    pub credential: RegistryCredential,
    /// 例: `myapp:latest`
    pub image_name_with_tag: String,
}

impl PrivateRegistryImageSetting {
    pub fn new(credential: RegistryCredential, image_name_with_tag: impl Into<String>) -> Self {
        Self {
            credential,
            image_name_with_tag: image_name_with_tag.into(),
        }
    }

    /// 対象イメージのリポジトリとタグ。タグのデフォルトは `latest`
    ///
    /// # Examples
    /// - `myapp:v1` -> `("myapp", "v1")`
    /// - `team/myapp` -> `("team/myapp", "latest")`
    pub fn repository_and_tag(&self) -> (&str, &str) {
        let image = self.image_name_with_tag.as_str();
        match image.rfind(':') {
            Some(pos) if !image[pos + 1..].contains('/') => (&image[..pos], &image[pos + 1..]),
            _ => (image, "latest"),
        }
    }

    /// レジストリ付きのリポジトリ名（タグなし）。例: `myacr.azurecr.io/myapp`
    pub fn remote_repository(&self) -> String {
        let (repository, _) = self.repository_and_tag();
        format!("{}/{}", self.credential.host(), repository)
    }

    /// レジストリ付きのタグ付きイメージ名。例: `myacr.azurecr.io/myapp:v1`
    pub fn full_image(&self) -> String {
        let (_, tag) = self.repository_and_tag();
        format!("{}:{}", self.remote_repository(), tag)
    }

    fn validate(&self) -> Result<()> {
        if self.credential.host().is_empty() {
            return Err(CoreError::MissingField("registry.server_url"));
        }
        let (repository, tag) = self.repository_and_tag();
        if repository.is_empty() || tag.is_empty() {
            return Err(CoreError::InvalidImage(self.image_name_with_tag.clone()));
        }
        if repository.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace()) {
            return Err(CoreError::InvalidImage(self.image_name_with_tag.clone()));
        }
        Ok(())
    }
}

const SITES_SEGMENT: &str = "/providers/microsoft.web/sites/";

/// 更新対象のLinux Webアプリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppTarget {
    pub subscription_id: String,
    /// 完全なリソースID:
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Web/sites/{name}`
    pub web_app_id: String,
}

impl WebAppTarget {
    pub fn new(subscription_id: impl Into<String>, web_app_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            web_app_id: web_app_id.into(),
        }
    }

    /// サイト名（`/providers/Microsoft.Web/sites/` の直後のセグメント）
    pub fn site_name(&self) -> Option<&str> {
        // ASCIIの小文字化ならバイト位置が元の文字列でもそのまま使える
        let start = self
            .web_app_id
            .to_ascii_lowercase()
            .find(SITES_SEGMENT)?
            + SITES_SEGMENT.len();
        self.web_app_id[start..]
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
    }

    fn validate(&self) -> Result<()> {
        if self.subscription_id.is_empty() {
            return Err(CoreError::MissingField("web_app.subscription_id"));
        }
        let prefix = format!("/subscriptions/{}/", self.subscription_id).to_ascii_lowercase();
        if !self.web_app_id.to_ascii_lowercase().starts_with(&prefix) {
            return Err(CoreError::InvalidWebAppId(self.web_app_id.clone()));
        }
        if self.site_name().is_none() {
            return Err(CoreError::InvalidWebAppId(self.web_app_id.clone()));
        }
        Ok(())
    }
}

/// 成果物をデプロイするMavenプロジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSource {
    /// `pom.xml` を含むディレクトリ
    pub root: PathBuf,
    /// プロジェクト名。DockerfileとURLで使われる
    pub name: String,
    /// 成果物を探す前にMavenの `package` ゴールを実行する
    #[serde(default)]
    pub package: bool,
}

impl ProjectSource {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            package: false,
        }
    }

    pub fn with_package(mut self, package: bool) -> Self {
        self.package = package;
        self
    }
}

/// 1回のデプロイに必要なすべて
///
/// 呼び出しごとに一度だけ作られてバックグラウンドタスクに移されるため、
/// ジョブ開始後に変更されることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentJob {
    pub target: WebAppTarget,
    pub image: PrivateRegistryImageSetting,
    pub project: ProjectSource,
}

impl DeploymentJob {
    pub fn new(
        target: WebAppTarget,
        image: PrivateRegistryImageSetting,
        project: ProjectSource,
    ) -> Result<Self> {
        target.validate()?;
        image.validate()?;
        if project.name.trim().is_empty() {
            return Err(CoreError::MissingField("project.name"));
        }
        Ok(Self {
            target,
            image,
            project,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_ID: &str =
        "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Web/sites/petstore";

    fn setting(image: &str) -> PrivateRegistryImageSetting {
        PrivateRegistryImageSetting::new(
            RegistryCredential::new("myacr.azurecr.io", "user", "pass"),
            image,
        )
    }

    #[test]
    fn test_basic_auth_header() {
        let cred = RegistryCredential::new("r.example.com", "Aladdin", "open sesame");
        assert_eq!(cred.basic_auth_header(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn test_debug_hides_password() {
        let cred = RegistryCredential::new("r.example.com", "user", "hunter2");
        let printed = format!("{:?}", cred);
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_host_and_base_url() {
        let cred = RegistryCredential::new("https://myacr.azurecr.io/", "u", "p");
        assert_eq!(cred.host(), "myacr.azurecr.io");
        assert_eq!(cred.base_url(), "https://myacr.azurecr.io");

        let cred = RegistryCredential::new("myacr.azurecr.io", "u", "p");
        assert_eq!(cred.base_url(), "https://myacr.azurecr.io");

        let cred = RegistryCredential::new("http://127.0.0.1:5000", "u", "p");
        assert_eq!(cred.base_url(), "http://127.0.0.1:5000");
        assert_eq!(cred.host(), "127.0.0.1:5000");
    }

    #[test]
    fn test_repository_and_tag() {
        assert_eq!(setting("myapp:v1").repository_and_tag(), ("myapp", "v1"));
        assert_eq!(setting("team/myapp").repository_and_tag(), ("team/myapp", "latest"));
        assert_eq!(setting("myapp:v1").full_image(), "myacr.azurecr.io/myapp:v1");
        assert_eq!(setting("myapp").remote_repository(), "myacr.azurecr.io/myapp");
    }

    #[test]
    fn test_site_name() {
        let target = WebAppTarget::new("sub-1", APP_ID);
        assert_eq!(target.site_name(), Some("petstore"));
    }

    #[test]
    fn test_job_validation() {
        let project = ProjectSource::new("/tmp/petstore", "petstore");
        let job = DeploymentJob::new(
            WebAppTarget::new("sub-1", APP_ID),
            setting("petstore:latest"),
            project.clone(),
        );
        assert!(job.is_ok());

        let err = DeploymentJob::new(
            WebAppTarget::new("sub-2", APP_ID),
            setting("petstore:latest"),
            project.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidWebAppId(_)));

        for app_id in [
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Web/sites/",
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Web/sites//config",
            "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Web/serverfarms/plan",
        ] {
            let err = DeploymentJob::new(
                WebAppTarget::new("sub-1", app_id),
                setting("petstore:latest"),
                project.clone(),
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidWebAppId(_)), "{app_id}");
        }

        let err = DeploymentJob::new(
            WebAppTarget::new("sub-1", APP_ID),
            setting("PetStore:latest"),
            project.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidImage(_)));

        let err = DeploymentJob::new(
            WebAppTarget::new("sub-1", APP_ID),
            setting("petstore:latest"),
            ProjectSource::new("/tmp/petstore", " "),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::MissingField("project.name"));
    }
}

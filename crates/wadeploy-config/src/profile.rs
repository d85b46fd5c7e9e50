//! デプロイプロファイル
//!
//! ```yaml
//! project:
//!   root: .
//!   name: petstore
//!   package: true
//! web_app:
//!   subscription_id: 00000000-0000-0000-0000-000000000000
//!   app_id: /subscriptions/.../providers/Microsoft.Web/sites/petstore
//! registry:
//!   server_url: myregistry.azurecr.io
//!   username: myregistry
//!   password: ${REGISTRY_PASSWORD}
//!   image: petstore:latest
//! ```
//!
//! ファイルの各項目は省略可能。足りない分はジョブに変換する前に
//! コマンドラインのフラグで補う。

use crate::error::{ConfigError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wadeploy_core::{
    DeploymentJob, PrivateRegistryImageSetting, ProjectSource, RegistryCredential, WebAppTarget,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployProfile {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub web_app: WebAppSection,
    #[serde(default)]
    pub registry: RegistrySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// 相対パスはプロファイルのディレクトリを基準に解決
    pub root: Option<PathBuf>,
    pub name: Option<String>,
    /// デプロイ前に `mvn package` を実行
    #[serde(default)]
    pub package: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebAppSection {
    pub subscription_id: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub image: Option<String>,
}

impl std::fmt::Debug for RegistrySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySection")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("image", &self.image)
            .finish()
    }
}

/// `path` からプロファイルを読み込み `${VAR}` を展開
pub fn load_profile(path: &Path) -> Result<DeployProfile> {
    tracing::debug!("Loading profile from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let mut profile = DeployProfile::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    profile.expand_env()?;

    // 相対パスのルートはプロファイルのディレクトリ基準
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let root = match profile.project.root.take() {
        Some(root) if root.is_relative() => base.join(root),
        Some(root) => root,
        None => base,
    };
    profile.project.root = Some(root);

    Ok(profile)
}

impl DeployProfile {
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// すべての文字列設定の `${VAR}` を環境変数の値で置換する。
    /// 未設定の変数はエラー。
    pub fn expand_env(&mut self) -> Result<()> {
        let pattern = Regex::new(r"\$\{(\w+)\}")?;
        let fields: [(&'static str, &mut Option<String>); 7] = [
            ("project.name", &mut self.project.name),
            ("web_app.subscription_id", &mut self.web_app.subscription_id),
            ("web_app.app_id", &mut self.web_app.app_id),
            ("registry.server_url", &mut self.registry.server_url),
            ("registry.username", &mut self.registry.username),
            ("registry.password", &mut self.registry.password),
            ("registry.image", &mut self.registry.image),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *value = expand_value(&pattern, value, field)?;
            }
        }

        if let Some(root) = &self.project.root {
            let expanded = expand_value(&pattern, &root.to_string_lossy(), "project.root")?;
            self.project.root = Some(PathBuf::from(expanded));
        }
        Ok(())
    }

    /// カタログコマンド用のレジストリ認証情報
    pub fn registry_credential(&self) -> Result<RegistryCredential> {
        Ok(RegistryCredential::new(
            required(&self.registry.server_url, "registry.server_url")?,
            required(&self.registry.username, "registry.username")?,
            required(&self.registry.password, "registry.password")?,
        ))
    }

    /// 検証済みのジョブを作る。プロジェクト名のデフォルトは
    /// ルートディレクトリ名。
    pub fn to_job(&self) -> Result<DeploymentJob> {
        let target = WebAppTarget::new(
            required(&self.web_app.subscription_id, "web_app.subscription_id")?,
            required(&self.web_app.app_id, "web_app.app_id")?,
        );
        let image = PrivateRegistryImageSetting::new(
            self.registry_credential()?,
            required(&self.registry.image, "registry.image")?,
        );

        let root = self
            .project
            .root
            .clone()
            .ok_or(ConfigError::MissingField("project.root"))?;
        let name = match &self.project.name {
            Some(name) => name.clone(),
            None => root
                .canonicalize()
                .unwrap_or_else(|_| root.clone())
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or(ConfigError::MissingField("project.name"))?,
        };
        let project = ProjectSource::new(root, name).with_package(self.project.package);

        Ok(DeploymentJob::new(target, image, project)?)
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String> {
    // 空白のみは未指定扱い。それ以外は値をそのまま使う
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingField(field))
}

fn expand_value(pattern: &Regex, value: &str, field: &'static str) -> Result<String> {
    let mut missing = None;
    let expanded = pattern.replace_all(value, |caps: &regex::Captures| {
        let name = &caps[1];
        match std::env::var(name) {
            Ok(val) => val,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::UndefinedVariable { name, field }),
        None => Ok(expanded.into_owned()),
    }
}

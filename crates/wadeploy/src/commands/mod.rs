pub mod deploy;
pub mod registry;

use crate::RegistryArgs;
use std::path::Path;
use wadeploy_config::{ConfigError, DeployProfile};

/// `--config` のプロファイル、なければ最初に見つかったものを読み込む。
/// ファイルがなければすべての設定をフラグで渡す必要がある。
pub fn load_profile(config: Option<&Path>) -> anyhow::Result<DeployProfile> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => match wadeploy_config::find_config_file() {
            Ok(path) => path,
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("No config file found, using flags only");
                return Ok(DeployProfile::default());
            }
            Err(e) => return Err(e.into()),
        },
    };
    tracing::info!("Using config {}", path.display());
    Ok(wadeploy_config::load_profile(&path)?)
}

/// レジストリのフラグでプロファイルのregistryセクションを上書き
pub fn apply_registry_args(profile: &mut DeployProfile, args: &RegistryArgs) {
    if let Some(server) = &args.server {
        profile.registry.server_url = Some(server.clone());
    }
    if let Some(username) = &args.username {
        profile.registry.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        profile.registry.password = Some(password.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_profile() {
        let mut profile = DeployProfile::default();
        profile.registry.server_url = Some("old.azurecr.io".to_string());
        profile.registry.username = Some("kept".to_string());

        let args = RegistryArgs {
            server: Some("new.azurecr.io".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };
        apply_registry_args(&mut profile, &args);

        assert_eq!(profile.registry.server_url.as_deref(), Some("new.azurecr.io"));
        assert_eq!(profile.registry.username.as_deref(), Some("kept"));
        assert_eq!(profile.registry.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        assert!(load_profile(Some(&missing)).is_err());
    }
}

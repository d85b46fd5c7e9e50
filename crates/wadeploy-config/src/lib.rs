pub mod error;
pub mod profile;

pub use error::*;
pub use profile::{DeployProfile, ProjectSection, RegistrySection, WebAppSection, load_profile};

use std::path::PathBuf;

pub const CONFIG_ENV_VAR: &str = "WADEPLOY_CONFIG";
pub const CONFIG_DIR_NAME: &str = ".wadeploy";

const CANDIDATES: [&str; 4] = [
    "wadeploy.local.yaml",
    ".wadeploy.local.yaml",
    "wadeploy.yaml",
    ".wadeploy.yaml",
];

/// デプロイプロファイルを探す
///
/// 検索順序:
/// 1. `WADEPLOY_CONFIG`（直接パス指定）
/// 2. カレントディレクトリ: wadeploy.local.yaml, .wadeploy.local.yaml, wadeploy.yaml, .wadeploy.yaml
/// 3. `./.wadeploy/` 内の同じファイル名
/// 4. `{config_dir}/wadeploy/wadeploy.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at a missing file: {}", CONFIG_ENV_VAR, path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(CONFIG_DIR_NAME);
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("wadeploy").join("wadeploy.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

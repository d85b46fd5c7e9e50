//! Dockerデーモン向けのレジストリ認証
//!
//! プッシュは `~/.docker/config.json` の内容ではなく、
//! デプロイに設定された認証情報で認証する。

use bollard::auth::DockerCredentials;
use wadeploy_core::RegistryCredential;

/// `credential` のレジストリへプッシュするためのBasic認証情報
pub fn docker_credentials(credential: &RegistryCredential) -> DockerCredentials {
    DockerCredentials {
        username: Some(credential.username.clone()),
        password: Some(credential.password.clone()),
        serveraddress: Some(credential.host().to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_credentials() {
        let credential = RegistryCredential::new("https://myacr.azurecr.io", "acr-user", "s3cret");
        let creds = docker_credentials(&credential);
        assert_eq!(creds.username.as_deref(), Some("acr-user"));
        assert_eq!(creds.password.as_deref(), Some("s3cret"));
        assert_eq!(creds.serveraddress.as_deref(), Some("myacr.azurecr.io"));
        assert!(creds.identitytoken.is_none());
    }
}

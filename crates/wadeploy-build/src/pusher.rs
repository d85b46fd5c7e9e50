//! イメージのプッシュ
//!
//! ローカルでビルドしたイメージにレジストリ付きの名前でタグを付け、
//! デプロイのBasic認証情報でプッシュする。

use crate::auth::docker_credentials;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::models::PushImageInfo;
use futures_util::StreamExt;
use wadeploy_core::PrivateRegistryImageSetting;

pub struct ImagePusher {
    docker: Docker,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// `local_image` を `setting.full_image()` としてプッシュ
    ///
    /// 進捗メッセージはすべて `on_progress` に渡る。エラーを含む最初の
    /// メッセージでプッシュを中断する。プッシュしたイメージ名を返す。
    pub async fn push(
        &self,
        local_image: &str,
        setting: &PrivateRegistryImageSetting,
        mut on_progress: impl FnMut(&PushImageInfo),
    ) -> BuildResult<String> {
        let (_, tag) = setting.repository_and_tag();
        validate_tag(tag)?;

        let repository = setting.remote_repository();
        let full_image = setting.full_image();

        #[allow(deprecated)]
        let tag_options = bollard::image::TagImageOptions {
            repo: repository.as_str(),
            tag,
        };
        self.docker.tag_image(local_image, Some(tag_options)).await?;
        tracing::debug!("Tagged {} as {}", local_image, full_image);

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };
        let credentials = docker_credentials(&setting.credential);

        tracing::info!("Pushing {}", full_image);
        #[allow(deprecated)]
        let mut stream = self
            .docker
            .push_image(&repository, Some(options), Some(credentials));

        // 早期リターンでストリームが破棄され、プッシュのリクエストも閉じる
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| BuildError::PushFailed {
                message: e.to_string(),
            })?;
            check_push_message(&info)?;
            on_progress(&info);
        }

        Ok(full_image)
    }
}

/// エラーを含む進捗メッセージなら失敗
pub fn check_push_message(info: &PushImageInfo) -> BuildResult<()> {
    match &info.error {
        Some(error) => Err(BuildError::PushFailed {
            message: error.clone(),
        }),
        None => Ok(()),
    }
}

/// Dockerのタグ規則: `[A-Za-z0-9_.-]` で128文字以内、
/// 先頭は `.` と `-` 以外。
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }

    if tag.len() > 128 {
        return Err(BuildError::InvalidTag {
            tag: format!("Tag too long ({} characters, max 128)", tag.len()),
        });
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }

    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
    {
        return Err(BuildError::InvalidTag {
            tag: format!("Invalid character '{}' in tag: {}", c, tag),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("latest").is_ok());
        assert!(validate_tag("v1.2.3-rc_1").is_ok());
        assert!(validate_tag("").is_err());
        assert!(validate_tag("-bad").is_err());
        assert!(validate_tag(".bad").is_err());
        assert!(validate_tag("has space").is_err());
        assert!(validate_tag(&"a".repeat(129)).is_err());
        assert!(validate_tag(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_check_push_message() {
        let ok = PushImageInfo {
            status: Some("Pushing".to_string()),
            progress: Some("[=====>     ] 1MB/2MB".to_string()),
            ..Default::default()
        };
        assert!(check_push_message(&ok).is_ok());

        let failed = PushImageInfo {
            error: Some("unauthorized: authentication required".to_string()),
            ..Default::default()
        };
        let err = check_push_message(&failed).unwrap_err();
        assert!(
            matches!(err, BuildError::PushFailed { message } if message.contains("unauthorized"))
        );
    }
}

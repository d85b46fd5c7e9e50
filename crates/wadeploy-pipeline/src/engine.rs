//! コンテナエンジンの抽象
//!
//! パイプラインが必要とするのはディレクトリからのイメージビルドと
//! イメージのプッシュだけ。[`DockerEngine`] がDockerデーモンで両方を行う。

use crate::error::PipelineResult;
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::PushImageInfo;
use std::path::Path;
use wadeploy_build::{BuildError, ContextBuilder, ImageBuilder, ImagePusher};
use wadeploy_core::{PrivateRegistryImageSetting, ProgressSink};

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// `context_dir` を `dockerfile` でビルドし、`tag` を付けたローカルイメージを作る。
    /// ローカルイメージの参照を返す
    async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &Path,
        tag: &str,
        sink: &ProgressSink,
    ) -> PipelineResult<String>;

    /// `local_image` を `setting` のレジストリにプッシュし、
    /// プッシュしたイメージ名を返す
    async fn push_image(
        &self,
        local_image: &str,
        setting: &PrivateRegistryImageSetting,
        sink: &ProgressSink,
    ) -> PipelineResult<String>;
}

pub struct DockerEngine {
    builder: ImageBuilder,
    pusher: ImagePusher,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self {
            builder: ImageBuilder::new(docker.clone()),
            pusher: ImagePusher::new(docker),
        }
    }

    /// `DOCKER_HOST` のデーモン、なければローカルのデフォルトソケットに接続し、
    /// 応答することを確認する
    pub async fn connect() -> PipelineResult<Self> {
        let docker = Docker::connect_with_defaults().map_err(BuildError::DockerConnection)?;
        docker.ping().await.map_err(BuildError::DockerConnection)?;
        Ok(Self::new(docker))
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &Path,
        tag: &str,
        sink: &ProgressSink,
    ) -> PipelineResult<String> {
        let context = ContextBuilder::create_context(context_dir, dockerfile)?;
        let image = self
            .builder
            .build_image(context, tag, |line| sink.println(line))
            .await?;
        Ok(image)
    }

    async fn push_image(
        &self,
        local_image: &str,
        setting: &PrivateRegistryImageSetting,
        sink: &ProgressSink,
    ) -> PipelineResult<String> {
        let image = self
            .pusher
            .push(local_image, setting, |info| match push_status_line(info) {
                Some(line) => sink.println(line),
                None => tracing::trace!("push {:?}", info.progress),
            })
            .await?;
        Ok(image)
    }
}

/// プッシュメッセージのコンソール行。バイト数の進捗更新は出さない
pub fn push_status_line(info: &PushImageInfo) -> Option<String> {
    if info.progress_detail.is_some() || info.progress.is_some() {
        return None;
    }
    info.status.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::ProgressDetail;

    #[test]
    fn test_push_status_line() {
        let digest = PushImageInfo {
            status: Some("v1: digest: sha256:abc size: 1573".to_string()),
            ..Default::default()
        };
        assert_eq!(
            push_status_line(&digest).as_deref(),
            Some("v1: digest: sha256:abc size: 1573")
        );

        let uploading = PushImageInfo {
            status: Some("Pushing".to_string()),
            progress: Some("[==>   ] 1MB/5MB".to_string()),
            progress_detail: Some(ProgressDetail {
                current: Some(1),
                total: Some(5),
            }),
            ..Default::default()
        };
        assert_eq!(push_status_line(&uploading), None);
        assert_eq!(push_status_line(&PushImageInfo::default()), None);
    }
}

use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// tar.gzのコンテキストからイメージをビルドし `tag` を付ける
    ///
    /// ビルド出力は1行ずつ `on_output` に渡される。エラーを含む
    /// 最初のメッセージでビルドを中断する。
    pub async fn build_image(
        &self,
        context_data: Vec<u8>,
        tag: &str,
        mut on_output: impl FnMut(&str),
    ) -> BuildResult<String> {
        tracing::info!("Building image: {}", tag);

        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            rm: true,
            forcerm: true,
            pull: true,
            ..Default::default()
        };

        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            let output = msg?;
            for line in inspect_build_output(output)? {
                on_output(&line);
            }
        }

        tracing::info!("Successfully built: {}", tag);
        Ok(tag.to_string())
    }
}

/// ビルドメッセージのテキスト行、またはそのエラー
fn inspect_build_output(output: bollard::models::BuildInfo) -> BuildResult<Vec<String>> {
    if let Some(error) = output.error {
        return Err(BuildError::BuildFailed(error));
    }

    if let Some(error_detail) = output.error_detail {
        let error_msg = error_detail
            .message
            .unwrap_or_else(|| "Unknown build error".to_string());
        return Err(BuildError::BuildFailed(error_msg));
    }

    let mut lines = Vec::new();
    if let Some(stream) = output.stream {
        lines.extend(
            stream
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    if let Some(status) = output.status {
        lines.push(status);
    }
    Ok(lines)
}

/// プロジェクトのイメージのローカルタグ。小文字化し、`[a-z0-9._-]` 以外を
/// `-` に置き換えて `latest` タグを付ける。
///
/// # Examples
/// - `PetStore` -> `petstore:latest`
/// - `my app` -> `my-app:latest`
pub fn local_image_tag(project_name: &str) -> String {
    let name: String = project_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    let name = if name.is_empty() { "app" } else { name };
    format!("{}:latest", name)
}

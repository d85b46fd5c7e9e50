//! ステップの実行
//!
//! ジョブは順番どおりに実行され、最初に失敗したステップで終了する。成功時も
//! 失敗時もシンクは [`JOB_EXIT_CODE`] で終了する。失敗はエラー行と
//! タスクの `Result` で報告される。

use crate::engine::ContainerEngine;
use crate::error::{PipelineError, PipelineResult};
use std::sync::Arc;
use tokio::task::JoinHandle;
use wadeploy_build::{
    DockerfileTemplate, MavenProject, MavenRunner, ensure_package_task, local_image_tag,
};
use wadeploy_cloud::{WebApp, WebAppProvider};
use wadeploy_core::{DeploymentJob, ProgressReceiver, ProgressSink};

/// ジョブ終了時にシンクへ記録する終了コード（成否に関わらず）
pub const JOB_EXIT_CODE: i32 = 0;

/// 成功したジョブの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    /// プッシュしたレジストリ付きのイメージ名
    pub image: String,
    /// 更新後に読み戻したアプリ（読めた場合）
    pub web_app: Option<WebApp>,
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct DeployPipeline {
    engine: Arc<dyn ContainerEngine>,
    web_apps: Arc<dyn WebAppProvider>,
    maven: MavenRunner,
    dockerfile_template: Option<String>,
}

impl DeployPipeline {
    pub fn new(engine: Arc<dyn ContainerEngine>, web_apps: Arc<dyn WebAppProvider>) -> Self {
        Self {
            engine,
            web_apps,
            maven: MavenRunner::new(),
            dockerfile_template: None,
        }
    }

    pub fn with_maven(mut self, maven: MavenRunner) -> Self {
        self.maven = maven;
        self
    }

    /// 組み込みのTomcat用Dockerfileテンプレートを置き換える
    pub fn with_dockerfile_template(mut self, source: impl Into<String>) -> Self {
        self.dockerfile_template = Some(source.into());
        self
    }

    /// `job` をバックグラウンドタスクで開始してすぐに返す
    pub fn execute(&self, job: DeploymentJob) -> ExecutionHandle {
        let (sink, receiver) = ProgressSink::channel();
        let pipeline = self.clone();
        let task = tokio::spawn(async move { pipeline.run(job, sink).await });
        ExecutionHandle {
            receiver: Some(receiver),
            task,
        }
    }

    /// 現在のタスクで `job` を最後まで実行し、`sink` に報告する
    pub async fn run(&self, job: DeploymentJob, sink: ProgressSink) -> PipelineResult<DeployOutcome> {
        let result = self.run_steps(&job, &sink).await;

        match &result {
            Ok(outcome) => {
                tracing::info!("Deployed {} to {}", outcome.image, job.target.web_app_id);
                sink.println("Job done");
            }
            Err(e) => {
                tracing::error!("Deploy of {} failed: {}", job.project.name, e);
                sink.errorln(e.user_message());
            }
        }

        if let Err(e) = sink.terminate(JOB_EXIT_CODE) {
            tracing::warn!("Progress sink already closed: {}", e);
        }
        result
    }

    async fn run_steps(
        &self,
        job: &DeploymentJob,
        sink: &ProgressSink,
    ) -> PipelineResult<DeployOutcome> {
        sink.println("Starting job ...  ");

        if job.project.package {
            sink.println("Package project ...");
            let mut tasks = Vec::new();
            ensure_package_task(&mut tasks, &job.project.root);
            self.maven.run_all(&tasks, sink).await?;
        }

        sink.println("Locate artifact ...");
        let project = MavenProject::load(&job.project.root)?;
        let artifact = project.locate_artifact()?;
        tracing::debug!("Artifact: {}", artifact.path.display());

        sink.println("Build image ...");
        let template = match &self.dockerfile_template {
            Some(source) => DockerfileTemplate::from_source(source)?,
            None => DockerfileTemplate::tomcat()?,
        };
        let dockerfile = template.write_to(&project.build_directory, &job.project.name, &artifact)?;
        let local_image = self
            .engine
            .build_image(
                &project.build_directory,
                &dockerfile,
                &local_image_tag(&job.project.name),
                sink,
            )
            .await?;

        sink.println("Push to registry ...");
        let image = self.engine.push_image(&local_image, &job.image, sink).await?;

        sink.println("Update web app ...");
        let web_app = self
            .web_apps
            .update_container_image(&job.target, &job.image)
            .await?;

        let url = web_app
            .as_ref()
            .and_then(|app| app.public_url(&job.project.name));
        if let Some(url) = &url {
            sink.println(format!("URL:  {}", url));
        }

        Ok(DeployOutcome {
            image,
            web_app,
            url,
        })
    }
}

/// 実行中のジョブ
///
/// ハンドルを破棄してもタスクは切り離されて実行を続ける。
pub struct ExecutionHandle {
    receiver: Option<ProgressReceiver>,
    task: JoinHandle<PipelineResult<DeployOutcome>>,
}

impl ExecutionHandle {
    /// ジョブの進捗ストリーム。取り出し済みなら `None`
    pub fn take_receiver(&mut self) -> Option<ProgressReceiver> {
        self.receiver.take()
    }

    /// ジョブを中断する。シンクは `Terminated` イベントなしで破棄される
    pub fn cancel(&self) {
        tracing::info!("Cancelling deploy job");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> PipelineResult<DeployOutcome> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PipelineError::Cancelled),
            Err(e) => Err(PipelineError::Panicked(e.to_string())),
        }
    }
}

//! wadeploy デプロイパイプライン
//!
//! [`DeploymentJob`](wadeploy_core::DeploymentJob) をバックグラウンドタスクで実行する。
//! パッケージ済みの成果物を探し、Dockerfileを生成し、イメージをビルドして
//! プッシュし、Webアプリをそのイメージに向ける。進捗は
//! [`ProgressSink`](wadeploy_core::ProgressSink) を通してホストに流れる。

pub mod engine;
pub mod error;
pub mod pipeline;

pub use engine::{ContainerEngine, DockerEngine};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{DeployOutcome, DeployPipeline, ExecutionHandle, JOB_EXIT_CODE};

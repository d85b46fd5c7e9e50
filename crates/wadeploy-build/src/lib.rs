//! wadeploy イメージビルド機能
//!
//! ディスク上のMavenプロジェクトからプライベートレジストリのイメージまで。
//! 成果物の特定、`package` ゴールの実行、Dockerfileの生成、
//! ビルドコンテキストの作成、イメージのビルドとプッシュを扱う。

pub mod artifact;
pub mod auth;
pub mod builder;
pub mod context;
pub mod dockerfile;
pub mod error;
pub mod maven;
pub mod pusher;

pub use artifact::{Artifact, MavenProject};
pub use auth::docker_credentials;
pub use builder::{ImageBuilder, local_image_tag};
pub use context::ContextBuilder;
pub use dockerfile::{DOCKERFILE_NAME, DockerfileTemplate};
pub use error::{BuildError, BuildResult};
pub use maven::{BeforeRunTask, MavenRunner, ensure_package_task, should_add_package_task};
pub use pusher::{ImagePusher, check_push_message, validate_tag};

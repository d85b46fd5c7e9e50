//! wadeploy コア
//!
//! デプロイパイプラインとレジストリクライアントが共有するデータモデル。
//! デプロイジョブ、レジストリ認証情報、実行中ジョブのコンソール出力を
//! ホストへ運ぶ進捗シンク、ジョブ診断の重大度テーブルを含む。

pub mod error;
pub mod model;
pub mod progress;
pub mod severity;

pub use error::{CoreError, Result};
pub use model::{
    DeploymentJob, PrivateRegistryImageSetting, ProjectSource, RegistryCredential, WebAppTarget,
};
pub use progress::{OutputKind, ProgressEvent, ProgressLine, ProgressReceiver, ProgressSink};
pub use severity::{JobDiagnostic, Severity};

//! wadeploy クラウド連携
//!
//! デプロイの最終ステップで、Webアプリをプッシュしたばかりのイメージに向ける。
//! パイプラインは [`WebAppProvider`] を通して呼び出し、
//! [`AzureWebApps`] が Azure Resource Manager 向けに実装する。

pub mod azure;
pub mod error;
pub mod provider;

pub use azure::{AzureConfig, AzureWebApps};
pub use error::{CloudError, Result};
pub use provider::{WebApp, WebAppProvider};

mod commands;
mod console;
mod http;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wadeploy")]
#[command(
    about = "Package a Maven web app into a container and run it on Azure App Service",
    long_about = None
)]
struct Cli {
    /// デプロイプロファイル（デフォルトでは wadeploy.yaml を探索）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// プロジェクトのイメージをビルド・プッシュし、Webアプリに反映
    Deploy(DeployArgs),
    /// コンテナレジストリを参照
    #[command(subcommand)]
    Registry(RegistryCommands),
    /// バージョン情報を表示
    Version,
}

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    /// pom.xml を含むプロジェクトディレクトリ
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// プロジェクト名（アプリは /{name} で公開）
    #[arg(short, long)]
    pub name: Option<String>,

    /// デプロイ前に `mvn package` を実行
    #[arg(long)]
    pub package: bool,

    /// AzureのサブスクリプションID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription: Option<String>,

    /// WebアプリのリソースID (/subscriptions/.../providers/Microsoft.Web/sites/NAME)
    #[arg(long)]
    pub app_id: Option<String>,

    /// タグ付きのイメージ名（例: petstore:latest）
    #[arg(short, long)]
    pub image: Option<String>,

    /// 組み込みのTomcat用の代わりに使うDockerfileテンプレート
    #[arg(long)]
    pub dockerfile_template: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct RegistryArgs {
    /// レジストリサーバー（例: myregistry.azurecr.io）
    #[arg(long, env = "WADEPLOY_REGISTRY_SERVER")]
    pub server: Option<String>,

    /// レジストリのユーザー名
    #[arg(short, long, env = "WADEPLOY_REGISTRY_USERNAME")]
    pub username: Option<String>,

    /// レジストリのパスワード
    #[arg(long, env = "WADEPLOY_REGISTRY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// リポジトリ一覧
    Repos {
        #[command(flatten)]
        registry: RegistryArgs,
    },
    /// リポジトリのタグ一覧
    Tags {
        /// リポジトリ名
        repository: String,
        #[command(flatten)]
        registry: RegistryArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ。stdoutはジョブのコンソール用
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("wadeploy {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Deploy(args) => {
            let profile = commands::load_profile(cli.config.as_deref())?;
            commands::deploy::handle(profile, args).await?;
        }
        Commands::Registry(registry_cmd) => {
            let profile = commands::load_profile(cli.config.as_deref())?;
            let http = http::client()?;
            match registry_cmd {
                RegistryCommands::Repos { registry } => {
                    commands::registry::handle_repos(http, profile, &registry).await?;
                }
                RegistryCommands::Tags {
                    repository,
                    registry,
                } => {
                    commands::registry::handle_tags(http, profile, &registry, &repository).await?;
                }
            }
        }
    }

    Ok(())
}

/// 実行全体で1つのHTTPクライアント。レジストリとAzureのクライアントで共有
pub fn client() -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("wadeploy/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

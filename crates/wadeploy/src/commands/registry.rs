//! wadeploy registry コマンドハンドラー

use super::apply_registry_args;
use crate::RegistryArgs;
use colored::Colorize;
use wadeploy_config::DeployProfile;
use wadeploy_registry::RegistryClient;

/// wadeploy registry repos
pub async fn handle_repos(
    http: reqwest::Client,
    mut profile: DeployProfile,
    args: &RegistryArgs,
) -> anyhow::Result<()> {
    apply_registry_args(&mut profile, args);
    let credential = profile.registry_credential()?;
    let client = RegistryClient::new(http);

    let repositories = client.list_repositories(&credential).await?;

    println!("{}  {}", "Registry:".bold(), credential.host().cyan().bold());
    print_names("Repositories:", &repositories);
    Ok(())
}

/// wadeploy registry tags <REPOSITORY>
pub async fn handle_tags(
    http: reqwest::Client,
    mut profile: DeployProfile,
    args: &RegistryArgs,
    repository: &str,
) -> anyhow::Result<()> {
    apply_registry_args(&mut profile, args);
    let credential = profile.registry_credential()?;
    let client = RegistryClient::new(http);

    let tags = client.list_tags(&credential, repository).await?;

    println!(
        "{}  {}/{}",
        "Registry:".bold(),
        credential.host().cyan().bold(),
        repository.cyan()
    );
    print_names("Tags:", &tags);
    Ok(())
}

fn print_names(heading: &str, names: &[String]) {
    println!();
    println!("{}", heading.bold());
    if names.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        for name in names {
            println!("  {}", name.green());
        }
    }
}

//! wadeploy deploy コマンド

use super::apply_registry_args;
use crate::{DeployArgs, console, http};
use colored::Colorize;
use std::sync::Arc;
use wadeploy_cloud::{AzureConfig, AzureWebApps};
use wadeploy_config::DeployProfile;
use wadeploy_pipeline::{DeployPipeline, DockerEngine, PipelineError};

/// deployのフラグでプロファイルを上書き
pub fn apply_deploy_args(profile: &mut DeployProfile, args: &DeployArgs) {
    if let Some(project) = &args.project {
        profile.project.root = Some(project.clone());
    }
    if let Some(name) = &args.name {
        profile.project.name = Some(name.clone());
    }
    if args.package {
        profile.project.package = true;
    }
    if let Some(subscription) = &args.subscription {
        profile.web_app.subscription_id = Some(subscription.clone());
    }
    if let Some(app_id) = &args.app_id {
        profile.web_app.app_id = Some(app_id.clone());
    }
    if let Some(image) = &args.image {
        profile.registry.image = Some(image.clone());
    }
    apply_registry_args(profile, &args.registry);
}

pub async fn handle(mut profile: DeployProfile, args: DeployArgs) -> anyhow::Result<()> {
    apply_deploy_args(&mut profile, &args);
    if profile.project.root.is_none() {
        profile.project.root = Some(std::env::current_dir()?);
    }
    let job = profile.to_job()?;

    println!("{}", "Deploying...".blue().bold());
    println!("  Project: {}", job.project.name.cyan());
    println!("  Image:   {}", job.image.full_image().cyan());
    println!(
        "  Web app: {}",
        job.target.site_name().unwrap_or(&job.target.web_app_id).cyan()
    );
    println!();

    let engine = connect_docker().await?;
    let azure = AzureWebApps::new(http::client()?, AzureConfig::from_env()?);

    let mut pipeline = DeployPipeline::new(Arc::new(engine), Arc::new(azure));
    if let Some(path) = &args.dockerfile_template {
        pipeline = pipeline.with_dockerfile_template(std::fs::read_to_string(path)?);
    }

    let mut handle = pipeline.execute(job);
    let receiver = handle
        .take_receiver()
        .ok_or_else(|| anyhow::anyhow!("Job console already taken"))?;

    tokio::select! {
        _ = console::print_progress(receiver) => {}
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            eprintln!("{}", "Interrupted, cancelling deploy".yellow());
        }
    }

    match handle.wait().await {
        Ok(outcome) => {
            tracing::info!("Deployed {}", outcome.image);
            Ok(())
        }
        Err(PipelineError::Cancelled) => Err(anyhow::anyhow!("Deploy cancelled")),
        // ジョブコンソールで報告済み。失敗したジョブでも終了コードは0
        Err(e) => {
            tracing::debug!("Deploy failed: {}", e);
            Ok(())
        }
    }
}

async fn connect_docker() -> anyhow::Result<DockerEngine> {
    match DockerEngine::connect().await {
        Ok(engine) => Ok(engine),
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Docker connection error".red().bold());
            eprintln!();
            eprintln!("{}", "Cause:".yellow());
            eprintln!("  {}", e);
            eprintln!();
            eprintln!("{}", "How to fix:".yellow());
            eprintln!("  • Check that the Docker daemon is running");
            eprintln!("  • Check DOCKER_HOST if the daemon is remote");
            eprintln!("  • Check that `docker ps` works");
            Err(anyhow::anyhow!("Failed to connect to Docker"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryArgs;
    use std::path::PathBuf;

    #[test]
    fn test_deploy_args_override_profile() {
        let mut profile = DeployProfile::default();
        profile.project.name = Some("from-file".to_string());
        profile.registry.image = Some("old:1".to_string());

        let args = DeployArgs {
            project: Some(PathBuf::from("/work/petstore")),
            package: true,
            image: Some("petstore:v2".to_string()),
            registry: RegistryArgs {
                username: Some("ci".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        apply_deploy_args(&mut profile, &args);

        assert_eq!(profile.project.root, Some(PathBuf::from("/work/petstore")));
        assert_eq!(profile.project.name.as_deref(), Some("from-file"));
        assert!(profile.project.package);
        assert_eq!(profile.registry.image.as_deref(), Some("petstore:v2"));
        assert_eq!(profile.registry.username.as_deref(), Some("ci"));
    }

    #[test]
    fn test_package_flag_does_not_clear_profile() {
        let mut profile = DeployProfile::default();
        profile.project.package = true;
        apply_deploy_args(&mut profile, &DeployArgs::default());
        assert!(profile.project.package);
    }
}

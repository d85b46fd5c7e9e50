//! Mavenの事前実行タスク
//!
//! デプロイにはパッケージしたての成果物が必要。事前実行タスクは先に実行する
//! Mavenゴールを表し、`ensure_package_task` はプロジェクト自身の `pom.xml` に対する
//! `package` ゴールが存在して有効であることを保証する。

use crate::artifact::POM_XML;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use wadeploy_core::{OutputKind, ProgressSink};

pub const MAVEN_PROVIDER_ID: &str = "Maven.BeforeRunTask";
pub const MAVEN_PACKAGE_GOAL: &str = "package";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeforeRunTask {
    pub provider_id: String,
    pub goal: String,
    /// ゴールを実行する `pom.xml` のパス
    pub project_path: PathBuf,
    pub enabled: bool,
}

impl BeforeRunTask {
    /// `project_root` のプロジェクトに対する有効な `package` タスク
    pub fn maven_package(project_root: &Path) -> Self {
        Self {
            provider_id: MAVEN_PROVIDER_ID.to_string(),
            goal: MAVEN_PACKAGE_GOAL.to_string(),
            project_path: project_root.join(POM_XML),
            enabled: true,
        }
    }

    pub fn is_maven(&self) -> bool {
        self.provider_id == MAVEN_PROVIDER_ID
    }
}

/// packageタスクを追加する必要があるか
///
/// このプロジェクトの `pom.xml` をパッケージする既存タスクがあれば
/// その場で有効にして `false` を返す。
pub fn should_add_package_task(tasks: &mut [BeforeRunTask], project_root: &Path) -> bool {
    let pom = project_root.join(POM_XML);
    for task in tasks.iter_mut() {
        if task.is_maven() && task.goal.contains(MAVEN_PACKAGE_GOAL) && task.project_path == pom {
            task.enabled = true;
            return false;
        }
    }
    true
}

/// `tasks` がプロジェクトをパッケージするようにする。タスクを追加したら `true`
pub fn ensure_package_task(tasks: &mut Vec<BeforeRunTask>, project_root: &Path) -> bool {
    if should_add_package_task(tasks, project_root) {
        tasks.push(BeforeRunTask::maven_package(project_root));
        true
    } else {
        false
    }
}

/// Mavenタスクを実行し、出力を進捗シンクへ流す
#[derive(Debug, Clone)]
pub struct MavenRunner {
    program: String,
}

impl Default for MavenRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MavenRunner {
    /// `$MAVEN_CMD` があればそれを、なければ `PATH` 上の `mvn` を使う
    pub fn new() -> Self {
        let program = std::env::var("MAVEN_CMD").unwrap_or_else(|_| {
            if cfg!(windows) {
                "mvn.cmd".to_string()
            } else {
                "mvn".to_string()
            }
        });
        Self { program }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 有効なMavenタスクを順に実行し、最初の失敗で止める
    pub async fn run_all(&self, tasks: &[BeforeRunTask], sink: &ProgressSink) -> BuildResult<()> {
        for task in tasks.iter().filter(|t| t.enabled && t.is_maven()) {
            self.run(task, sink).await?;
        }
        Ok(())
    }

    pub async fn run(&self, task: &BeforeRunTask, sink: &ProgressSink) -> BuildResult<()> {
        tracing::info!(
            "Running maven goal '{}' on {}",
            task.goal,
            task.project_path.display()
        );

        let mut child = Command::new(&self.program)
            .arg("-B")
            .arg("-f")
            .arg(&task.project_path)
            .args(task.goal.split_whitespace())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::MavenFailed {
                goal: task.goal.clone(),
                message: format!("Failed to run {}: {}", self.program, e),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        tokio::join!(
            forward_lines(stdout, sink, OutputKind::System),
            forward_lines(stderr, sink, OutputKind::Error),
        );

        let status = child.wait().await?;
        if !status.success() {
            return Err(BuildError::MavenFailed {
                goal: task.goal.clone(),
                message: format!("{} exited with {}", self.program, status),
            });
        }
        Ok(())
    }
}

async fn forward_lines<R>(reader: Option<R>, sink: &ProgressSink, kind: OutputKind)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => sink.write(kind, line),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped reading maven output: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(goal: &str, path: &str) -> BeforeRunTask {
        BeforeRunTask {
            provider_id: MAVEN_PROVIDER_ID.to_string(),
            goal: goal.to_string(),
            project_path: PathBuf::from(path),
            enabled: false,
        }
    }

    #[test]
    fn test_existing_package_task_is_enabled() {
        let mut tasks = vec![task("clean package", "/work/app/pom.xml")];
        assert!(!should_add_package_task(&mut tasks, Path::new("/work/app")));
        assert!(tasks[0].enabled);
    }

    #[test]
    fn test_task_for_other_pom_does_not_count() {
        let mut tasks = vec![task("package", "/work/other/pom.xml")];
        assert!(ensure_package_task(&mut tasks, Path::new("/work/app")));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1], BeforeRunTask::maven_package(Path::new("/work/app")));
        assert!(!tasks[0].enabled);
    }

    #[test]
    fn test_non_maven_task_does_not_count() {
        let mut tasks = vec![BeforeRunTask {
            provider_id: "Gradle.BeforeRunTask".to_string(),
            ..task("package", "/work/app/pom.xml")
        }];
        assert!(ensure_package_task(&mut tasks, Path::new("/work/app")));
        assert!(!ensure_package_task(&mut tasks, Path::new("/work/app")));
        assert_eq!(tasks.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_streams_output() {
        let (sink, rx) = wadeploy_core::ProgressSink::channel();
        let runner = MavenRunner::with_program("echo");
        let task = BeforeRunTask::maven_package(Path::new("/work/app"));

        runner.run(&task, &sink).await.unwrap();
        sink.terminate(0).unwrap();

        let (lines, _) = rx.collect().await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "-B -f /work/app/pom.xml package");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_failure() {
        let (sink, _rx) = wadeploy_core::ProgressSink::channel();
        let runner = MavenRunner::with_program("false");
        let task = BeforeRunTask::maven_package(Path::new("/work/app"));

        let err = runner.run(&task, &sink).await.unwrap_err();
        assert!(matches!(err, BuildError::MavenFailed { .. }));
    }

    #[tokio::test]
    async fn test_run_all_skips_disabled() {
        let (sink, _rx) = wadeploy_core::ProgressSink::channel();
        let runner = MavenRunner::with_program("definitely-not-a-real-binary");
        let tasks = vec![task("package", "/work/app/pom.xml")];
        assert!(runner.run_all(&tasks, &sink).await.is_ok());
    }
}

//! Dockerfileの生成
//!
//! Tomcatベースのイメージで、warをプロジェクト名で `webapps` に置くため、
//! アプリは `/{project}` で公開される。

use crate::artifact::Artifact;
use crate::error::BuildResult;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

pub const DOCKERFILE_NAME: &str = "Dockerfile";

pub const TOMCAT_TEMPLATE: &str = "FROM tomcat:8.5-jre8
RUN rm -fr /usr/local/tomcat/webapps/ROOT
COPY {{ artifact_name }} /usr/local/tomcat/webapps/{{ project_name }}.war
";

const TEMPLATE_NAME: &str = "Dockerfile";

pub struct DockerfileTemplate {
    tera: Tera,
}

impl DockerfileTemplate {
    /// 組み込みのTomcatテンプレート
    pub fn tomcat() -> BuildResult<Self> {
        Self::from_source(TOMCAT_TEMPLATE)
    }

    /// カスタムテンプレート。`project_name` と `artifact_name` が使える
    pub fn from_source(source: &str) -> BuildResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    pub fn render(&self, project_name: &str, artifact: &Artifact) -> BuildResult<String> {
        let mut context = Context::new();
        context.insert("project_name", project_name);
        context.insert("artifact_name", &artifact.file_name);
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    /// `Dockerfile` を生成して `build_dir` に書き込み、そのパスを返す
    pub fn write_to(
        &self,
        build_dir: &Path,
        project_name: &str,
        artifact: &Artifact,
    ) -> BuildResult<PathBuf> {
        let content = self.render(project_name, artifact)?;
        std::fs::create_dir_all(build_dir)?;
        let path = build_dir.join(DOCKERFILE_NAME);
        std::fs::write(&path, content)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn artifact() -> Artifact {
        Artifact {
            path: PathBuf::from("/work/app/target/petstore-1.0.war"),
            file_name: "petstore-1.0.war".to_string(),
        }
    }

    #[test]
    fn test_render_tomcat() {
        let rendered = DockerfileTemplate::tomcat()
            .unwrap()
            .render("petstore", &artifact())
            .unwrap();
        assert!(rendered.starts_with("FROM tomcat:8.5-jre8\n"));
        assert!(rendered.contains("COPY petstore-1.0.war /usr/local/tomcat/webapps/petstore.war"));
    }

    #[test]
    fn test_custom_template() {
        let template =
            DockerfileTemplate::from_source("FROM jetty\nADD {{ artifact_name }} /{{ project_name }}\n")
                .unwrap();
        let rendered = template.render("shop", &artifact()).unwrap();
        assert_eq!(rendered, "FROM jetty\nADD petstore-1.0.war /shop\n");
    }

    #[test]
    fn test_invalid_template() {
        assert!(DockerfileTemplate::from_source("FROM {{ unclosed").is_err());
    }

    #[test]
    fn test_write_to_build_dir() {
        let temp_dir = tempdir().unwrap();
        let build_dir = temp_dir.path().join("target");
        let path = DockerfileTemplate::tomcat()
            .unwrap()
            .write_to(&build_dir, "petstore", &artifact())
            .unwrap();
        assert_eq!(path, build_dir.join("Dockerfile"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("webapps/petstore.war"));
    }
}

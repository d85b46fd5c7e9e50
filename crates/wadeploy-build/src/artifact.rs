//! Mavenプロジェクトモデル
//!
//! `mvn package` が成果物を置く場所（ビルド出力ディレクトリと最終的な
//! 成果物名）がわかる分だけ `pom.xml` を読む。

use crate::error::{BuildError, BuildResult};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const POM_XML: &str = "pom.xml";

const DEFAULT_BUILD_DIRECTORY: &str = "target";

/// パッケージされたビルド成果物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// パッケージされたファイルの絶対パス
    pub path: PathBuf,
    /// ファイル名のみ。例: `petstore-1.0.war`
    pub file_name: String,
}

/// wadeployが使うMavenプロジェクトモデルの一部
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenProject {
    pub root: PathBuf,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub final_name: String,
    pub build_directory: PathBuf,
}

#[derive(Default)]
struct RawPom {
    artifact_id: Option<String>,
    version: Option<String>,
    parent_version: Option<String>,
    packaging: Option<String>,
    final_name: Option<String>,
    build_directory: Option<String>,
    properties: HashMap<String, String>,
}

impl MavenProject {
    /// `{root}/pom.xml` を読み込む
    pub fn load(root: &Path) -> BuildResult<Self> {
        let pom_path = root.join(POM_XML);
        if !pom_path.is_file() {
            return Err(BuildError::PomNotFound(pom_path));
        }
        let content = std::fs::read_to_string(&pom_path)?;
        Self::from_pom_str(root, &content).map_err(|message| BuildError::InvalidPom {
            path: pom_path,
            message,
        })
    }

    /// `root` にあるプロジェクトのpomの内容をパース
    pub fn from_pom_str(root: &Path, content: &str) -> Result<Self, String> {
        let raw = parse_pom(content)?;

        let artifact_id = raw
            .artifact_id
            .clone()
            .ok_or_else(|| "missing <artifactId>".to_string())?;
        let mut vars = raw.properties.clone();
        let version = match raw.version.as_deref().or(raw.parent_version.as_deref()) {
            Some(v) => Some(expand_properties(v, &vars)?),
            None => None,
        };

        vars.insert("project.artifactId".to_string(), artifact_id.clone());
        vars.insert("project.basedir".to_string(), root.display().to_string());
        vars.insert("basedir".to_string(), root.display().to_string());
        if let Some(v) = &version {
            vars.insert("project.version".to_string(), v.clone());
        }

        let build_directory = raw
            .build_directory
            .as_deref()
            .map(|d| expand_properties(d, &vars))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_BUILD_DIRECTORY.to_string());
        let build_directory = root.join(build_directory);
        vars.insert(
            "project.build.directory".to_string(),
            build_directory.display().to_string(),
        );

        let final_name = match &raw.final_name {
            Some(name) => expand_properties(name, &vars)?,
            None => match &version {
                Some(v) => format!("{}-{}", artifact_id, v),
                None => artifact_id.clone(),
            },
        };

        Ok(Self {
            root: root.to_path_buf(),
            artifact_id,
            version,
            packaging: raw.packaging,
            final_name,
            build_directory,
        })
    }

    /// 成果物の拡張子
    pub fn extension(&self) -> &str {
        match self.packaging.as_deref() {
            Some("jar") => "jar",
            Some("ear") => "ear",
            _ => "war",
        }
    }

    /// 成果物があるはずの場所（存在の有無は問わない）
    pub fn artifact(&self) -> Artifact {
        let file_name = format!("{}.{}", self.final_name, self.extension());
        Artifact {
            path: self.build_directory.join(&file_name),
            file_name,
        }
    }

    /// 成果物。まだビルドされていなければエラー
    pub fn locate_artifact(&self) -> BuildResult<Artifact> {
        let artifact = self.artifact();
        if !artifact.path.is_file() {
            return Err(BuildError::ArtifactNotFound(artifact.path));
        }
        tracing::debug!("Located artifact at {}", artifact.path.display());
        Ok(artifact)
    }
}

fn parse_pom(content: &str) -> Result<RawPom, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut raw = RawPom::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| e.to_string())?.into_owned();
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                match segments.as_slice() {
                    ["project", "artifactId"] => raw.artifact_id = Some(text),
                    ["project", "version"] => raw.version = Some(text),
                    ["project", "packaging"] => raw.packaging = Some(text),
                    ["project", "parent", "version"] => raw.parent_version = Some(text),
                    ["project", "build", "finalName"] => raw.final_name = Some(text),
                    ["project", "build", "directory"] => raw.build_directory = Some(text),
                    ["project", "properties", key] => {
                        raw.properties.insert(key.to_string(), text);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.error_position(),
                    e
                ));
            }
        }
    }

    Ok(raw)
}

/// `${name}` を既知の値で置換する。未知の参照はそのまま残す
fn expand_properties(value: &str, vars: &HashMap<String, String>) -> Result<String, String> {
    let pattern = Regex::new(r"\$\{([^}]+)\}").map_err(|e| e.to_string())?;
    let expanded = pattern.replace_all(value, |caps: &regex::Captures| match vars.get(&caps[1]) {
        Some(v) => v.clone(),
        None => caps[0].to_string(),
    });
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>petstore</artifactId>
  <version>1.0-SNAPSHOT</version>
  <packaging>war</packaging>
  <dependencies>
    <dependency>
      <artifactId>servlet-api</artifactId>
      <version>3.1</version>
    </dependency>
  </dependencies>
</project>
"#;

    #[test]
    fn test_defaults_from_artifact_id_and_version() {
        let project = MavenProject::from_pom_str(Path::new("/work/petstore"), SIMPLE_POM).unwrap();
        assert_eq!(project.artifact_id, "petstore");
        assert_eq!(project.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert_eq!(project.final_name, "petstore-1.0-SNAPSHOT");
        assert_eq!(project.build_directory, PathBuf::from("/work/petstore/target"));

        let artifact = project.artifact();
        assert_eq!(artifact.file_name, "petstore-1.0-SNAPSHOT.war");
        assert_eq!(
            artifact.path,
            PathBuf::from("/work/petstore/target/petstore-1.0-SNAPSHOT.war")
        );
    }

    #[test]
    fn test_final_name_and_directory_with_properties() {
        let pom = r#"<project>
  <parent><artifactId>base</artifactId><version>2.1</version></parent>
  <artifactId>shop</artifactId>
  <packaging>jar</packaging>
  <properties><app.suffix>web</app.suffix></properties>
  <build>
    <directory>out</directory>
    <finalName>${project.artifactId}-${app.suffix}-${project.version}</finalName>
  </build>
</project>"#;
        let project = MavenProject::from_pom_str(Path::new("/src/shop"), pom).unwrap();
        assert_eq!(project.version.as_deref(), Some("2.1"));
        assert_eq!(project.final_name, "shop-web-2.1");
        assert_eq!(project.build_directory, PathBuf::from("/src/shop/out"));
        assert_eq!(project.artifact().file_name, "shop-web-2.1.jar");
    }

    #[test]
    fn test_missing_artifact_id() {
        let err = MavenProject::from_pom_str(Path::new("/x"), "<project></project>").unwrap_err();
        assert!(err.contains("artifactId"));
    }

    #[test]
    fn test_expand_properties_keeps_unknown() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), "1".to_string());
        assert_eq!(
            expand_properties("${a}-${b}-${", &vars).unwrap(),
            "1-${b}-${"
        );
    }

    #[test]
    fn test_version_from_property() {
        let pom = r#"<project>
  <artifactId>shop</artifactId>
  <version>${revision}</version>
  <properties>
    <revision>1.4.0</revision>
  </properties>
</project>"#;
        let project = MavenProject::from_pom_str(Path::new("/src/shop"), pom).unwrap();
        assert_eq!(project.version.as_deref(), Some("1.4.0"));
        assert_eq!(project.final_name, "shop-1.4.0");
        assert_eq!(project.artifact().file_name, "shop-1.4.0.war");
    }

    #[test]
    fn test_parent_version_from_property() {
        let pom = r#"<project>
  <parent>
    <artifactId>shop-parent</artifactId>
    <version>${revision}${changelist}</version>
  </parent>
  <artifactId>shop-web</artifactId>
  <properties>
    <revision>2.0</revision>
    <changelist>-SNAPSHOT</changelist>
  </properties>
</project>"#;
        let project = MavenProject::from_pom_str(Path::new("/src/shop"), pom).unwrap();
        assert_eq!(project.final_name, "shop-web-2.0-SNAPSHOT");
    }

    #[test]
    fn test_load_and_locate() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(POM_XML), SIMPLE_POM).unwrap();

        let project = MavenProject::load(temp_dir.path()).unwrap();
        let err = project.locate_artifact().unwrap_err();
        assert!(matches!(err, BuildError::ArtifactNotFound(_)));

        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("petstore-1.0-SNAPSHOT.war"), b"PK").unwrap();

        let artifact = project.locate_artifact().unwrap();
        assert_eq!(artifact.file_name, "petstore-1.0-SNAPSHOT.war");
    }

    #[test]
    fn test_load_without_pom() {
        let temp_dir = tempdir().unwrap();
        let err = MavenProject::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::PomNotFound(_)));
    }
}

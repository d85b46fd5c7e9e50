use crate::dockerfile::DOCKERFILE_NAME;
use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsStr;
use std::path::Path;
use tar::Builder;

const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024;

pub struct ContextBuilder;

impl ContextBuilder {
    /// `context_path` をtar.gzのビルドコンテキストとして作成
    ///
    /// Dockerfileはアーカイブのルートに `Dockerfile` として置かれる。
    /// コンテキスト外にある場合は明示的に追加する。
    pub fn create_context(context_path: &Path, dockerfile_path: &Path) -> BuildResult<Vec<u8>> {
        if !context_path.is_dir() {
            return Err(BuildError::ContextNotFound(context_path.to_path_buf()));
        }
        tracing::debug!("Creating build context from: {}", context_path.display());

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            tar.append_dir_all(".", context_path)?;

            let inside_context = dockerfile_path.parent() == Some(context_path)
                && dockerfile_path.file_name() == Some(OsStr::new(DOCKERFILE_NAME));
            if !inside_context {
                let content = std::fs::read(dockerfile_path)?;
                let mut header = tar::Header::new_gnu();
                header.set_path(DOCKERFILE_NAME).map_err(|e| {
                    BuildError::InvalidConfig(format!("Failed to set Dockerfile path: {}", e))
                })?;
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                tar.append(&header, &content[..])?;
            }

            tar.into_inner()?.finish()?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    fn check_context_size(size: usize) {
        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "Build context is large ({}MB); consider a .dockerignore in the build directory",
                size / 1024 / 1024
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entries(archive: Vec<u8>) -> Vec<String> {
        let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
        let mut tar = tar::Archive::new(decoder);
        tar.entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_context_with_dockerfile_inside() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("app.war"), "PK").unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM tomcat").unwrap();

        let archive = ContextBuilder::create_context(temp_dir.path(), &dockerfile).unwrap();
        let names = entries(archive);
        assert!(names.iter().any(|n| n.ends_with("app.war")));
        assert_eq!(names.iter().filter(|n| n.ends_with("Dockerfile")).count(), 1);
    }

    #[test]
    fn test_context_with_dockerfile_outside() {
        let context_dir = tempdir().unwrap();
        fs::write(context_dir.path().join("app.war"), "PK").unwrap();
        let other_dir = tempdir().unwrap();
        let dockerfile = other_dir.path().join("custom.dockerfile");
        fs::write(&dockerfile, "FROM tomcat").unwrap();

        let archive = ContextBuilder::create_context(context_dir.path(), &dockerfile).unwrap();

        let extract_dir = tempdir().unwrap();
        let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
        tar::Archive::new(decoder).unpack(extract_dir.path()).unwrap();
        assert!(extract_dir.path().join("Dockerfile").exists());
        assert!(extract_dir.path().join("app.war").exists());
    }

    #[test]
    fn test_missing_context_dir() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("target");
        let err = ContextBuilder::create_context(&missing, &missing.join("Dockerfile")).unwrap_err();
        assert!(matches!(err, BuildError::ContextNotFound(_)));
    }
}

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{self, Write};
use std::path::Path;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストを tar アーカイブとして作成
    ///
    /// `gzip` が true の場合は gzip 圧縮したアーカイブを返す。
    // TODO: .dockerignore に書かれたパスをアーカイブから除外する
    pub fn create_context(context_path: &Path, gzip: bool) -> io::Result<Vec<u8>> {
        if !context_path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "build context directory not found: {}",
                    context_path.display()
                ),
            ));
        }

        tracing::debug!(
            context = %context_path.display(),
            gzip,
            "Creating build context"
        );

        let archive_data = if gzip {
            let encoder = GzEncoder::new(Vec::new(), Compression::default());
            Self::append_context(encoder, context_path)?.finish()?
        } else {
            Self::append_context(Vec::new(), context_path)?
        };

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    fn append_context<W: Write>(writer: W, context_path: &Path) -> io::Result<W> {
        let mut tar = Builder::new(writer);
        tar.append_dir_all(".", context_path)?;
        tar.into_inner()
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                size_mb = size / 1024 / 1024,
                "Build context is very large, consider building from a dedicated directory"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn archive_entries<R: io::Read>(reader: R) -> Vec<String> {
        let mut archive = tar::Archive::new(reader);
        archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_create_plain_context() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("Dockerfile"), "FROM alpine\nRUN echo test").unwrap();
        let subdir = temp_dir.path().join("app");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("main.sh"), "echo hi").unwrap();

        let archive = ContextBuilder::create_context(temp_dir.path(), false).unwrap();
        let entries = archive_entries(io::Cursor::new(archive));

        assert!(entries.iter().any(|e| e.ends_with("Dockerfile")));
        assert!(entries.iter().any(|e| e.ends_with("app/main.sh")));
    }

    #[test]
    fn test_create_gzip_context() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("Dockerfile"), "FROM alpine").unwrap();

        let archive = ContextBuilder::create_context(temp_dir.path(), true).unwrap();

        // gzip マジックナンバー
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);

        let extract_dir = tempdir().unwrap();
        let decoder = flate2::read::GzDecoder::new(io::Cursor::new(archive));
        tar::Archive::new(decoder).unpack(extract_dir.path()).unwrap();
        assert!(extract_dir.path().join("Dockerfile").exists());
    }

    #[test]
    fn test_missing_context_dir() {
        let temp_dir = tempdir().unwrap();
        let result = ContextBuilder::create_context(&temp_dir.path().join("nope"), false);

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const TEMPLATE: &str = "FROM ubuntu:{{ version }}\nRUN apt-get install -y {{ packages }}\n";
pub const VARS: &str = "version: \"24.04\"\npackages: git make curl\n";

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    /// テンプレートと変数ファイルが揃ったプロジェクト
    pub fn new() -> Self {
        let project = Self::empty();
        project.write("Dockerfile.template", TEMPLATE);
        project.write("varsfile.yaml", VARS);
        project
    }

    pub fn empty() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.root.path().join(name), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// プロジェクトディレクトリで実行する jocker コマンド
    #[allow(deprecated)]
    pub fn jocker(&self) -> Command {
        let mut cmd = Command::cargo_bin("jocker").unwrap();
        cmd.current_dir(self.path())
            .env_remove("JOCKER_DOCKER_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

//! 1回の実行で処理するリクエスト

use crate::error::{CoreError, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// デフォルトのテンプレートファイル
pub const DEFAULT_TEMPLATE_FILE: &str = "Dockerfile.template";

/// デフォルトの変数ファイル
pub const DEFAULT_VARS_FILE: &str = "varsfile.yaml";

/// デフォルトの出力先
pub const DEFAULT_OUTPUT_FILE: &str = "Dockerfile";

/// `repository[:tag]` 形式のイメージ指定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    pub repository: String,
    pub tag: Option<String>,
}

impl ImageTarget {
    /// 最初の `:` でリポジトリとタグに分割する
    ///
    /// - `myrepo:v1` -> (`myrepo`, `Some("v1")`)
    /// - `myrepo` -> (`myrepo`, `None`)
    pub fn parse(target: &str) -> Self {
        match target.split_once(':') {
            Some((repository, tag)) => Self {
                repository: repository.to_string(),
                tag: Some(tag.to_string()),
            },
            None => Self {
                repository: target.to_string(),
                tag: None,
            },
        }
    }
}

impl From<&str> for ImageTarget {
    fn from(target: &str) -> Self {
        Self::parse(target)
    }
}

impl fmt::Display for ImageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.repository, tag),
            None => f.write_str(&self.repository),
        }
    }
}

/// テンプレート展開とビルド/プッシュの指定
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub template_file: PathBuf,
    pub vars_file: PathBuf,
    pub output_file: PathBuf,
    pub dry_run: bool,
    pub build: Option<ImageTarget>,
    pub push: Option<ImageTarget>,
    pub verbose: bool,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_FILE, DEFAULT_VARS_FILE, DEFAULT_OUTPUT_FILE)
    }
}

impl BuildRequest {
    pub fn new(
        template_file: impl Into<PathBuf>,
        vars_file: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_file: template_file.into(),
            vars_file: vars_file.into(),
            output_file: output_file.into(),
            dry_run: false,
            build: None,
            push: None,
            verbose: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_build(mut self, target: Option<ImageTarget>) -> Self {
        self.build = target;
        self
    }

    pub fn with_push(mut self, target: Option<ImageTarget>) -> Self {
        self.push = target;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// ビルドが必要か（プッシュはビルドを含む）
    pub fn wants_build(&self) -> bool {
        self.build.is_some() || self.push.is_some()
    }

    /// ビルド時に付けるイメージ名
    ///
    /// `build` が無く `push` だけ指定された場合はプッシュ先を使う。
    pub fn build_target(&self) -> Option<&ImageTarget> {
        self.build.as_ref().or(self.push.as_ref())
    }

    /// テンプレートを置いたディレクトリ
    pub fn template_dir(&self) -> &Path {
        self.template_file.parent().unwrap_or_else(|| Path::new(""))
    }

    /// 実行前の整合性チェック
    ///
    /// dry-run とビルド/プッシュは同時に指定できない。
    pub fn validate(&self) -> Result<()> {
        if self.dry_run && self.wants_build() {
            return Err(CoreError::ConflictingOptions);
        }
        Ok(())
    }
}

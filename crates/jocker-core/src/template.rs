//! テンプレート展開機能
//!
//! Teraを使用して Dockerfile テンプレートの展開を行います。

use crate::error::{CoreError, Result};
use crate::vars::{self, Variables};
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::{debug, info};

/// テンプレートプロセッサ
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    /// 新しいテンプレートプロセッサを作成
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// 変数を追加
    pub fn add_variable(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.insert(key.into(), &value);
    }

    /// 複数の変数を追加
    pub fn add_variables(&mut self, variables: Variables) {
        for (key, value) in variables {
            self.context.insert(key, &value);
        }
    }

    /// 文字列をテンプレートとして展開
    pub fn render_str(&mut self, template: &str) -> std::result::Result<String, String> {
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| extract_tera_error_detail(&e))
    }

    /// ファイルを読み込んでテンプレート展開
    pub fn render_file(&mut self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::TemplateRender {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.render_str(&content)
            .map_err(|message| CoreError::TemplateRender {
                file: path.to_path_buf(),
                message,
            })
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// テンプレートエンジンへの1回分の依頼
///
/// `materialize` が false の場合は展開結果を返すだけでファイルは書かない。
#[derive(Debug, Clone)]
pub struct TemplateJob {
    pub template_file: String,
    pub vars_source: PathBuf,
    pub output_file: PathBuf,
    pub template_dir: PathBuf,
    pub materialize: bool,
}

impl TemplateJob {
    /// テンプレートファイルのフルパス
    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(&self.template_file)
    }

    /// 変数を読み込んでテンプレートを展開し、必要なら出力ファイルに書き込む
    #[tracing::instrument(skip(self), fields(template = %self.template_path().display()))]
    pub fn generate(&self) -> Result<String> {
        let variables = vars::load_variables(&self.vars_source)?;

        let mut processor = TemplateProcessor::new();
        processor.add_variables(variables);
        let output = processor.render_file(&self.template_path())?;

        if self.materialize {
            write_output(&self.output_file, &output)?;
            info!(output_file = %self.output_file.display(), "Wrote Dockerfile");
        } else {
            debug!("Skipping output file (materialize disabled)");
        }

        Ok(output)
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    let to_error = |source| CoreError::OutputUnwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }

    std::fs::write(path, content).map_err(to_error)
}

/// Teraエラーから詳細情報を抽出
///
/// 未定義変数の場合は変数名を取り出して分かりやすいメッセージにする。
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    // "Variable `xxx` not found in context"
    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!(
            "undefined variable: `{}`\nhint: define it in the variables file",
            var_name
        );
    }

    full_error
}

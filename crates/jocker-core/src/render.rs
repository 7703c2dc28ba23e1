//! テンプレートエンジンへのアダプタ

use crate::error::{CoreError, Result};
use crate::request::BuildRequest;
use crate::template::TemplateJob;
use std::path::PathBuf;

/// 展開済みの Dockerfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub content: String,
    pub output_file: PathBuf,
    /// 出力ファイルに書き込んだかどうか
    pub written: bool,
}

/// リクエストに従ってテンプレートを展開する
///
/// テンプレートファイルの存在はエンジンに渡す前に確認し、
/// 無ければ `TemplateMissing` を返す。
pub fn render(request: &BuildRequest) -> Result<RenderedArtifact> {
    let template_file = &request.template_file;
    if !template_file.is_file() {
        tracing::error!(template_file = %template_file.display(), "template file missing");
        return Err(CoreError::TemplateMissing(template_file.clone()));
    }

    let file_name = template_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::TemplateMissing(template_file.clone()))?;

    let job = TemplateJob {
        template_file: file_name,
        vars_source: request.vars_file.clone(),
        output_file: request.output_file.clone(),
        template_dir: request.template_dir().to_path_buf(),
        materialize: !request.dry_run,
    };
    tracing::debug!(?job, "Rendering template");

    let content = job.generate()?;

    Ok(RenderedArtifact {
        content,
        output_file: job.output_file,
        written: job.materialize,
    })
}

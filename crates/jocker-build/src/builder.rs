use crate::context::ContextBuilder;
use crate::error::{EngineError, Result};
use bollard::Docker;
use bollard::query_parameters::BuildImageOptionsBuilder;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};
use jocker_config::BuildConfig;
use std::path::Path;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルドし、エンジンの生の出力を返す
    ///
    /// `config.stream` が true ならチャンクごと、false なら全チャンクを連結した
    /// 1つの文字列を返す。
    pub async fn build_image(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        tag: &str,
        config: &BuildConfig,
    ) -> Result<Vec<String>> {
        tracing::info!("Building image: {}", tag);

        let gzip = config.encoding.as_deref() == Some("gzip");
        let context_data = ContextBuilder::create_context(context_dir, gzip)?;

        let options = BuildImageOptionsBuilder::default()
            .dockerfile(dockerfile)
            .t(tag)
            .q(config.quiet)
            .nocache(config.nocache)
            .rm(config.rm)
            .forcerm(config.forcerm)
            .build();
        tracing::debug!("Build options: {:?}", options);

        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        let mut chunks = Vec::new();
        while let Some(msg) = stream.next().await {
            let info = msg?;
            let chunk = serde_json::to_string(&info)
                .map_err(|e| EngineError::Connection(format!("unreadable build output: {}", e)))?;
            chunks.push(chunk);
        }

        if config.stream {
            Ok(chunks)
        } else {
            Ok(vec![chunks.concat()])
        }
    }
}

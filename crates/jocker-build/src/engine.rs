//! コンテナエンジンとの境界
//!
//! オーケストレータは `Engine` トレイト越しにビルドとプッシュを呼び出す。
//! 実装は Docker（Bollard）だが、テストではモックに差し替えられる。

use crate::builder::ImageBuilder;
use crate::error::{EngineError, Result};
use crate::pusher::ImagePusher;
use async_trait::async_trait;
use bollard::{ClientVersion, Docker};
use jocker_config::{BuildConfig, ClientConfig};
use std::path::Path;

#[async_trait]
pub trait Engine: Send + Sync {
    /// `context_dir` をコンテキストに `dockerfile` からイメージをビルドする
    ///
    /// 戻り値はエンジンの生のステータス出力（チャンク単位、または連結済み）。
    async fn build(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        tag: &str,
        options: &BuildConfig,
    ) -> Result<Vec<String>>;

    /// イメージをプッシュし、連結されたステータス出力を返す
    async fn push(&self, repository: &str, tag: Option<&str>) -> Result<String>;
}

/// Docker デーモンに接続するエンジン
pub struct DockerEngine {
    builder: ImageBuilder,
    pusher: ImagePusher,
}

impl DockerEngine {
    /// クライアント設定に従って Docker に接続
    pub fn connect(client: &ClientConfig) -> Result<Self> {
        let (major_version, minor_version) = client.api_version().ok_or_else(|| {
            EngineError::Connection(format!("invalid API version: {}", client.version))
        })?;
        let version = ClientVersion {
            major_version,
            minor_version,
        };

        tracing::debug!(
            base_url = %client.base_url,
            version = %client.version,
            timeout = client.timeout,
            "Connecting to Docker"
        );

        let docker = if client.is_unix_socket() {
            Docker::connect_with_unix(&client.base_url, client.timeout, &version)?
        } else {
            Docker::connect_with_http(&client.base_url, client.timeout, &version)?
        };

        Ok(Self::with_docker(docker))
    }

    pub fn with_docker(docker: Docker) -> Self {
        Self {
            builder: ImageBuilder::new(docker.clone()),
            pusher: ImagePusher::new(docker),
        }
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn build(
        &self,
        context_dir: &Path,
        dockerfile: &str,
        tag: &str,
        options: &BuildConfig,
    ) -> Result<Vec<String>> {
        self.builder
            .build_image(context_dir, dockerfile, tag, options)
            .await
    }

    async fn push(&self, repository: &str, tag: Option<&str>) -> Result<String> {
        self.pusher.push(repository, tag).await
    }
}

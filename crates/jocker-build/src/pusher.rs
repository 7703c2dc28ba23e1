//! イメージプッシュ処理
//!
//! ビルドしたイメージをコンテナレジストリにプッシュします。

use crate::auth::RegistryAuth;
use crate::error::{EngineError, Result};
use bollard::Docker;
use bollard::query_parameters::PushImageOptionsBuilder;
use futures_util::StreamExt;

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self::with_auth(docker, RegistryAuth::new())
    }

    /// 認証情報マネージャーを指定して作成
    pub fn with_auth(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// イメージをレジストリにプッシュし、エンジンの出力を連結した文字列で返す
    ///
    /// タグが無い場合はリポジトリの全タグがプッシュされる。
    pub async fn push(&self, repository: &str, tag: Option<&str>) -> Result<String> {
        let credentials = self.auth.credentials_for(repository)?;

        let mut options = PushImageOptionsBuilder::default();
        if let Some(tag) = tag {
            options = options.tag(tag);
        }

        tracing::info!(
            repository = %repository,
            tag = tag.unwrap_or("(all)"),
            authenticated = credentials.is_some(),
            "Pushing image"
        );

        let mut stream = self
            .docker
            .push_image(repository, Some(options.build()), credentials);

        let mut output = String::new();
        while let Some(result) = stream.next().await {
            let info = result?;
            let chunk = serde_json::to_string(&info)
                .map_err(|e| EngineError::Connection(format!("unreadable push output: {}", e)))?;
            output.push_str(&chunk);
        }

        Ok(output)
    }
}

//! Docker クライアント / ビルド設定の読み込み
//!
//! YAML ファイルの `client` と `build` の2つのマッピングを読み込みます。
//! ファイルが指定されない場合は組み込みのデフォルト値を使用します。

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// デフォルトの Docker エンドポイント
pub const DEFAULT_BASE_URL: &str = "unix:///var/run/docker.sock";

/// デフォルトの Docker API バージョン
pub const DEFAULT_API_VERSION: &str = "1.41";

/// デフォルトのタイムアウト（秒）
pub const DEFAULT_TIMEOUT: u64 = 10;

/// エンジン設定全体
///
/// `client` / `build` はキー単位でデフォルトにフォールバックする。
/// 片方だけ書かれたファイルでも、もう片方はデフォルト値で補われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default = "BuildConfig::defaults")]
    pub build: BuildConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            build: BuildConfig::defaults(),
        }
    }
}

/// Docker への接続パラメータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// `unix://` ソケットまたは `tcp://` / `http://` エンドポイント
    pub base_url: String,
    /// `MAJOR.MINOR` 形式の API バージョン
    pub version: String,
    /// リクエストのタイムアウト（秒）
    pub timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// API バージョンを `(major, minor)` に分解
    pub fn api_version(&self) -> Option<(usize, usize)> {
        let (major, minor) = self.version.trim().split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }

    /// unix ソケットで接続するかどうか
    pub fn is_unix_socket(&self) -> bool {
        self.base_url.starts_with("unix://")
    }
}

/// ビルド API 呼び出しのパラメータ
///
/// ファイルで `build` が指定された場合、省略されたオプションは
/// Docker 側のデフォルト（全て無効）になる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// ビルド出力を抑制
    pub quiet: bool,
    /// キャッシュを使用しない
    pub nocache: bool,
    /// 成功時に中間コンテナを削除
    pub rm: bool,
    /// 失敗時も中間コンテナを削除
    pub forcerm: bool,
    /// ビルド出力をチャンク単位で受け取る（false なら連結した1つの文字列）
    pub stream: bool,
    /// ビルドコンテキストのエンコーディング（`gzip` のみ対応）
    pub encoding: Option<String>,
}

impl BuildConfig {
    /// 設定ファイルなしで使う組み込みのビルド設定
    pub fn defaults() -> Self {
        Self {
            rm: true,
            ..Default::default()
        }
    }
}

/// 設定を読み込む
///
/// `None` の場合は組み込みのデフォルトを返す。
/// パスが指定された場合は読み込みに失敗すると `ConfigUnreadable`、
/// YAML のマッピングとして解釈できないと `ConfigMalformed` になる。
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        tracing::debug!("No config file given, using default engine config");
        return Ok(EngineConfig::default());
    };

    tracing::debug!(path = %path.display(), "Loading engine config");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse(&content).map_err(|message| ConfigError::ConfigMalformed {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(?config, "Loaded engine config");
    Ok(config)
}

/// YAML 文字列から設定を組み立てる
fn parse(content: &str) -> std::result::Result<EngineConfig, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    if !value.is_mapping() {
        return Err(format!(
            "expected a mapping with `client` and `build` keys, found {}",
            describe(&value)
        ));
    }

    let config: EngineConfig = serde_yaml::from_value(value).map_err(|e| e.to_string())?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &EngineConfig) -> std::result::Result<(), String> {
    if config.client.api_version().is_none() {
        return Err(format!(
            "client.version must look like MAJOR.MINOR, got {:?}",
            config.client.version
        ));
    }

    if config.client.timeout == 0 {
        return Err("client.timeout must be greater than 0".to_string());
    }

    if let Some(encoding) = &config.build.encoding
        && encoding != "gzip"
    {
        return Err(format!("build.encoding {:?} is not supported", encoding));
    }

    Ok(())
}

fn describe(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "an empty document",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

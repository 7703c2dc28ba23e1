//! プッシュ時のレジストリ認証
//!
//! Docker の config.json から認証情報を探し、Bollard の DockerCredentials に変換します。
//! 探す順序は `auths`、`credHelpers`（レジストリ別）、`credsStore` の順。

use crate::error::{EngineError, Result};
use base64::Engine as _;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Docker Hub を表すレジストリ名
pub const DOCKER_HUB: &str = "docker.io";

/// config.json で Docker Hub に使われる従来のキー
const DOCKER_HUB_LEGACY_KEY: &str = "https://index.docker.io/v1/";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfigFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    #[serde(default)]
    cred_helpers: HashMap<String, String>,
    creds_store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64エンコードされた "username:password"
    auth: Option<String>,
}

/// credential helper の `get` の応答
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HelperResponse {
    username: String,
    secret: String,
}

/// レジストリ認証情報の解決
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    config_path: PathBuf,
    /// credential helper を探すディレクトリ（未指定なら PATH）
    helper_dir: Option<PathBuf>,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// `$DOCKER_CONFIG/config.json`、無ければ `~/.docker/config.json` を使う
    pub fn new() -> Self {
        let config_dir = std::env::var_os("DOCKER_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".docker")))
            .unwrap_or_else(|| PathBuf::from(".docker"));

        Self::with_config_path(config_dir.join("config.json"))
    }

    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            helper_dir: None,
        }
    }

    /// `docker-credential-*` を指定ディレクトリから実行する
    pub fn with_helper_dir(mut self, helper_dir: PathBuf) -> Self {
        self.helper_dir = Some(helper_dir);
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// リポジトリのプッシュに使う認証情報を取得
    ///
    /// config.json が無い場合や該当エントリが無い場合は `Ok(None)`（匿名でプッシュ）。
    pub fn credentials_for(&self, repository: &str) -> Result<Option<DockerCredentials>> {
        let registry = registry_of(repository);

        if !self.config_path.exists() {
            tracing::debug!(config = %self.config_path.display(), "Docker config.json not found");
            return Ok(None);
        }

        let config = self.load(&registry)?;

        for key in lookup_keys(&registry) {
            if let Some(auth_b64) = config.auths.get(key).and_then(|entry| entry.auth.as_deref())
                && let Some(creds) = decode_auth(auth_b64, &registry)?
            {
                tracing::debug!(registry = %registry, "Using credentials from auths");
                return Ok(Some(creds));
            }
        }

        let helper = lookup_keys(&registry)
            .iter()
            .find_map(|key| config.cred_helpers.get(*key))
            .or(config.creds_store.as_ref());

        if let Some(helper) = helper {
            // Docker Hub の認証情報は helper 側では従来のキーで保存されている
            for key in lookup_keys(&registry) {
                tracing::debug!(server = %key, helper = %helper, "Trying credential helper");
                match self.run_helper(helper, key) {
                    Ok(Some(creds)) => return Ok(Some(creds)),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "Credential helper failed"),
                }
            }
        }

        tracing::debug!(registry = %registry, "No credentials found, pushing anonymously");
        Ok(None)
    }

    /// `docker-credential-<helper> get` を実行
    ///
    /// `server` は helper に渡すキーで、そのまま `serveraddress` になる。
    fn run_helper(&self, helper: &str, server: &str) -> Result<Option<DockerCredentials>> {
        let helper_cmd = format!("docker-credential-{}", helper);
        let program = match &self.helper_dir {
            Some(dir) => dir.join(&helper_cmd),
            None => PathBuf::from(&helper_cmd),
        };
        let to_error = |message: String| EngineError::Auth {
            registry: server.to_string(),
            message,
        };

        let mut child = Command::new(&program)
            .arg("get")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| to_error(format!("failed to run {}: {}", helper_cmd, e)))?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(server.as_bytes())
        {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(to_error(format!("failed to write to {}: {}", helper_cmd, e)));
        }

        let output = child
            .wait_with_output()
            .map_err(|e| to_error(format!("{} failed: {}", helper_cmd, e)))?;

        if !output.status.success() {
            tracing::debug!(
                helper = %helper_cmd,
                server = %server,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Credential helper has no entry"
            );
            return Ok(None);
        }

        let response: HelperResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| to_error(format!("unexpected {} response: {}", helper_cmd, e)))?;

        Ok(Some(DockerCredentials {
            username: Some(response.username),
            password: Some(response.secret),
            serveraddress: Some(server.to_string()),
            ..Default::default()
        }))
    }

    fn load(&self, registry: &str) -> Result<DockerConfigFile> {
        let content = std::fs::read_to_string(&self.config_path).map_err(|e| EngineError::Auth {
            registry: registry.to_string(),
            message: format!("failed to read {}: {}", self.config_path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| EngineError::Auth {
            registry: registry.to_string(),
            message: format!("failed to parse {}: {}", self.config_path.display(), e),
        })
    }
}

/// リポジトリ名からレジストリを取り出す
///
/// - `ghcr.io/org/app` -> `ghcr.io`
/// - `localhost:5000/app` -> `localhost:5000`
/// - `myuser/app`, `nginx` -> `docker.io`
pub fn registry_of(repository: &str) -> String {
    match repository.split_once('/') {
        Some((first, _))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            first.to_string()
        }
        _ => DOCKER_HUB.to_string(),
    }
}

/// config.json で探すキーの候補
fn lookup_keys(registry: &str) -> Vec<&str> {
    if registry == DOCKER_HUB {
        vec![DOCKER_HUB, DOCKER_HUB_LEGACY_KEY]
    } else {
        vec![registry]
    }
}

fn decode_auth(auth_b64: &str, registry: &str) -> Result<Option<DockerCredentials>> {
    let to_error = |message: String| EngineError::Auth {
        registry: registry.to_string(),
        message,
    };

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth_b64.trim())
        .map_err(|e| to_error(format!("failed to decode auth: {}", e)))?;
    let decoded =
        String::from_utf8(decoded).map_err(|e| to_error(format!("invalid UTF-8 in auth: {}", e)))?;

    Ok(decoded
        .split_once(':')
        .map(|(username, password)| DockerCredentials {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            serveraddress: Some(registry.to_string()),
            ..Default::default()
        }))
}

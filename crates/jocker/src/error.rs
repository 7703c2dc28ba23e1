use jocker_build::EngineError;
use jocker_config::ConfigError;
use jocker_core::CoreError;
use std::fmt;
use thiserror::Error;

/// dry-run とビルド/プッシュの同時指定
pub const EXIT_CONFLICTING_OPTIONS: i32 = 100;
/// テンプレートファイルが無い
pub const EXIT_TEMPLATE_MISSING: i32 = 508;
/// エンジンがリクエストを拒否した
pub const EXIT_ENGINE_ERROR: i32 = 500;
/// エンジンがタイムアウトした
pub const EXIT_ENGINE_TIMEOUT: i32 = 408;
/// その他のエラー
pub const EXIT_FAILURE: i32 = 1;

/// エンジン呼び出しの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Push,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Build => f.write_str("build"),
            Phase::Push => f.write_str("push"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JockerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{phase} failed: {source}")]
    Engine {
        phase: Phase,
        #[source]
        source: EngineError,
    },

    #[error("no {0} target requested")]
    NoTarget(Phase),
}

impl JockerError {
    pub fn engine(phase: Phase, source: EngineError) -> Self {
        JockerError::Engine { phase, source }
    }

    /// 非 verbose モードで使うプロセスの終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            JockerError::Core(CoreError::ConflictingOptions) => EXIT_CONFLICTING_OPTIONS,
            JockerError::Core(CoreError::TemplateMissing(_)) => EXIT_TEMPLATE_MISSING,
            JockerError::Engine { source, .. } if source.is_timeout() => EXIT_ENGINE_TIMEOUT,
            JockerError::Engine { .. } => EXIT_ENGINE_ERROR,
            _ => EXIT_FAILURE,
        }
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            JockerError::Engine { phase, source } => {
                format!("{} failed: {}", phase, source.user_message())
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JockerError>;

//! jocker - Dockerfile テンプレートの展開とイメージのビルド/プッシュ
//!
//! CLI（`main.rs`）はこのクレートの [`Jocker`] を通して1回分の実行を行う。

pub mod error;
pub mod jocker;

pub use error::{JockerError, Phase, Result};
pub use jocker::{Jocker, Outcome, RunState};

pub use jocker_build::{DockerEngine, Engine, EngineError};
pub use jocker_config::{ClientConfig, EngineConfig};
pub use jocker_core::{BuildRequest, ImageTarget, RenderedArtifact};

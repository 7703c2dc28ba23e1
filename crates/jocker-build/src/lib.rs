//! jocker の Docker イメージビルド機能
//!
//! ビルドコンテキストの作成、イメージのビルドとプッシュ、
//! そしてエンジンが返すステータス出力のパースを提供します。

pub mod auth;
pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod pusher;
pub mod status;

pub use auth::RegistryAuth;
pub use builder::ImageBuilder;
pub use context::ContextBuilder;
pub use engine::{DockerEngine, Engine};
pub use error::{EngineError, Result};
pub use pusher::ImagePusher;
pub use status::{StatusLine, decode_status, parse_status};

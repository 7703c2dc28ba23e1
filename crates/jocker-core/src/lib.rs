//! jocker の中核機能
//!
//! 変数ファイルを読み込み、Dockerfile テンプレートを展開します。

pub mod error;
pub mod render;
pub mod request;
pub mod template;
pub mod vars;

pub use error::{CoreError, Result};
pub use render::{RenderedArtifact, render};
pub use request::{BuildRequest, ImageTarget};
pub use template::{TemplateJob, TemplateProcessor};
pub use vars::{Variables, load_variables};

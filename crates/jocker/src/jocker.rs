//! テンプレート展開からビルド、プッシュまでの一連の流れ
//!
//! 1回の実行は `Created → Rendered → {DryRunReported | Built} → Pushed → Done`
//! の順に進み、失敗した時点で `Failed` になる。各段階は前の段階が終わってから始まる。

use crate::error::{JockerError, Phase, Result};
use jocker_build::{Engine, EngineError, decode_status};
use jocker_config::{ClientConfig, EngineConfig};
use jocker_core::{BuildRequest, ImageTarget, RenderedArtifact};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// 実行の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Rendered,
    DryRunReported,
    Built,
    Pushed,
    Done,
    Failed,
}

/// 実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// dry-run: 展開結果のみ
    DryRun(RenderedArtifact),
    /// Dockerfile を書き出しただけ
    Generated(RenderedArtifact),
    Built { image: String },
    Pushed { image: String },
}

pub struct Jocker {
    request: BuildRequest,
    config: EngineConfig,
    state: RunState,
}

impl Jocker {
    pub fn new(request: BuildRequest, config: EngineConfig) -> Self {
        Self {
            request,
            config,
            state: RunState::Created,
        }
    }

    /// リクエストを検証してから設定ファイルを読み込む
    ///
    /// オプションの矛盾はファイルに触れる前に検出する。
    pub fn configure(request: BuildRequest, config_path: Option<&Path>) -> Result<Self> {
        if let Err(e) = request.validate() {
            error!("dryrun requested, cannot build or push");
            return Err(e.into());
        }

        let config = jocker_config::load(config_path)?;
        Ok(Self::new(request, config))
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }

    fn fail(&mut self, err: JockerError) -> JockerError {
        self.transition(RunState::Failed);
        err
    }

    /// テンプレートを展開する（`Created → Rendered`）
    ///
    /// dry-run の場合は展開結果を報告して `DryRunReported` で止まる。
    pub fn generate(&mut self) -> Result<RenderedArtifact> {
        if let Err(e) = self.request.validate() {
            error!("dryrun requested, cannot build or push");
            return Err(self.fail(e.into()));
        }

        debug!(
            template_file = %self.request.template_file.display(),
            vars_file = %self.request.vars_file.display(),
            output_file = %self.request.output_file.display(),
            "Generating Dockerfile"
        );

        let artifact = match jocker_core::render(&self.request) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.transition(RunState::Rendered);

        if self.request.dry_run {
            info!("Potential Dockerfile output is:\n{}", artifact.content);
            self.transition(RunState::DryRunReported);
        }

        Ok(artifact)
    }

    /// イメージをビルドする（`Rendered → Built`）
    ///
    /// 失敗した場合、この後にプッシュが控えていれば `Failed` にはしない。
    pub async fn build(&mut self, engine: &dyn Engine) -> Result<String> {
        let Some(target) = self.request.build_target().cloned() else {
            return Err(JockerError::NoTarget(Phase::Build));
        };
        let image = target.to_string();

        let result = self.run_build(engine, &image).await;
        match result {
            Ok(()) => {
                info!(image = %image, "Successfully built");
                self.transition(RunState::Built);
                Ok(image)
            }
            Err(e) => {
                error!(image = %image, error = %e, "Build failed");
                let err = JockerError::engine(Phase::Build, e);
                if self.request.push.is_some() {
                    warn!("Continuing with push after failed build");
                    Err(err)
                } else {
                    Err(self.fail(err))
                }
            }
        }
    }

    async fn run_build(&self, engine: &dyn Engine, image: &str) -> std::result::Result<(), EngineError> {
        let output_file = std::path::absolute(&self.request.output_file)?;
        let context_dir = output_file.parent().unwrap_or_else(|| Path::new("/"));
        let dockerfile = output_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| jocker_core::request::DEFAULT_OUTPUT_FILE.to_string());

        info!("building image");
        debug!(
            context = %context_dir.display(),
            dockerfile = %dockerfile,
            "building docker image from file"
        );
        info!("pending build process, please hold...");

        let chunks = engine
            .build(context_dir, &dockerfile, image, &self.config.build)
            .await?;

        for chunk in &chunks {
            log_status(Phase::Build, chunk)?;
        }
        Ok(())
    }

    /// イメージをプッシュする（`Built → Pushed`）
    pub async fn push(&mut self, engine: &dyn Engine) -> Result<String> {
        let Some(target) = self.request.push.clone() else {
            return Err(JockerError::NoTarget(Phase::Push));
        };
        let image = target.to_string();

        match run_push(engine, &target).await {
            Ok(()) => {
                info!(image = %image, "Successfully pushed");
                self.transition(RunState::Pushed);
                Ok(image)
            }
            Err(e) => {
                if e.is_timeout() {
                    error!(image = %image, "push timed out");
                } else {
                    error!(image = %image, error = %e, "push rejected");
                }
                Err(self.fail(JockerError::engine(Phase::Push, e)))
            }
        }
    }

    /// 1回分の実行
    ///
    /// エンジンへの接続はビルドが必要になった時点で `connect` を呼んで行う。
    pub async fn execute<E, F>(&mut self, connect: F) -> Result<Outcome>
    where
        E: Engine,
        F: FnOnce(&ClientConfig) -> std::result::Result<E, EngineError>,
    {
        let artifact = self.generate()?;

        if self.request.dry_run {
            self.transition(RunState::Done);
            return Ok(Outcome::DryRun(artifact));
        }

        if !self.request.wants_build() {
            self.transition(RunState::Done);
            info!("Done");
            return Ok(Outcome::Generated(artifact));
        }

        let engine = match connect(&self.config.client) {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "Could not connect to Docker");
                return Err(self.fail(JockerError::engine(Phase::Build, e)));
            }
        };

        let built = self.build(&engine).await;

        if self.request.push.is_none() {
            let image = built?;
            self.transition(RunState::Done);
            info!("Done");
            return Ok(Outcome::Built { image });
        }

        let image = self.push(&engine).await?;
        self.transition(RunState::Done);
        info!("Done");
        Ok(Outcome::Pushed { image })
    }
}

async fn run_push(engine: &dyn Engine, target: &ImageTarget) -> std::result::Result<(), EngineError> {
    let raw = engine
        .push(&target.repository, target.tag.as_deref())
        .await?;
    log_status(Phase::Push, &raw)
}

/// エンジンのステータス出力をログに流す
///
/// エラーを含む行があれば API による拒否として返す。
fn log_status(phase: Phase, raw: &str) -> std::result::Result<(), EngineError> {
    for line in decode_status(raw) {
        if let Some(message) = line.error_message() {
            return Err(EngineError::Rejected(message.trim_end().to_string()));
        }

        let text = match phase {
            Phase::Build => line.stream.as_deref().or(line.status.as_deref()),
            Phase::Push => line.status.as_deref(),
        };

        if let Some(text) = text {
            let text = text.trim_end();
            if text.is_empty() {
                continue;
            }
            match line.progress.as_deref() {
                Some(progress) => debug!(phase = %phase, "{} {}", text, progress),
                None => debug!(phase = %phase, "{}", text),
            }
        }
    }
    Ok(())
}

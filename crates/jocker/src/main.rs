use clap::Parser;
use colored::Colorize;
use jocker::{BuildRequest, DockerEngine, ImageTarget, Jocker, Outcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jocker")]
#[command(version, about = "Dockerfile テンプレートを展開し、イメージをビルド/プッシュする", long_about = None)]
struct Cli {
    /// テンプレートに渡す変数ファイル (YAML/JSON)
    #[arg(short = 'f', long = "varsfile", default_value = jocker_core::request::DEFAULT_VARS_FILE)]
    varsfile: PathBuf,

    /// Dockerfile テンプレート
    #[arg(short = 't', long = "templatefile", default_value = jocker_core::request::DEFAULT_TEMPLATE_FILE)]
    templatefile: PathBuf,

    /// 展開した Dockerfile の出力先
    #[arg(short = 'o', long = "outputfile", default_value = jocker_core::request::DEFAULT_OUTPUT_FILE)]
    outputfile: PathBuf,

    /// エンジン設定ファイル (client/build)
    #[arg(short = 'c', long = "dockerconfig", env = "JOCKER_DOCKER_CONFIG")]
    dockerconfig: Option<PathBuf>,

    /// イメージをビルドする (repository[:tag])
    #[arg(short = 'b', long = "build", value_parser = parse_target)]
    build: Option<ImageTarget>,

    /// イメージをプッシュする (repository[:tag])
    #[arg(short = 'p', long = "push", value_parser = parse_target)]
    push: Option<ImageTarget>,

    /// Dockerfile を書き出さずに展開結果だけ表示する
    #[arg(short = 'd', long = "dryrun")]
    dryrun: bool,

    /// 詳細ログを出力し、エラーをそのまま返す
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Cli {
    fn request(&self) -> BuildRequest {
        BuildRequest::new(&self.templatefile, &self.varsfile, &self.outputfile)
            .with_dry_run(self.dryrun)
            .with_build(self.build.clone())
            .with_push(self.push.clone())
            .with_verbose(self.verbose)
    }
}

fn parse_target(value: &str) -> Result<ImageTarget, String> {
    let target = ImageTarget::parse(value);
    if target.repository.is_empty() {
        return Err(format!("repository name is missing: '{}'", value));
    }
    Ok(target)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,jocker={level},jocker_core={level},jocker_build={level},jocker_config={level}"
        ))
    });

    // stdout は dry-run の出力に使う
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let request = cli.request();
    let verbose = request.verbose;
    init_logging(verbose);

    let result = match Jocker::configure(request, cli.dockerconfig.as_deref()) {
        Ok(mut jocker) => jocker.execute(DockerEngine::connect).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Outcome::DryRun(artifact)) => {
            print!("{}", artifact.content);
            if !artifact.content.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) if verbose => Err(e.into()),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e.user_message());
            std::process::exit(e.exit_code());
        }
    }
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use java_introspect::cli::{self, Command, GlobalOptions};

/// Java project introspection
///
/// 解析 Maven / Gradle 项目的 classpath、sourcepath 和测试方法
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 输出 JSON 格式 (默认输出人类可读格式)
    #[arg(long, global = true)]
    json: bool,

    /// Local Maven repository (default: settings.xml, then ~/.m2/repository)
    #[arg(long, global = true)]
    maven_repo: Option<String>,

    /// Gradle user home (default: $GRADLE_USER_HOME, then ~/.gradle)
    #[arg(long, global = true)]
    gradle_home: Option<String>,

    /// Only use directory conventions for Gradle projects
    #[arg(long, global = true)]
    no_introspection: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志 (stderr; RUST_LOG overrides --log-level)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {e}"))?;

    let options = GlobalOptions {
        json: args.json,
        maven_repo: args.maven_repo.map(Into::into),
        gradle_home: args.gradle_home.map(Into::into),
        no_introspection: args.no_introspection,
    };
    cli::handle_command(args.command, &options)
}

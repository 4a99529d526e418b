// apps/sg_cli/src/main.rs

//! SurfGrad 命令行界面
//!
//! 读取表面和多帧顶点场，计算切平面梯度模并写出 `F + 1` 帧结果。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// SurfGrad 表面梯度命令行工具
#[derive(Parser)]
#[command(name = "sg_cli")]
#[command(author = "SurfGrad Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tangent-plane gradient magnitude of scalar fields on triangulated surfaces", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 计算梯度
    Gradient(commands::gradient::GradientArgs),
    /// 显示表面信息
    Info(commands::info::InfoArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Gradient(args) => commands::gradient::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}

// apps/sg_cli/src/commands/validate.rs

//! 配置验证命令

use anyhow::{bail, Context, Result};
use clap::Args;
use sg_config::GradientConfig;
use std::path::PathBuf;
use tracing::{error, info};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    pub config: PathBuf,

    /// 输出补全默认值后的配置
    #[arg(long)]
    pub show: bool,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== SurfGrad 配置验证 ===");
    println!("检查配置文件: {}", args.config.display());

    if !args.config.exists() {
        bail!("配置文件不存在: {}", args.config.display());
    }

    let config = match GradientConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("  ✗ {}", e);
            println!("\n✗ 验证失败");
            return Err(e).context("配置无效");
        }
    };

    println!("  ✓ 配置有效");
    if args.show {
        let json = serde_json::to_string_pretty(&config).context("序列化配置失败")?;
        println!("{json}");
    }
    Ok(())
}

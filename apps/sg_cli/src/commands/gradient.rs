// apps/sg_cli/src/commands/gradient.rs

//! 梯度计算命令
//!
//! 配置优先级：命令行参数 > 配置文件 > 默认值。

use anyhow::{Context, Result};
use clap::Args;
use sg_config::{GradientConfig, GradientNorm};
use sg_gradient::{EstimatorConfig, SurfaceGradient};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// 梯度计算参数
#[derive(Args)]
pub struct GradientArgs {
    /// 表面文件 (.sgb, .obj)
    pub surface: PathBuf,

    /// 输入顶点场 (.sgb, .csv)
    pub field: PathBuf,

    /// 输出顶点场 (.sgb, .csv)
    pub output: PathBuf,

    /// 邻域环数
    #[arg(short = 'n', long = "nbhd-size")]
    pub nbhd_size: Option<usize>,

    /// 诊断顶点
    #[arg(short = 'v', long = "diag-vertex")]
    pub diag_vertex: Option<usize>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 工作线程数 (0 = 全部核心)
    #[arg(long)]
    pub threads: Option<usize>,

    /// 病态条件数阈值
    #[arg(long)]
    pub condition_threshold: Option<f64>,

    /// 帧聚合范数
    #[arg(long)]
    pub norm: Option<GradientNorm>,
}

impl GradientArgs {
    /// 合并配置文件与命令行参数
    fn resolve_config(&self) -> Result<GradientConfig> {
        let mut config = match &self.config {
            Some(path) => GradientConfig::from_file(path)
                .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
            None => GradientConfig::default(),
        };

        if let Some(n) = self.nbhd_size {
            config = config.with_neighborhood_size(n);
        }
        if let Some(v) = self.diag_vertex {
            config = config.with_diag_vertex(Some(v));
        }
        if let Some(t) = self.threads {
            config = config.with_threads(t);
        }
        if let Some(c) = self.condition_threshold {
            config = config.with_condition_threshold(c);
        }
        if let Some(norm) = self.norm {
            config = config.with_norm(norm);
        }

        config.validate().context("参数无效")?;
        Ok(config)
    }
}

/// 执行梯度命令
pub fn execute(args: GradientArgs) -> Result<()> {
    info!("=== SurfGrad 梯度计算 ===");
    let start = Instant::now();

    let config = args.resolve_config()?;
    info!(
        "邻域环数 {}, 范数 {}, 条件数阈值 {}",
        config.neighborhood_size, config.norm, config.condition_threshold
    );

    let mut surface = sg_io::read_surface(&args.surface)
        .with_context(|| format!("无法读取表面 {}", args.surface.display()))?;
    let field = sg_io::read_field(&args.field)
        .with_context(|| format!("无法读取顶点场 {}", args.field.display()))?;

    surface
        .reset_neighborhood_size(config.neighborhood_size)
        .context("邻域展开失败")?;
    let stats = surface.statistics();
    info!(
        "邻居数: 最小 {}, 最大 {}, 平均 {:.1}",
        stats.min_degree, stats.max_degree, stats.mean_degree
    );

    let estimator = SurfaceGradient::new(EstimatorConfig::from_config(&config))?;
    let (output, report) = estimator
        .compute(&surface, &field)
        .context("梯度计算失败")?;

    sg_io::write_field(&args.output, &output)
        .with_context(|| format!("无法写入输出 {}", args.output.display()))?;

    info!(
        "输出 {} ({} 帧), 总耗时 {:.2}s, 置零顶点 {}",
        args.output.display(),
        output.n_frames(),
        start.elapsed().as_secs_f64(),
        report.n_zeroed()
    );
    Ok(())
}

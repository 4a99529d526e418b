// apps/sg_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示表面统计信息和（可选的）顶点场形状。

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 表面文件路径
    pub surface: PathBuf,

    /// 顶点场文件路径
    #[arg(short, long)]
    pub field: Option<PathBuf>,

    /// 显示统计前展开的邻域环数
    #[arg(short = 'n', long = "nbhd-size", default_value = "1")]
    pub nbhd_size: usize,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== SurfGrad 信息 ===");

    let mut surface = sg_io::read_surface(&args.surface)
        .with_context(|| format!("无法读取表面 {}", args.surface.display()))?;
    if args.nbhd_size != 1 {
        surface
            .reset_neighborhood_size(args.nbhd_size)
            .context("邻域展开失败")?;
    }
    let stats = surface.statistics();

    println!("=== 表面 {} ===", args.surface.display());
    println!("顶点数:     {}", stats.n_vertices);
    println!("三角形数:   {}", stats.n_triangles);
    println!("排除顶点:   {}", stats.n_ripped);
    println!("邻域环数:   {}", stats.neighborhood_size);
    println!(
        "邻居数:     最小 {}, 最大 {}, 平均 {:.2}",
        stats.min_degree, stats.max_degree, stats.mean_degree
    );
    println!(
        "包围盒:     ({:.4}, {:.4}, {:.4}) - ({:.4}, {:.4}, {:.4})",
        stats.bbox_min.x, stats.bbox_min.y, stats.bbox_min.z,
        stats.bbox_max.x, stats.bbox_max.y, stats.bbox_max.z
    );

    if let Some(path) = &args.field {
        let field = sg_io::read_field(path)
            .with_context(|| format!("无法读取顶点场 {}", path.display()))?;
        println!("\n=== 顶点场 {} ===", path.display());
        println!("顶点数:     {}", field.n_vertices());
        println!("帧数:       {}", field.n_frames());
        let n_nonfinite = field.values().iter().filter(|x| !x.is_finite()).count();
        println!("非有限值:   {}", n_nonfinite);

        if field.n_vertices() != surface.n_vertices() {
            warn!(
                "顶点场顶点数 {} 与表面 {} 不一致",
                field.n_vertices(),
                surface.n_vertices()
            );
        }
    }

    Ok(())
}

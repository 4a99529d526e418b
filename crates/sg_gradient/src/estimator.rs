// crates/sg_gradient/src/estimator.rs

//! 全表面梯度估计驱动
//!
//! 每个顶点独立：先由几何构造 [`LocalFit`]，再逐帧求导并写入输出。
//! 输出按顶点切分为互不相交的块，并行时每个工作线程只写自己的块，
//! 诊断计数按块折叠后合并。
//!
//! # 输出布局
//!
//! | 帧 | 内容 |
//! |----|------|
//! | 0 | 聚合梯度模 `norm.collapse(Σ_f (dx²+dy²), F)` |
//! | f + 1 | 源帧 `f` 的 `dx² + dy²` |
//!
//! 被排除、无邻居或伪逆失败的顶点，第 `0..=F` 帧全部为 0。

use std::time::Instant;

use rayon::prelude::*;
use sg_config::{GradientConfig, GradientNorm};
use sg_foundation::float::CONDITION_NUMBER_WARNING;
use sg_mesh::TangentFrameAccess;
use tracing::{debug, info, trace, warn};

use crate::error::{GradientError, GradientResult};
use crate::field::VertexField;
use crate::local_fit::{FitFailure, LocalFit};
use crate::report::{GradientReport, VertexOutcome};

// ============================================================
// 配置
// ============================================================

/// 估计器配置
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// 病态判定的条件数阈值
    pub condition_threshold: f64,
    /// 帧聚合范数
    pub norm: GradientNorm,
    /// 是否并行
    pub parallel: bool,
    /// 并行阈值（顶点数）
    pub parallel_threshold: usize,
    /// 工作线程数，0 表示使用全局线程池
    pub threads: usize,
    /// 诊断顶点
    pub diag_vertex: Option<usize>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            condition_threshold: CONDITION_NUMBER_WARNING,
            norm: GradientNorm::default(),
            parallel: true,
            parallel_threshold: 1000,
            threads: 0,
            diag_vertex: None,
        }
    }
}

impl EstimatorConfig {
    /// 从运行配置提取
    pub fn from_config(config: &GradientConfig) -> Self {
        Self {
            condition_threshold: config.condition_threshold,
            norm: config.norm,
            parallel: config.parallel,
            parallel_threshold: config.parallel_threshold,
            threads: config.threads,
            diag_vertex: config.diag_vertex,
        }
    }

    /// 设置条件数阈值
    pub fn with_condition_threshold(mut self, threshold: f64) -> Self {
        self.condition_threshold = threshold;
        self
    }

    /// 设置聚合范数
    pub fn with_norm(mut self, norm: GradientNorm) -> Self {
        self.norm = norm;
        self
    }

    /// 启用/禁用并行
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// 设置并行阈值
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// 设置线程数
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// 设置诊断顶点
    pub fn with_diag_vertex(mut self, vertex: Option<usize>) -> Self {
        self.diag_vertex = vertex;
        self
    }
}

// ============================================================
// 估计器
// ============================================================

/// 表面梯度估计器
#[derive(Debug, Clone)]
pub struct SurfaceGradient {
    config: EstimatorConfig,
}

impl SurfaceGradient {
    /// 创建估计器
    pub fn new(config: EstimatorConfig) -> GradientResult<Self> {
        let t = config.condition_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(GradientError::InvalidThreshold(t));
        }
        Ok(Self { config })
    }

    /// 当前配置
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// 计算梯度，分配新的 `F + 1` 帧输出
    pub fn compute<S>(&self, surface: &S, field: &VertexField) -> GradientResult<(VertexField, GradientReport)>
    where
        S: TangentFrameAccess + Sync + ?Sized,
    {
        let mut output = VertexField::new(field.n_vertices(), field.n_frames() + 1)?;
        let report = self.compute_into(surface, field, &mut output)?;
        Ok((output, report))
    }

    /// 计算梯度，写入调用方提供的输出
    ///
    /// 输出至少要有 `F + 1` 帧；多出的帧保持不变。
    /// 所有前置条件在写入任何顶点之前检查。
    pub fn compute_into<S>(
        &self,
        surface: &S,
        field: &VertexField,
        output: &mut VertexField,
    ) -> GradientResult<GradientReport>
    where
        S: TangentFrameAccess + Sync + ?Sized,
    {
        let n = surface.n_vertices();
        let n_frames = field.n_frames();

        if field.n_vertices() != n {
            return Err(GradientError::FieldSizeMismatch {
                expected: n,
                actual: field.n_vertices(),
            });
        }
        if output.n_vertices() != n {
            return Err(GradientError::OutputSizeMismatch {
                expected: n,
                actual: output.n_vertices(),
            });
        }
        if output.n_frames() < n_frames + 1 {
            return Err(GradientError::OutputTooSmall {
                required: n_frames + 1,
                actual: output.n_frames(),
            });
        }
        if let Some(d) = self.config.diag_vertex {
            if d >= n {
                warn!("诊断顶点 {} 超出范围 0..{}，忽略", d, n);
            }
        }

        let start = Instant::now();
        let mut report = if self.config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()?;
            pool.install(|| self.run(surface, field, output))
        } else {
            self.run(surface, field, output)
        };

        report.n_vertices = n;
        report.n_frames = n_frames;
        report.elapsed = start.elapsed();
        report.log_summary();
        Ok(report)
    }

    /// 按顶点分块执行（串行或并行）
    fn run<S>(&self, surface: &S, field: &VertexField, output: &mut VertexField) -> GradientReport
    where
        S: TangentFrameAccess + Sync + ?Sized,
    {
        let n = surface.n_vertices();
        let stride = output.n_frames();
        let slots = output.values_mut();

        if self.config.parallel && n >= self.config.parallel_threshold {
            debug!("并行梯度计算: {} 顶点, {} 线程", n, rayon::current_num_threads());
            slots
                .par_chunks_mut(stride)
                .enumerate()
                .fold(GradientReport::default, |mut report, (v, slot)| {
                    report.record(self.estimate_vertex(surface, field, v, slot));
                    report
                })
                .reduce(GradientReport::default, GradientReport::merge)
        } else {
            debug!("串行梯度计算: {} 顶点", n);
            slots
                .chunks_mut(stride)
                .enumerate()
                .fold(GradientReport::default(), |mut report, (v, slot)| {
                    report.record(self.estimate_vertex(surface, field, v, slot));
                    report
                })
        }
    }

    /// 单顶点估计，`slot` 为该顶点的全部输出帧
    fn estimate_vertex<S>(&self, surface: &S, field: &VertexField, v: usize, slot: &mut [f32]) -> VertexOutcome
    where
        S: TangentFrameAccess + ?Sized,
    {
        let n_frames = field.n_frames();
        slot[..=n_frames].fill(0.0);
        let diag = self.config.diag_vertex == Some(v);

        if surface.is_ripped(v) {
            if diag {
                info!("诊断顶点 {}: 已排除，输出 0", v);
            }
            return VertexOutcome::Ripped;
        }

        let fit = match LocalFit::build(surface, v, self.config.condition_threshold) {
            Ok(fit) => fit,
            Err(FitFailure::NoNeighbors) => {
                if diag {
                    info!("诊断顶点 {}: 没有邻居，输出 0", v);
                }
                return VertexOutcome::Degenerate;
            }
            Err(FitFailure::PseudoInverse) => {
                trace!("顶点 {}: 伪逆失败，跳过", v);
                if diag {
                    info!("诊断顶点 {}: 伪逆失败，输出 0", v);
                }
                return VertexOutcome::SolveFailed;
            }
        };

        if fit.is_ill_conditioned() {
            trace!("顶点 {}: 条件数 {:.3e} 超过阈值", v, fit.condition_number());
        }
        if diag {
            self.log_geometry(surface, &fit);
        }

        let mut scratch = fit.scratch();
        let mut sum_sq = 0.0;
        let mut corrected = 0;
        for f in 0..n_frames {
            let d = fit.derivative(field, f, &mut scratch);
            let mag_sq = d.magnitude_sq();
            // 超出 f32 范围的模长按非有限处理，两个分量都计为置零
            let stored = mag_sq as f32;
            if stored.is_finite() {
                slot[f + 1] = stored;
                sum_sq += f64::from(stored);
                corrected += d.corrected;
            } else {
                corrected += 2;
            }
            if diag {
                info!(
                    "诊断顶点 {} 帧 {}: dx = {:.6e}, dy = {:.6e}, |∇f|² = {:.6e}",
                    v, f, d.dx, d.dy, mag_sq
                );
            }
        }

        let aggregate = self.config.norm.collapse(sum_sq, n_frames);
        slot[0] = aggregate as f32;
        if diag {
            info!(
                "诊断顶点 {}: {} 聚合 = {:.6e}",
                v,
                self.config.norm,
                aggregate
            );
        }

        VertexOutcome::Solved {
            condition_number: fit.condition_number(),
            ill_conditioned: fit.is_ill_conditioned(),
            corrected,
        }
    }

    fn log_geometry<S>(&self, surface: &S, fit: &LocalFit<'_>)
    where
        S: TangentFrameAccess + ?Sized,
    {
        let v = fit.center();
        let (e1, e2) = surface.tangent_basis(v);
        info!(
            "诊断顶点 {}: 位置 {:?}, e1 {:?}, e2 {:?}, {} 个邻居",
            v,
            surface.position(v),
            e1,
            e2,
            fit.neighbors().len()
        );
        for &n in fit.neighbors() {
            let (x, y) = surface.tangent_offset(v, n);
            info!("  邻居 {}: 切平面坐标 ({:.6}, {:.6})", n, x, y);
        }
        info!(
            "诊断顶点 {}: 条件数 {:.6e}{}",
            v,
            fit.condition_number(),
            if fit.is_ill_conditioned() { " (病态)" } else { "" }
        );
    }
}

/// 便捷函数：用默认配置和给定范数计算梯度
///
/// `output` 为 `Some` 时复用该缓冲区，否则分配新的 `F + 1` 帧输出。
pub fn compute_gradient<S>(
    surface: &S,
    field: &VertexField,
    norm: GradientNorm,
    output: Option<VertexField>,
) -> GradientResult<VertexField>
where
    S: TangentFrameAccess + Sync + ?Sized,
{
    let estimator = SurfaceGradient::new(EstimatorConfig::default().with_norm(norm))?;
    match output {
        Some(mut out) => {
            estimator.compute_into(surface, field, &mut out)?;
            Ok(out)
        }
        None => estimator.compute(surface, field).map(|(out, _)| out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use sg_mesh::{Surface, SurfaceVertex};

    /// 中心顶点 0 + 4 个十字邻居，邻居之间不相连
    fn cross() -> Surface {
        let mut vertices = vec![SurfaceVertex::new(DVec3::ZERO).with_neighbors(vec![1, 2, 3, 4])];
        for (x, y) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)] {
            vertices.push(SurfaceVertex::new(DVec3::new(x, y, 0.0)));
        }
        Surface::from_vertices(vertices).unwrap()
    }

    #[test]
    fn test_precondition_errors() {
        let s = cross();
        let est = SurfaceGradient::new(EstimatorConfig::default()).unwrap();

        let wrong = VertexField::new(4, 1).unwrap();
        assert!(matches!(
            est.compute(&s, &wrong),
            Err(GradientError::FieldSizeMismatch { expected: 5, actual: 4 })
        ));

        let field = VertexField::new(5, 2).unwrap();
        let mut small = VertexField::new(5, 2).unwrap();
        small.fill(7.0);
        assert!(matches!(
            est.compute_into(&s, &field, &mut small),
            Err(GradientError::OutputTooSmall { required: 3, actual: 2 })
        ));
        // 失败时不写输出
        assert!(small.values().iter().all(|&x| x == 7.0));

        let mut wrong_out = VertexField::new(6, 3).unwrap();
        assert!(matches!(
            est.compute_into(&s, &field, &mut wrong_out),
            Err(GradientError::OutputSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cfg = EstimatorConfig::default().with_condition_threshold(t);
            assert!(matches!(SurfaceGradient::new(cfg), Err(GradientError::InvalidThreshold(_))));
        }
    }

    #[test]
    fn test_leaf_vertices_degenerate() {
        // 邻居 1..4 自身没有邻居列表
        let s = cross();
        let field = VertexField::from_vertex_major(5, 1, vec![0.0, 1.0, 0.0, -1.0, 0.0]).unwrap();
        let est = SurfaceGradient::new(EstimatorConfig::default()).unwrap();
        let (out, report) = est.compute(&s, &field).unwrap();
        assert_eq!(report.solved, 1);
        assert_eq!(report.degenerate, 4);
        assert!((out.get(0, 1) - 1.0).abs() < 1e-6);
        assert!((out.get(0, 0) - 1.0).abs() < 1e-6);
        for v in 1..5 {
            assert_eq!(out.vertex_values(v), &[0.0, 0.0]);
        }
    }

    #[test]
    fn test_extra_output_frames_untouched() {
        let s = cross();
        let field = VertexField::new(5, 1).unwrap();
        let mut out = VertexField::new(5, 4).unwrap();
        out.fill(9.0);
        let est = SurfaceGradient::new(EstimatorConfig::default()).unwrap();
        est.compute_into(&s, &field, &mut out).unwrap();
        for v in 0..5 {
            assert_eq!(out.vertex_values(v), &[0.0, 0.0, 9.0, 9.0]);
        }
    }

    #[test]
    fn test_diag_vertex_out_of_range_is_not_an_error() {
        let s = cross();
        let field = VertexField::new(5, 1).unwrap();
        let cfg = EstimatorConfig::default().with_diag_vertex(Some(100));
        let est = SurfaceGradient::new(cfg).unwrap();
        assert!(est.compute(&s, &field).is_ok());

        let cfg = EstimatorConfig::default().with_diag_vertex(Some(0));
        let est = SurfaceGradient::new(cfg).unwrap();
        assert!(est.compute(&s, &field).is_ok());
    }

    #[test]
    fn test_from_config() {
        let config = GradientConfig::default()
            .with_condition_threshold(50.0)
            .with_threads(2)
            .with_parallel(false)
            .with_diag_vertex(Some(3));
        let cfg = EstimatorConfig::from_config(&config);
        assert_eq!(cfg.condition_threshold, 50.0);
        assert_eq!(cfg.threads, 2);
        assert!(!cfg.parallel);
        assert_eq!(cfg.diag_vertex, Some(3));
    }
}

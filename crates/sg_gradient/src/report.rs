// crates/sg_gradient/src/report.rs

//! 梯度计算统计
//!
//! 单顶点的失败都是局部的：该顶点输出为 0，计数记入报告，整体计算继续。

use std::time::Duration;

use tracing::{info, warn};

/// 单个顶点的计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexOutcome {
    /// 顶点被排除
    Ripped,
    /// 没有邻居
    Degenerate,
    /// 伪逆失败
    SolveFailed,
    /// 求解成功
    Solved {
        /// XᵗX 的条件数
        condition_number: f64,
        /// 条件数是否超过阈值
        ill_conditioned: bool,
        /// 被置零的非有限分量个数（所有帧合计）
        corrected: usize,
    },
}

/// 一次梯度计算的汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientReport {
    /// 顶点数
    pub n_vertices: usize,
    /// 输入帧数
    pub n_frames: usize,
    /// 成功求解的顶点数
    pub solved: usize,
    /// 跳过的被排除顶点
    pub skipped_ripped: usize,
    /// 没有邻居的顶点
    pub degenerate: usize,
    /// 伪逆失败的顶点
    pub solve_failed: usize,
    /// 病态顶点（仍然计算）
    pub ill_conditioned: usize,
    /// 被置零的非有限导数分量
    pub nonfinite_corrected: usize,
    /// 成功顶点中的最大有限条件数
    pub max_condition: f64,
    /// 耗时
    pub elapsed: Duration,
}

impl GradientReport {
    /// 记录单个顶点
    pub fn record(&mut self, outcome: VertexOutcome) {
        match outcome {
            VertexOutcome::Ripped => self.skipped_ripped += 1,
            VertexOutcome::Degenerate => self.degenerate += 1,
            VertexOutcome::SolveFailed => self.solve_failed += 1,
            VertexOutcome::Solved {
                condition_number,
                ill_conditioned,
                corrected,
            } => {
                self.solved += 1;
                if ill_conditioned {
                    self.ill_conditioned += 1;
                }
                self.nonfinite_corrected += corrected;
                if condition_number.is_finite() {
                    self.max_condition = self.max_condition.max(condition_number);
                }
            }
        }
    }

    /// 合并另一份（并行分块的）报告
    pub fn merge(mut self, other: Self) -> Self {
        self.solved += other.solved;
        self.skipped_ripped += other.skipped_ripped;
        self.degenerate += other.degenerate;
        self.solve_failed += other.solve_failed;
        self.ill_conditioned += other.ill_conditioned;
        self.nonfinite_corrected += other.nonfinite_corrected;
        self.max_condition = self.max_condition.max(other.max_condition);
        self
    }

    /// 输出为 0 的顶点总数
    pub fn n_zeroed(&self) -> usize {
        self.skipped_ripped + self.degenerate + self.solve_failed
    }

    /// 输出汇总日志
    pub fn log_summary(&self) {
        info!(
            "梯度计算完成: {} 顶点 × {} 帧, 成功 {}, 排除 {}, 无邻居 {}, 求解失败 {}, 耗时 {:.3}s",
            self.n_vertices,
            self.n_frames,
            self.solved,
            self.skipped_ripped,
            self.degenerate,
            self.solve_failed,
            self.elapsed.as_secs_f64()
        );
        if self.ill_conditioned > 0 {
            warn!(
                "{} 个顶点条件数过大 (最大有限值 {:.3e})，结果可能不可靠",
                self.ill_conditioned, self.max_condition
            );
        }
        if self.nonfinite_corrected > 0 {
            warn!("{} 个非有限导数分量已置零", self.nonfinite_corrected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = GradientReport::default();
        a.record(VertexOutcome::Ripped);
        a.record(VertexOutcome::Solved {
            condition_number: 5.0,
            ill_conditioned: false,
            corrected: 0,
        });

        let mut b = GradientReport::default();
        b.record(VertexOutcome::Degenerate);
        b.record(VertexOutcome::SolveFailed);
        b.record(VertexOutcome::Solved {
            condition_number: f64::INFINITY,
            ill_conditioned: true,
            corrected: 2,
        });

        let r = a.merge(b);
        assert_eq!(r.solved, 2);
        assert_eq!(r.skipped_ripped, 1);
        assert_eq!(r.degenerate, 1);
        assert_eq!(r.solve_failed, 1);
        assert_eq!(r.ill_conditioned, 1);
        assert_eq!(r.nonfinite_corrected, 2);
        assert_eq!(r.max_condition, 5.0);
        assert_eq!(r.n_zeroed(), 3);
    }
}

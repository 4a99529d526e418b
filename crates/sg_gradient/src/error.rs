// crates/sg_gradient/src/error.rs

//! 梯度估计前置条件错误
//!
//! 单顶点的数值失败（无邻居、伪逆失败、非有限导数）在本地吸收，不会出现在这里；
//! 这里只有在任何顶点开始计算之前就能检查出的调用方错误。

use sg_foundation::SgError;
use thiserror::Error;

/// 梯度模块结果类型
pub type GradientResult<T> = Result<T, GradientError>;

/// 梯度错误枚举
#[derive(Error, Debug)]
pub enum GradientError {
    /// 输入场与表面顶点数不一致
    #[error("输入场顶点数不匹配: 表面 {expected}, 场 {actual}")]
    FieldSizeMismatch { expected: usize, actual: usize },

    /// 输出缓冲区顶点数不一致
    #[error("输出场顶点数不匹配: 表面 {expected}, 输出 {actual}")]
    OutputSizeMismatch { expected: usize, actual: usize },

    /// 输出缓冲区帧数不足
    #[error("输出场帧数不足: 至少需要 {required}, 实际 {actual}")]
    OutputTooSmall { required: usize, actual: usize },

    /// 条件数阈值无效
    #[error("条件数阈值无效: {0}")]
    InvalidThreshold(f64),

    /// 线程池创建失败
    #[error("线程池创建失败: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// 基础层错误
    #[error("基础层错误: {0}")]
    Foundation(#[from] SgError),
}

impl From<GradientError> for SgError {
    fn from(err: GradientError) -> Self {
        match err {
            GradientError::FieldSizeMismatch { expected, actual } => {
                SgError::size_mismatch("input_field", expected, actual)
            }
            GradientError::OutputSizeMismatch { expected, actual } => {
                SgError::size_mismatch("output_field", expected, actual)
            }
            GradientError::OutputTooSmall { required, actual } => {
                SgError::size_mismatch("output_frames", required, actual)
            }
            GradientError::InvalidThreshold(t) => {
                SgError::invalid_config("condition_threshold", t.to_string(), "必须为正的有限值")
            }
            GradientError::Foundation(e) => e,
            other => SgError::internal(other.to_string()),
        }
    }
}

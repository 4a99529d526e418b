// crates/sg_mesh/src/error.rs

//! 网格处理错误类型
//!
//! 所有错误可转换为 `sg_foundation::SgError` 向上传播。

use sg_foundation::SgError;
use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 空表面
    #[error("表面没有顶点")]
    Empty,

    /// 三角形无效
    #[error("三角形 {triangle} 无效: {reason}")]
    InvalidTriangle {
        triangle: usize,
        reason: String,
    },

    /// 邻居索引越界
    #[error("顶点 {vertex} 的邻居 {neighbor} 超出范围 0..{len}")]
    NeighborOutOfRange {
        vertex: usize,
        neighbor: usize,
        len: usize,
    },

    /// 顶点把自身列为邻居
    #[error("顶点 {vertex} 把自身列为邻居")]
    SelfNeighbor { vertex: usize },

    /// 顶点索引越界
    #[error("顶点索引 {index} 超出范围 0..{len}")]
    VertexOutOfRange { index: usize, len: usize },

    /// 邻域环数无效
    #[error("邻域环数无效: {size}")]
    InvalidNeighborhoodSize { size: usize },
}

impl From<MeshError> for SgError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::VertexOutOfRange { index, len } => {
                SgError::index_out_of_bounds("vertex", index, len)
            }
            MeshError::NeighborOutOfRange { neighbor, len, .. } => {
                SgError::index_out_of_bounds("neighbor", neighbor, len)
            }
            MeshError::InvalidNeighborhoodSize { size } => {
                SgError::invalid_config("neighborhood_size", size.to_string(), "必须为正")
            }
            other => SgError::invalid_mesh(other.to_string()),
        }
    }
}

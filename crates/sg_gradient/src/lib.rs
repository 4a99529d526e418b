// crates/sg_gradient/src/lib.rs

//! SurfGrad 表面梯度估计
//!
//! 在每个顶点的切平面内对邻居样本做一阶 Taylor 最小二乘拟合，得到每帧的
//! 面内偏导 `(∂f/∂x, ∂f/∂y)`，再把逐帧导数折叠成单个梯度模标量场。
//!
//! # 模块
//!
//! - [`field`]: 按顶点排列的多帧标量场 `VertexField`
//! - [`local_fit`]: 单顶点两阶段拟合（几何预计算 → 逐帧求解）
//! - [`estimator`]: 全表面并行驱动 `SurfaceGradient`
//! - [`report`]: 运行诊断统计
//! - [`error`]: 前置条件错误
//!
//! # 输出布局
//!
//! 输入 `F` 帧时输出 `F + 1` 帧：第 0 帧为聚合梯度模，第 `f + 1` 帧为
//! 源帧 `f` 的 `dx² + dy²`。
//!
//! # 示例
//!
//! ```rust
//! use glam::DVec3;
//! use sg_config::GradientNorm;
//! use sg_gradient::{compute_gradient, VertexField};
//! use sg_mesh::{Surface, SurfaceVertex};
//!
//! // 中心顶点 + 4 个邻居，标量场 f = 2x
//! let offsets = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
//! let mut vertices = vec![SurfaceVertex::new(DVec3::ZERO).with_neighbors(vec![1, 2, 3, 4])];
//! let mut values = vec![0.0_f32];
//! for (x, y) in offsets {
//!     vertices.push(SurfaceVertex::new(DVec3::new(x, y, 0.0)));
//!     values.push(2.0 * x as f32);
//! }
//! let surface = Surface::from_vertices(vertices).unwrap();
//! let field = VertexField::from_vertex_major(5, 1, values).unwrap();
//!
//! let grad = compute_gradient(&surface, &field, GradientNorm::Rms, None).unwrap();
//! assert_eq!(grad.n_frames(), 2);
//! assert!((grad.get(0, 1) - 4.0).abs() < 1e-5);
//! assert!((grad.get(0, 0) - 2.0).abs() < 1e-5);
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod estimator;
pub mod field;
pub mod local_fit;
pub mod report;

pub use error::{GradientError, GradientResult};
pub use estimator::{compute_gradient, EstimatorConfig, SurfaceGradient};
pub use field::VertexField;
pub use local_fit::{FitFailure, LocalFit, TangentDerivative};
pub use report::{GradientReport, VertexOutcome};

// crates/sg_mesh/src/lib.rs

//! SurfGrad 表面网格模块
//!
//! 提供三角表面的顶点数据、环邻域和切平面标架，供梯度估计器只读使用。
//!
//! # 核心类型
//!
//! - [`Surface`]: 顶点 + 三角形 + 1-环邻接
//! - [`SurfaceVertex`]: 位置、法向、切平面基 `e1`/`e2`、主曲率、环邻居
//!
//! # 模块结构
//!
//! - [`surface`]: 表面构建与访问
//! - [`neighborhood`]: 按边跳数展开邻域
//! - [`frame`]: 顶点法向与第二基本形式（主方向）
//! - [`traits`]: 估计器使用的只读访问接口
//! - [`error`]: 网格错误类型
//!
//! # 示例
//!
//! ```rust
//! use glam::DVec3;
//! use sg_mesh::Surface;
//!
//! let positions = vec![
//!     DVec3::new(0.0, 0.0, 0.0),
//!     DVec3::new(1.0, 0.0, 0.0),
//!     DVec3::new(0.0, 1.0, 0.0),
//!     DVec3::new(1.0, 1.0, 0.0),
//! ];
//! let triangles = vec![[0, 1, 2], [1, 3, 2]];
//! let mut surface = Surface::from_triangles(positions, triangles).unwrap();
//! surface.reset_neighborhood_size(2).unwrap();
//! assert_eq!(surface.vertex(0).degree(), 3);
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod frame;
pub mod neighborhood;
pub mod surface;
pub mod traits;

pub use error::{MeshError, MeshResult};
pub use surface::{Surface, SurfaceStatistics, SurfaceVertex};
pub use traits::TangentFrameAccess;

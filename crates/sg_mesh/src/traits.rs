// crates/sg_mesh/src/traits.rs

//! 切平面标架只读访问接口
//!
//! 梯度估计器只依赖此 trait，不依赖具体的表面存储。

use glam::DVec3;

use crate::surface::Surface;

/// 切平面标架提供者
///
/// 为每个顶点提供位置、切平面正交基和当前邻域内的邻居。
pub trait TangentFrameAccess {
    /// 顶点数
    fn n_vertices(&self) -> usize;

    /// 顶点位置
    fn position(&self, v: usize) -> DVec3;

    /// 切平面正交基 `(e1, e2)`
    fn tangent_basis(&self, v: usize) -> (DVec3, DVec3);

    /// 当前邻域内的邻居
    fn neighbors(&self, v: usize) -> &[usize];

    /// 是否被排除
    fn is_ripped(&self, v: usize) -> bool;

    /// 邻居 `n` 相对顶点 `v` 的切平面坐标
    #[inline]
    fn tangent_offset(&self, v: usize, n: usize) -> (f64, f64) {
        let (e1, e2) = self.tangent_basis(v);
        let d = self.position(n) - self.position(v);
        (e1.dot(d), e2.dot(d))
    }
}

impl TangentFrameAccess for Surface {
    #[inline]
    fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn position(&self, v: usize) -> DVec3 {
        self.vertices[v].position
    }

    #[inline]
    fn tangent_basis(&self, v: usize) -> (DVec3, DVec3) {
        let vertex = &self.vertices[v];
        (vertex.e1, vertex.e2)
    }

    #[inline]
    fn neighbors(&self, v: usize) -> &[usize] {
        &self.vertices[v].neighbors
    }

    #[inline]
    fn is_ripped(&self, v: usize) -> bool {
        self.vertices[v].ripped
    }
}

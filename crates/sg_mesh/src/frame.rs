// crates/sg_mesh/src/frame.rs

//! 顶点切平面标架与第二基本形式
//!
//! 1. 面积加权法向：累加相邻三角形的叉积
//! 2. 任取一对与法向正交的单位向量作为初始切平面基
//! 3. 在 1-环上最小二乘拟合二次曲面 `h = a·u² + 2b·uv + c·v²`，
//!    其中 `h = -n·Δ`（凸面曲率为正）
//! 4. 形状算子 `[[2a, 2b], [2b, 2c]]` 的特征值为主曲率，特征向量旋转出主方向
//!
//! 拟合失败（邻居少于 3 个或矩阵奇异）时保留初始基，曲率记为 0。
//! 切平面内的旋转不改变 `dx² + dy²`，因此主方向的选择不影响梯度模。

use glam::DVec3;
use nalgebra::{DMatrix, DVector, Matrix2};
use rayon::prelude::*;

use crate::surface::Surface;

/// 二次曲面拟合所需的最少邻居数
const MIN_QUADRIC_NEIGHBORS: usize = 3;

/// SVD 求解时视为零的奇异值容差
const QUADRIC_SVD_EPS: f64 = 1e-12;

/// 单个顶点的标架计算结果
#[derive(Debug, Clone, Copy)]
struct VertexFrame {
    normal: DVec3,
    e1: DVec3,
    e2: DVec3,
    k1: f64,
    k2: f64,
}

impl Surface {
    /// 重新计算所有顶点的法向、切平面基和主曲率
    ///
    /// 没有相邻三角形的顶点保留当前法向。
    pub fn compute_tangent_frames(&mut self) {
        let normals = self.area_weighted_normals();

        let frames: Vec<VertexFrame> = (0..self.n_vertices())
            .into_par_iter()
            .map(|v| {
                let normal = match normals[v].try_normalize() {
                    Some(n) => n,
                    None => self.vertices[v].normal.try_normalize().unwrap_or(DVec3::Z),
                };
                self.second_fundamental_form(v, normal)
            })
            .collect();

        for (vertex, frame) in self.vertices.iter_mut().zip(frames) {
            vertex.normal = frame.normal;
            vertex.e1 = frame.e1;
            vertex.e2 = frame.e2;
            vertex.k1 = frame.k1;
            vertex.k2 = frame.k2;
        }
    }

    /// 面积加权（未归一化）顶点法向
    fn area_weighted_normals(&self) -> Vec<DVec3> {
        let mut normals = vec![DVec3::ZERO; self.n_vertices()];
        for &[a, b, c] in &self.triangles {
            let pa = self.vertices[a].position;
            let n = (self.vertices[b].position - pa).cross(self.vertices[c].position - pa);
            if !n.is_finite() {
                continue;
            }
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        normals
    }

    /// 在 1-环上拟合二次曲面，得到主方向和主曲率
    fn second_fundamental_form(&self, v: usize, normal: DVec3) -> VertexFrame {
        let e1 = normal.any_orthonormal_vector();
        let e2 = normal.cross(e1);
        let fallback = VertexFrame {
            normal,
            e1,
            e2,
            k1: 0.0,
            k2: 0.0,
        };

        let origin = self.vertices[v].position;
        let ring: Vec<DVec3> = self.adjacency[v]
            .iter()
            .filter(|&&n| !self.vertices[n].ripped)
            .map(|&n| self.vertices[n].position - origin)
            .collect();
        if ring.len() < MIN_QUADRIC_NEIGHBORS {
            return fallback;
        }

        let k = ring.len();
        let mut a = DMatrix::<f64>::zeros(k, 3);
        let mut h = DVector::<f64>::zeros(k);
        for (row, d) in ring.iter().enumerate() {
            let u = e1.dot(*d);
            let w = e2.dot(*d);
            a[(row, 0)] = u * u;
            a[(row, 1)] = 2.0 * u * w;
            a[(row, 2)] = w * w;
            h[row] = -normal.dot(*d);
        }
        if !a.iter().all(|x| x.is_finite()) || !h.iter().all(|x| x.is_finite()) {
            return fallback;
        }

        let coeffs = match a.svd(true, true).solve(&h, QUADRIC_SVD_EPS) {
            Ok(c) => c,
            Err(_) => return fallback,
        };

        let shape = Matrix2::new(
            2.0 * coeffs[0],
            2.0 * coeffs[1],
            2.0 * coeffs[1],
            2.0 * coeffs[2],
        );
        let eigen = shape.symmetric_eigen();
        let (i1, i2) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
            (0, 1)
        } else {
            (1, 0)
        };
        let k1 = eigen.eigenvalues[i1];
        let k2 = eigen.eigenvalues[i2];
        if !k1.is_finite() || !k2.is_finite() {
            return fallback;
        }

        let dir = eigen.eigenvectors.column(i1);
        let principal = (e1 * dir[0] + e2 * dir[1]).normalize_or_zero();
        if principal == DVec3::ZERO {
            return fallback;
        }

        VertexFrame {
            normal,
            e1: principal,
            e2: normal.cross(principal),
            k1,
            k2,
        }
    }
}

// crates/sg_gradient/src/local_fit.rs

//! 单顶点切平面最小二乘拟合
//!
//! 一阶 Taylor 模型 `f_n = f_v + dx·x_n + dy·y_n`，其中 `(x_n, y_n)` 是邻居 `n`
//! 的位移在顶点切平面基上的投影。对 `k` 个邻居求解 2 参数最小二乘：
//!
//! ```text
//! X (k×2) = [x_n  y_n]        Δf (k) = f_n - f_v
//! (XᵗX) p = Xᵗ Δf   →   p = pinv(XᵗX) · Xᵗ · Δf = M · Δf
//! ```
//!
//! 拟合分两阶段：
//! 1. [`LocalFit::build`] 只依赖几何，构造 `M = pinv(XᵗX)·Xᵗ (2×k)`
//! 2. [`LocalFit::derivative`] 每帧只组装 `Δf` 并做一次 `M·Δf`
//!
//! 几何不会在帧之间重复推导，各帧使用完全相同的 `M`。

use nalgebra::{DVector, Matrix2, Matrix2xX, MatrixXx2, Vector2, SVD};
use sg_foundation::float::finite_or_zero;
use sg_mesh::TangentFrameAccess;

use crate::field::VertexField;

/// 伪逆中视为零的奇异值（相对最大奇异值）
const PINV_RELATIVE_EPS: f64 = 2.0 * f64::EPSILON;

/// 单顶点拟合失败原因（局部、非致命）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitFailure {
    /// 没有邻居
    NoNeighbors,
    /// 法方程伪逆失败（SVD 不收敛、矩阵为零或含非有限值）
    PseudoInverse,
}

/// 切平面内的一阶导数估计
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TangentDerivative {
    /// ∂f/∂x（沿 e1）
    pub dx: f64,
    /// ∂f/∂y（沿 e2）
    pub dy: f64,
    /// 被置零的非有限分量个数
    pub corrected: usize,
}

impl TangentDerivative {
    /// 模的平方 `dx² + dy²`
    #[inline]
    pub fn magnitude_sq(&self) -> f64 {
        self.dx * self.dx + self.dy * self.dy
    }
}

/// 单顶点的几何预计算结果
#[derive(Debug, Clone)]
pub struct LocalFit<'a> {
    center: usize,
    neighbors: &'a [usize],
    /// M = pinv(XᵗX)·Xᵗ
    solve_matrix: Matrix2xX<f64>,
    condition_number: f64,
    ill_conditioned: bool,
}

impl<'a> LocalFit<'a> {
    /// 阶段 1：由顶点邻域几何构造求解矩阵
    ///
    /// 条件数超过 `condition_threshold` 时仍继续（伪逆平滑退化），只打标记。
    pub fn build<S>(surface: &'a S, vno: usize, condition_threshold: f64) -> Result<Self, FitFailure>
    where
        S: TangentFrameAccess + ?Sized,
    {
        let neighbors = surface.neighbors(vno);
        let k = neighbors.len();
        if k == 0 {
            return Err(FitFailure::NoNeighbors);
        }

        let mut design = MatrixXx2::<f64>::zeros(k);
        for (row, &n) in neighbors.iter().enumerate() {
            let (x, y) = surface.tangent_offset(vno, n);
            design[(row, 0)] = x;
            design[(row, 1)] = y;
        }

        let xt = design.transpose();
        let xtx: Matrix2<f64> = &xt * &design;
        if !xtx.iter().all(|x| x.is_finite()) {
            return Err(FitFailure::PseudoInverse);
        }

        let svd = SVD::try_new(xtx, true, true, f64::EPSILON, 0).ok_or(FitFailure::PseudoInverse)?;
        let s_max = svd.singular_values.max();
        let s_min = svd.singular_values.min();
        if !(s_max > 0.0) || !s_max.is_finite() {
            return Err(FitFailure::PseudoInverse);
        }
        let condition_number = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };

        let pinv = svd
            .pseudo_inverse(s_max * PINV_RELATIVE_EPS)
            .map_err(|_| FitFailure::PseudoInverse)?;

        Ok(Self {
            center: vno,
            neighbors,
            solve_matrix: pinv * xt,
            condition_number,
            ill_conditioned: condition_number > condition_threshold,
        })
    }

    /// 中心顶点
    #[inline]
    pub fn center(&self) -> usize {
        self.center
    }

    /// 参与拟合的邻居
    #[inline]
    pub fn neighbors(&self) -> &'a [usize] {
        self.neighbors
    }

    /// XᵗX 的条件数（奇异时为无穷大）
    #[inline]
    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    /// 条件数是否超过阈值
    #[inline]
    pub fn is_ill_conditioned(&self) -> bool {
        self.ill_conditioned
    }

    /// 求解矩阵 `M = pinv(XᵗX)·Xᵗ`
    #[inline]
    pub fn solve_matrix(&self) -> &Matrix2xX<f64> {
        &self.solve_matrix
    }

    /// 与邻居数匹配的差值工作向量，跨帧复用
    pub fn scratch(&self) -> DVector<f64> {
        DVector::zeros(self.neighbors.len())
    }

    /// 阶段 2：由邻居差值 `Δf` 求 `(dx, dy)`
    ///
    /// 非有限分量置零。
    pub fn solve(&self, deltas: &DVector<f64>) -> TangentDerivative {
        let p: Vector2<f64> = &self.solve_matrix * deltas;
        let corrected = p.iter().filter(|x| !x.is_finite()).count();
        TangentDerivative {
            dx: finite_or_zero(p[0]),
            dy: finite_or_zero(p[1]),
            corrected,
        }
    }

    /// 阶段 2：对场的第 `frame` 帧求导
    ///
    /// `scratch` 长度必须等于邻居数，见 [`LocalFit::scratch`]。
    pub fn derivative(
        &self,
        field: &VertexField,
        frame: usize,
        scratch: &mut DVector<f64>,
    ) -> TangentDerivative {
        let center = f64::from(field.get(self.center, frame));
        for (row, &n) in self.neighbors.iter().enumerate() {
            scratch[row] = f64::from(field.get(n, frame)) - center;
        }
        self.solve(scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use sg_mesh::{Surface, SurfaceVertex};

    fn patch(offsets: &[(f64, f64)]) -> Surface {
        let n = offsets.len();
        let mut vertices =
            vec![SurfaceVertex::new(DVec3::ZERO).with_neighbors((1..=n).collect())];
        for &(x, y) in offsets {
            vertices.push(SurfaceVertex::new(DVec3::new(x, y, 0.0)));
        }
        Surface::from_vertices(vertices).unwrap()
    }

    #[test]
    fn test_no_neighbors() {
        let s = Surface::from_vertices(vec![SurfaceVertex::new(DVec3::ZERO)]).unwrap();
        assert_eq!(LocalFit::build(&s, 0, 1000.0).unwrap_err(), FitFailure::NoNeighbors);
    }

    #[test]
    fn test_solve_matrix_shape_and_condition() {
        let s = patch(&[(1.0, 0.0), (0.0, 2.0), (-1.0, 0.0)]);
        let fit = LocalFit::build(&s, 0, 1000.0).unwrap();
        assert_eq!(fit.solve_matrix().nrows(), 2);
        assert_eq!(fit.solve_matrix().ncols(), 3);
        // XᵗX = diag(2, 4)
        assert!((fit.condition_number() - 2.0).abs() < 1e-12);
        assert!(!fit.is_ill_conditioned());
    }

    #[test]
    fn test_exact_linear_recovery() {
        let s = patch(&[(1.0, 0.3), (-0.4, 1.0), (-1.0, -0.2), (0.5, -1.1), (0.2, 0.7)]);
        let fit = LocalFit::build(&s, 0, 1000.0).unwrap();
        let mut deltas = fit.scratch();
        for (row, &n) in fit.neighbors().iter().enumerate() {
            let (x, y) = s.tangent_offset(0, n);
            deltas[row] = -1.5 * x + 0.25 * y;
        }
        let d = fit.solve(&deltas);
        assert!((d.dx + 1.5).abs() < 1e-12);
        assert!((d.dy - 0.25).abs() < 1e-12);
        assert_eq!(d.corrected, 0);
    }

    #[test]
    fn test_collinear_neighbors_are_ill_conditioned() {
        // 所有邻居在 x 轴上：XᵗX 秩 1
        let s = patch(&[(1.0, 0.0), (2.0, 0.0), (-1.0, 0.0)]);
        let fit = LocalFit::build(&s, 0, 1000.0).unwrap();
        assert!(fit.is_ill_conditioned());
        assert!(fit.condition_number() > 1e12);

        let mut deltas = fit.scratch();
        for (row, &n) in fit.neighbors().iter().enumerate() {
            deltas[row] = 3.0 * s.tangent_offset(0, n).0;
        }
        // 伪逆给出最小范数解：x 方向可辨识，y 方向为 0
        let d = fit.solve(&deltas);
        assert!((d.dx - 3.0).abs() < 1e-9);
        assert!(d.dy.abs() < 1e-9);
    }

    #[test]
    fn test_coincident_neighbors_fail() {
        let s = patch(&[(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(LocalFit::build(&s, 0, 1000.0).unwrap_err(), FitFailure::PseudoInverse);
    }

    #[test]
    fn test_non_finite_geometry_fails() {
        let s = patch(&[(1.0, 0.0), (f64::INFINITY, 1.0), (0.0, -1.0)]);
        assert_eq!(LocalFit::build(&s, 0, 1000.0).unwrap_err(), FitFailure::PseudoInverse);
    }

    #[test]
    fn test_non_finite_component_zeroed() {
        let s = patch(&[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]);
        let fit = LocalFit::build(&s, 0, 1000.0).unwrap();
        let deltas = DVector::from_vec(vec![f64::NAN, 1.0, 0.0, -1.0]);
        let d = fit.solve(&deltas);
        // 0·NaN 仍为 NaN，两个分量都被置零
        assert_eq!(d.dx, 0.0);
        assert_eq!(d.dy, 0.0);
        assert_eq!(d.corrected, 2);
        assert_eq!(d.magnitude_sq(), 0.0);

        let d = fit.solve(&DVector::from_vec(vec![1.0, f64::INFINITY, -1.0, 0.0]));
        assert_eq!(d.corrected, 2);
        assert_eq!(d.magnitude_sq(), 0.0);
    }

    #[test]
    fn test_derivative_reads_field_frame() {
        let s = patch(&[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]);
        let fit = LocalFit::build(&s, 0, 1000.0).unwrap();
        // 帧 0: f = x；帧 1: f = 10 + 2y
        let field = VertexField::from_frames(&[
            vec![0.0, 1.0, 0.0, -1.0, 0.0],
            vec![10.0, 10.0, 12.0, 10.0, 8.0],
        ])
        .unwrap();
        let mut scratch = fit.scratch();
        let d0 = fit.derivative(&field, 0, &mut scratch);
        let d1 = fit.derivative(&field, 1, &mut scratch);
        assert!((d0.dx - 1.0).abs() < 1e-12 && d0.dy.abs() < 1e-12);
        assert!(d1.dx.abs() < 1e-12 && (d1.dy - 2.0).abs() < 1e-12);
        assert!((d1.magnitude_sq() - 4.0).abs() < 1e-12);
    }
}

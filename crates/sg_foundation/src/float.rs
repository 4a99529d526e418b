// crates/sg_foundation/src/float.rs

//! 浮点数防护工具和数值常量
//!
//! 局部拟合在病态几何下可能产生 NaN 或无穷大，这些函数把非有限值
//! 限制在单个分量内，避免污染整个输出场。

/// 安全除法的最小分母阈值
pub const SAFE_DIV_EPSILON: f64 = 1e-14;

/// 法方程矩阵条件数警告阈值（默认值，可配置）
pub const CONDITION_NUMBER_WARNING: f64 = 1000.0;

/// 非有限值替换为 0
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// 安全除法（直接操作 f64）
#[inline]
pub fn safe_div(a: f64, b: f64, fallback: f64) -> f64 {
    if b.abs() < SAFE_DIV_EPSILON {
        fallback
    } else {
        let r = a / b;
        if r.is_finite() {
            r
        } else {
            fallback
        }
    }
}

/// 安全平方根，负数和 NaN 返回 0
#[inline]
pub fn safe_sqrt(x: f64) -> f64 {
    if x > 0.0 {
        x.sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(1.5), 1.5);
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(1.0, 2.0, -1.0), 0.5);
        assert_eq!(safe_div(1.0, 0.0, -1.0), -1.0);
        assert_eq!(safe_div(f64::MAX, 1e-13, 7.0), 7.0);
    }

    #[test]
    fn test_safe_sqrt() {
        assert_eq!(safe_sqrt(4.0), 2.0);
        assert_eq!(safe_sqrt(-1.0), 0.0);
        assert_eq!(safe_sqrt(f64::NAN), 0.0);
    }
}

// crates/sg_config/src/norm.rs

//! 帧聚合范数
//!
//! 把每帧的切平面梯度模方 `dx² + dy²` 折叠成输出第 0 帧的标量。

use serde::{Deserialize, Serialize};
use sg_foundation::float::{safe_div, safe_sqrt};
use std::str::FromStr;

/// 帧聚合规则
///
/// 目前只有均方根规则（即逐帧导数向量拼接后的 Frobenius 范数除以帧数再开方）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum GradientNorm {
    /// 均方根: `sqrt(Σ_f (dx² + dy²) / F)`
    #[default]
    #[serde(alias = "frobenius")]
    Rms,
}

impl GradientNorm {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rms => "rms",
        }
    }

    /// 由逐帧模方之和与帧数得到聚合标量
    ///
    /// `n_frames == 0` 时返回 0。
    #[inline]
    pub fn collapse(&self, sum_sq: f64, n_frames: usize) -> f64 {
        match self {
            Self::Rms => safe_sqrt(safe_div(sum_sq, n_frames as f64, 0.0)),
        }
    }
}

impl std::fmt::Display for GradientNorm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 范数解析错误
#[derive(Debug, Clone)]
pub struct NormParseError(String);

impl FromStr for GradientNorm {
    type Err = NormParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rms" | "frobenius" | "fro" => Ok(Self::Rms),
            _ => Err(NormParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for NormParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "无效的范数: '{}', 期望 'rms'", self.0)
    }
}

impl std::error::Error for NormParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_collapse() {
        let norm = GradientNorm::Rms;
        assert!((norm.collapse(34.0, 1) - 34.0_f64.sqrt()).abs() < 1e-12);
        assert!((norm.collapse(8.0, 2) - 2.0).abs() < 1e-12);
        assert_eq!(norm.collapse(5.0, 0), 0.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("rms".parse::<GradientNorm>().unwrap(), GradientNorm::Rms);
        assert_eq!("Frobenius".parse::<GradientNorm>().unwrap(), GradientNorm::Rms);
        assert!("l1".parse::<GradientNorm>().is_err());
    }

    #[test]
    fn test_serde_alias() {
        let n: GradientNorm = serde_json::from_str("\"frobenius\"").unwrap();
        assert_eq!(n, GradientNorm::Rms);
        assert_eq!(serde_json::to_string(&GradientNorm::Rms).unwrap(), "\"rms\"");
    }
}

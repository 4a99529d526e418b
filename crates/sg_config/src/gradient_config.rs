// crates/sg_config/src/gradient_config.rs

//! GradientConfig - 表面梯度计算配置
//!
//! 所有字段都有默认值，JSON 文件中可只写需要覆盖的键。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::norm::GradientNorm;

/// 邻域环数上限
pub const MAX_NEIGHBORHOOD_SIZE: usize = 10;

/// 表面梯度计算配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// 邻域环数（边跳数）
    #[serde(default = "default_neighborhood_size")]
    pub neighborhood_size: usize,

    /// 帧聚合范数
    #[serde(default)]
    pub norm: GradientNorm,

    /// 法方程条件数阈值，超过则计为病态顶点
    #[serde(default = "default_condition_threshold")]
    pub condition_threshold: f64,

    /// 工作线程数，0 表示使用 rayon 全局线程池
    #[serde(default)]
    pub threads: usize,

    /// 是否启用并行
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// 并行阈值（顶点数），低于此值串行执行
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// 诊断顶点，计算时为该顶点输出详细日志
    #[serde(default)]
    pub diag_vertex: Option<usize>,
}

fn default_neighborhood_size() -> usize { 3 }
fn default_condition_threshold() -> f64 { sg_foundation::float::CONDITION_NUMBER_WARNING }
fn default_parallel() -> bool { true }
fn default_parallel_threshold() -> usize { 1000 }

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            neighborhood_size: default_neighborhood_size(),
            norm: GradientNorm::default(),
            condition_threshold: default_condition_threshold(),
            threads: 0,
            parallel: default_parallel(),
            parallel_threshold: default_parallel_threshold(),
            diag_vertex: None,
        }
    }
}

impl GradientConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GradientConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.neighborhood_size == 0 || self.neighborhood_size > MAX_NEIGHBORHOOD_SIZE {
            return Err(ConfigError::invalid(
                "neighborhood_size",
                self.neighborhood_size,
                "邻域环数必须在 [1, 10] 范围内",
            ));
        }

        if !self.condition_threshold.is_finite() || self.condition_threshold <= 1.0 {
            return Err(ConfigError::invalid(
                "condition_threshold",
                self.condition_threshold,
                "条件数阈值必须为大于 1 的有限值",
            ));
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 设置邻域环数
    pub fn with_neighborhood_size(mut self, nsize: usize) -> Self {
        self.neighborhood_size = nsize;
        self
    }

    /// 设置条件数阈值
    pub fn with_condition_threshold(mut self, threshold: f64) -> Self {
        self.condition_threshold = threshold;
        self
    }

    /// 设置线程数
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// 设置并行开关
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// 设置诊断顶点
    pub fn with_diag_vertex(mut self, vertex: Option<usize>) -> Self {
        self.diag_vertex = vertex;
        self
    }

    /// 设置聚合范数
    pub fn with_norm(mut self, norm: GradientNorm) -> Self {
        self.norm = norm;
        self
    }
}

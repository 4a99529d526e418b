// crates/sg_config/src/lib.rs

//! SurfGrad Config Layer
//!
//! 配置层，提供梯度计算的运行参数和帧聚合范数选择。
//!
//! # 模块概览
//!
//! - [`norm`]: `GradientNorm` 帧聚合规则
//! - [`gradient_config`]: `GradientConfig` 运行配置（JSON 文件）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! sg_cli       ─> GradientConfig
//! sg_gradient  ─> EstimatorConfig::from_config(&GradientConfig)
//! sg_config    ─> GradientConfig, GradientNorm (本层)
//! sg_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod gradient_config;
pub mod norm;

pub use error::ConfigError;
pub use gradient_config::{GradientConfig, MAX_NEIGHBORHOOD_SIZE};
pub use norm::GradientNorm;

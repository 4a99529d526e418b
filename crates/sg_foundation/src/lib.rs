// crates/sg_foundation/src/lib.rs

//! SurfGrad Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型和浮点数防护工具。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `SgError` / `SgResult`
//! - [`float`]: 有限性检查、安全除法与数值常量
//!
//! # 示例
//!
//! ```
//! use sg_foundation::{SgError, SgResult};
//! use sg_foundation::float::finite_or_zero;
//!
//! fn check(n: usize) -> SgResult<()> {
//!     SgError::check_size("field", 3, n)
//! }
//!
//! assert!(check(3).is_ok());
//! assert_eq!(finite_or_zero(f64::NAN), 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;

pub use error::{SgError, SgResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{SgError, SgResult};
    pub use crate::float::{finite_or_zero, safe_div, safe_sqrt};
}

// crates/sg_io/src/lib.rs

//! SurfGrad IO 层
//!
//! 表面和顶点场的文件读写，按扩展名分派格式。
//!
//! # 模块概览
//!
//! - [`sgb`] / [`fields`]: SGB 二进制容器与字段描述
//! - [`surface_file`]: 表面 (`.sgb`, `.obj`)
//! - [`field_file`]: 多帧顶点场 (`.sgb`, `.csv`)
//! - [`error`]: IO 错误类型

#![warn(clippy::all)]

pub mod error;
pub mod field_file;
pub mod fields;
pub mod sgb;
pub mod surface_file;

pub use error::{IoError, IoResult};
pub use field_file::{read_field, write_field, CsvFieldConfig, FieldFormat};
pub use fields::{DataType, FieldDescriptor, FieldIndex};
pub use sgb::{SgbReader, SgbWriter};
pub use surface_file::{read_surface, write_surface, SurfaceFormat};

// crates/sg_io/src/error.rs
//! IO 错误类型定义
//!
//! 所有错误最终可转换为 SgError 以实现跨层错误传递。

use std::path::PathBuf;

use sg_foundation::SgError;
use sg_mesh::MeshError;
use thiserror::Error;

use crate::fields::DataType;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 底层读写失败
    #[error("读写失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 数据流读写失败
    #[error("数据流读写失败: {0}")]
    Stream(#[from] std::io::Error),

    /// 文件扩展名不支持
    #[error("不支持的文件格式: {path} (支持: {supported})")]
    UnsupportedFormat {
        path: PathBuf,
        supported: &'static str,
    },

    /// SGB 容器损坏
    #[error("SGB 容器无效: {reason}")]
    InvalidContainer { reason: String },

    /// 字段不存在
    #[error("字段不存在: {name}")]
    FieldNotFound { name: String },

    /// 数据类型不匹配
    #[error("数据类型不匹配: 字段 {field} 期望 {expected:?}, 实际 {actual:?}")]
    DataTypeMismatch {
        field: String,
        expected: DataType,
        actual: DataType,
    },

    /// 字段形状错误
    #[error("字段形状错误: {field}: {reason}")]
    ShapeMismatch { field: String, reason: String },

    /// 文本解析错误
    #[error("文件解析错误: {file}:{line} - {message}")]
    ParseError {
        file: String,
        line: usize,
        message: String,
    },

    /// 网格构建失败
    #[error("网格错误: {0}")]
    Mesh(#[from] MeshError),

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] SgError),
}

impl IoError {
    /// 附带路径的读写错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 容器格式错误
    pub fn container(reason: impl Into<String>) -> Self {
        Self::InvalidContainer {
            reason: reason.into(),
        }
    }

    /// 解析错误
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl From<IoError> for SgError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io { path, source } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    SgError::file_not_found(path)
                } else {
                    SgError::io_with_source(format!("{}", path.display()), source)
                }
            }
            IoError::Stream(e) => e.into(),
            IoError::UnsupportedFormat { path, supported } => SgError::unsupported_format(
                path.display().to_string(),
                supported.split(", ").map(str::to_string).collect(),
            ),
            IoError::InvalidContainer { reason } => {
                SgError::serialization(format!("SGB 容器无效: {reason}"))
            }
            IoError::FieldNotFound { name } => {
                SgError::invalid_input(format!("字段不存在: {name}"))
            }
            IoError::DataTypeMismatch { field, expected, actual } => SgError::invalid_input(format!(
                "数据类型不匹配 (字段 {field}: 期望 {expected:?}, 实际 {actual:?})"
            )),
            IoError::ShapeMismatch { field, reason } => {
                SgError::invalid_input(format!("字段形状错误 [{field}]: {reason}"))
            }
            IoError::ParseError { file, line, message } => SgError::parse(file, line, message),
            IoError::Mesh(e) => e.into(),
            IoError::Foundation(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_file_not_found() {
        let err = IoError::io("a.sgb", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(SgError::from(err), SgError::FileNotFound { .. }));
    }

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let err = IoError::UnsupportedFormat {
            path: "mesh.stl".into(),
            supported: "sgb, obj",
        };
        match SgError::from(err) {
            SgError::UnsupportedFormat { supported, .. } => assert_eq!(supported, vec!["sgb", "obj"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}

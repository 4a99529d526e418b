// crates/sg_config/src/error.rs

//! 配置层错误类型

use sg_foundation::SgError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<ConfigError> for SgError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => SgError::io_with_source("读取配置失败", e),
            ConfigError::Parse(msg) => SgError::serialization(msg),
            ConfigError::InvalidValue { key, value, reason } => {
                SgError::invalid_config(key, value, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("neighborhood_size", 0, "必须为正");
        assert!(err.to_string().contains("neighborhood_size"));
    }

    #[test]
    fn test_into_foundation_error() {
        let err: SgError = ConfigError::Parse("bad json".into()).into();
        assert!(matches!(err, SgError::Serialization { .. }));
    }
}

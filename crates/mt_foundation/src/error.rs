// crates/mt_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MtError` 枚举和 `MtResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义输入/资源类错误，数值失稳在 mt_physics 中定义
//! 2. **显式传播**: 致命错误一律以 `Err` 返回，由应用层统一决定终止
//! 3. **可追溯**: 支持错误链
//!
//! # 示例
//!
//! ```
//! use mt_foundation::error::{MtError, MtResult};
//!
//! fn read_header() -> MtResult<()> {
//!     Err(MtError::parse("init.txt", 1, "缺少节点数"))
//! }
//! assert!(read_header().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type MtResult<T> = Result<T, MtError>;

/// MariTrans 错误类型
#[derive(Error, Debug)]
pub enum MtError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第{line}行: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号（二进制文件为记录序号）
        line: usize,
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 数据校验错误
    // ========================================================================
    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 配置与运行时
    // ========================================================================
    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MtError {
    /// 从IO错误创建（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MtError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> MtResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内（NaN 视为越界）
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> MtResult<()> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> MtResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MtError::invalid_config("time.dt", "-1", "步长必须为正");
        assert!(err.to_string().contains("time.dt"));
    }

    #[test]
    fn test_file_not_found_display() {
        let err = MtError::file_not_found("cases/init.txt");
        assert!(err.to_string().contains("cases/init.txt"));
    }

    #[test]
    fn test_parse_error_mentions_line() {
        let err = MtError::parse("init.txt", 7, "数值为负");
        let msg = err.to_string();
        assert!(msg.contains("init.txt"));
        assert!(msg.contains("第7行"));
    }

    #[test]
    fn test_check_size() {
        assert!(MtError::check_size("nodes", 10, 10).is_ok());
        assert!(MtError::check_size("nodes", 10, 5).is_err());
    }

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(MtError::check_range("value", 5.0, 0.0, 10.0).is_ok());
        assert!(MtError::check_range("value", -1.0, 0.0, 10.0).is_err());
        assert!(MtError::check_range("value", f64::NAN, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(MtError::check_index("Node", 5, 10).is_ok());
        assert!(MtError::check_index("Node", 10, 10).is_err());
    }
}

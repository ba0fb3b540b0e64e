// crates/mt_io/src/error.rs

//! IO 错误类型定义
//!
//! 读取失败一律视为致命输入错误，不做部分加载。
//! 所有错误都可转换为 `MtError`，交由上层统一处理。

use mt_foundation::MtError;
use std::path::PathBuf;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件打开/读写失败
    #[error("文件 {path} 访问失败: {source}")]
    Access {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 文本解析错误
    #[error("文件解析错误: {file}:{line} - {message}")]
    Parse {
        /// 文件名
        file: String,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误信息
        message: String,
    },

    /// 二进制格式错误
    #[error("格式错误: {file}, {reason}")]
    Format {
        /// 文件名
        file: String,
        /// 原因
        reason: String,
    },

    /// 节点数与网格不一致
    #[error("节点数不匹配: 网格 {expected}, 文件 {found}")]
    NodeCountMismatch {
        /// 网格节点数
        expected: usize,
        /// 文件声明的节点数
        found: usize,
    },

    /// 基础层错误
    #[error("基础层错误: {0}")]
    Foundation(#[from] MtError),
}

impl IoError {
    /// 文件访问错误
    pub fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }

    /// 文本解析错误
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 二进制格式错误
    pub fn format(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

impl From<IoError> for MtError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Access { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                MtError::file_not_found(path)
            }
            IoError::Access { path, source } => {
                MtError::io_with_source(format!("文件 {} 访问失败", path.display()), source)
            }
            IoError::Parse { file, line, message } => MtError::parse(file, line, message),
            IoError::Format { file, reason } => {
                MtError::invalid_input(format!("格式错误 [{file}]: {reason}"))
            }
            IoError::NodeCountMismatch { expected, found } => {
                MtError::size_mismatch("node count", expected, found)
            }
            IoError::Foundation(mt_err) => mt_err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts() {
        let err: MtError = IoError::parse("init.txt", 4, "负值").into();
        assert!(matches!(err, MtError::ParseError { line: 4, .. }));
    }

    #[test]
    fn test_missing_file_converts() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: MtError = IoError::access("cases/bc.txt", source).into();
        match err {
            MtError::FileNotFound { path } => assert_eq!(path, PathBuf::from("cases/bc.txt")),
            other => panic!("期望 FileNotFound, 实际 {other:?}"),
        }

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MtError = IoError::access("cases/bc.txt", denied).into();
        assert!(matches!(err, MtError::Io { .. }));
    }

    #[test]
    fn test_count_mismatch_converts() {
        let err: MtError = IoError::NodeCountMismatch { expected: 10, found: 9 }.into();
        assert!(matches!(err, MtError::SizeMismatch { expected: 10, actual: 9, .. }));
    }

    #[test]
    fn test_foundation_round_trip() {
        let err: MtError = IoError::from(MtError::internal("x")).into();
        assert!(matches!(err, MtError::Internal { .. }));
    }
}

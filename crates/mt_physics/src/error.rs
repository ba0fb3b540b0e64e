// crates/mt_physics/src/error.rs

//! 物理层错误类型
//!
//! 在基础层 `MtError` 之上增加数值失稳。失稳不可恢复，
//! 由驱动写出诊断记录后原样向上传播。

use mt_foundation::MtError;
use thiserror::Error;

/// 物理层结果类型
pub type TransportResult<T> = Result<T, TransportError>;

/// 输运求解错误
#[derive(Error, Debug)]
pub enum TransportError {
    /// 某节点变化率非有限
    #[error("数值失稳: t={time} s, 第{step}步, 节点 {dof} 的变化率非有限")]
    NumericalInstability {
        /// 失稳时刻（未推进）
        time: f64,
        /// 步序号（从 1 开始）
        step: usize,
        /// 首个出错节点
        dof: usize,
    },

    /// 输入、资源等基础错误
    #[error(transparent)]
    Foundation(#[from] MtError),
}

impl TransportError {
    /// 是否为数值失稳
    pub fn is_instability(&self) -> bool {
        matches!(self, Self::NumericalInstability { .. })
    }
}

// crates/mt_foundation/src/lib.rs

//! MariTrans Foundation Layer
//!
//! 基础层，提供整个项目共用的最小抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `MtError` 与校验辅助方法
//! - [`atomic`]: 基于 `AtomicU64` 的 f64 原子累加
//!
//! # 示例
//!
//! ```
//! use mt_foundation::{AtomicF64, MtError, MtResult};
//!
//! fn positive(x: f64) -> MtResult<f64> {
//!     MtError::check_range("x", x, f64::MIN_POSITIVE, f64::MAX)?;
//!     Ok(x)
//! }
//!
//! let acc = AtomicF64::new(1.0);
//! acc.fetch_add(positive(2.0).unwrap());
//! assert_eq!(acc.load(), 3.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod error;

pub use atomic::AtomicF64;
pub use error::{MtError, MtResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::atomic::AtomicF64;
    pub use crate::error::{MtError, MtResult};
}

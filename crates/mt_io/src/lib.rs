// crates/mt_io/src/lib.rs

//! MariTrans IO 层
//!
//! 负责求解器与文件系统之间的全部数据交换。
//!
//! # 模块概览
//!
//! - [`result_writer`]: 大端 `f32` 结果流的写出与读取
//! - [`initial_state`]: 文本/二进制初始场
//! - [`boundary_reader`]: 边界条件与点源文本
//! - [`error`]: IO 错误类型
//!
//! 读取失败时整个文件作废，错误带文件名与行号向上传播。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary_reader;
pub mod error;
pub mod initial_state;
pub mod result_writer;

pub use boundary_reader::{parse_key_mask, read_boundary_file};
pub use error::{IoError, IoResult};
pub use initial_state::{load_initial, write_initial_binary, BinaryInitialState};
pub use result_writer::{ResultReader, ResultRecord, ResultWriter};

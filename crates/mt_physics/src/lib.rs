// crates/mt_physics/src/lib.rs

//! MariTrans 物理核心
//!
//! 三角形网格上深度平均标量输运（盐度、溶解氧、水温、悬沙、示踪剂）的
//! 显式有限元求解。自由度位于网格节点，单元为线性三角形。
//!
//! # 模块概览
//!
//! - [`forcing`]: 时间序列与边界时间函数
//! - [`current`]: 外部流场（流速、水深、弥散、干湿权重）及其提供者
//! - [`sediment`]: 输沙公式能力接口 `{bedload, suspended_load}`
//! - [`transport`]: 节点状态、边界解析与外推、源汇、单元残差组装、两步积分
//! - [`engine`]: 时间推进驱动与结果输出接口
//!
//! # 每步流程
//!
//! ```text
//! 流场更新 → 源汇/边界重施加 → 外推松弛 → 单元组装 → 积分 → 失稳检查 → 推进时间
//! ```
//!
//! 各阶段严格按序执行，阶段内部在 rayon 线程池上并行。

#![warn(clippy::all)]

pub mod current;
pub mod engine;
pub mod error;
pub mod forcing;
pub mod sediment;
pub mod transport;

pub use current::{CurrentField, CurrentProvider, HydroConstraint, StaticCurrent, UniformCurrent, WettingDrying};
pub use engine::{MemorySink, ResultSink, RunSummary, Simulation, StepInfo, TimeControl};
pub use error::{TransportError, TransportResult};
pub use forcing::{ExtrapolationMode, TimeFunction, TimeSeries};
pub use transport::{
    BoundaryKind, BoundarySpec, DofClass, Species, TransportModel, TransportSettings,
    TransportState,
};

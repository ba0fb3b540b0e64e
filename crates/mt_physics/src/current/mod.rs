// crates/mt_physics/src/current/mod.rs

//! 外部流场
//!
//! 输运模型只读流场，不做修改。每步开始前由 [`CurrentProvider`]
//! 填写节点量，再由 [`CurrentField::refresh_derived`] 计算干湿权重和单元量。

pub mod field;
pub mod provider;
pub mod wetting;

pub use field::{CurrentField, HydroConstraint};
pub use provider::{CurrentProvider, StaticCurrent, UniformCurrent};
pub use wetting::WettingDrying;

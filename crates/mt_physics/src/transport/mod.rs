// crates/mt_physics/src/transport/mod.rs

//! 深度平均标量输运
//!
//! 自由度在网格节点上，单元为线性三角形。同一求解器按 [`Species`]
//! 实例化为盐度、水温、溶解氧、悬沙或示踪剂模型。
//!
//! - [`state`]: 节点状态与边界绑定
//! - [`boundary`]: 边界条件解析（给定/外推/内部）
//! - [`extrapolation`]: 欠定边界节点向较深邻点松弛
//! - [`source`]: 源汇与边界重施加
//! - [`assembler`]: SUPG 稳定化单元残差组装
//! - [`integrator`]: 变步长两步显式积分
//! - [`model`]: 组合以上各阶段

pub mod assembler;
pub mod boundary;
pub mod extrapolation;
pub mod integrator;
pub mod model;
pub mod source;
pub mod species;
pub mod state;

pub use assembler::{AssemblyMetrics, AssemblyParams, ElementAssembler, ElementResidual};
pub use boundary::{BoundaryKind, BoundarySpec, ResolveReport};
pub use extrapolation::ExtrapolationParams;
pub use integrator::Ab2Integrator;
pub use model::{TransportModel, TransportSettings};
pub use species::{SedimentModel, Species};
pub use state::{DofBinding, DofClass, DofState, PointSource, TransportState};

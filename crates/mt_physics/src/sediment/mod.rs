// crates/mt_physics/src/sediment/mod.rs

//! 泥沙
//!
//! 输运核心只通过 [`SedimentFormula`] 能力接口取得推移质/悬移质输沙率，
//! 从不直接依赖具体公式。
//!
//! - [`properties`]: 泥沙颗粒属性（临界希尔兹数、无量纲粒径）
//! - [`formulas`]: 输沙公式及按配置选择公式

pub mod formulas;
pub mod properties;

pub use formulas::{formula_for, HydraulicState, SedimentFormula};
pub use properties::SedimentProperties;

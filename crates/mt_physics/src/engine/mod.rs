// crates/mt_physics/src/engine/mod.rs

//! 时间推进引擎
//!
//! - [`simulation`]: 单时钟驱动，按固定顺序执行各阶段，写出结果，处理失稳
//! - [`parallel`]: 工作线程池

pub mod parallel;
pub mod simulation;

pub use simulation::{MemorySink, ResultSink, RunSummary, Simulation, StepInfo, TimeControl};

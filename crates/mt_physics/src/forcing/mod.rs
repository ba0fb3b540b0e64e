// crates/mt_physics/src/forcing/mod.rs

//! 外部强迫
//!
//! 边界条件和点源都由标量时间函数驱动：常数或分段线性时间序列。

pub mod timeseries;

pub use timeseries::{ExtrapolationMode, TimeSeries};

use std::sync::Arc;

/// 标量时间函数
#[derive(Debug, Clone)]
pub enum TimeFunction {
    /// 常数
    Constant(f64),
    /// 时间序列（多个节点可共享同一序列）
    Series(Arc<TimeSeries>),
}

impl TimeFunction {
    /// 由时间序列构造
    pub fn series(ts: TimeSeries) -> Self {
        Self::Series(Arc::new(ts))
    }

    /// 时刻 t 的值
    #[inline]
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Self::Constant(v) => *v,
            Self::Series(ts) => ts.value(t),
        }
    }

    /// 时刻 t 的时间导数
    #[inline]
    pub fn derivative(&self, t: f64) -> f64 {
        match self {
            Self::Constant(_) => 0.0,
            Self::Series(ts) => ts.derivative(t),
        }
    }
}

impl From<f64> for TimeFunction {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

// crates/mt_physics/src/forcing/timeseries.rs

//! 时间序列数据结构和插值
//!
//! 分段线性时间序列，支持：
//! - 线性插值与分段斜率（边界函数的时间导数）
//! - 多种外推模式（截断、线性、循环）
//!
//! # 使用示例
//!
//! ```
//! use mt_physics::forcing::{ExtrapolationMode, TimeSeries};
//!
//! let series = TimeSeries::new(vec![0.0, 10.0, 20.0], vec![0.0, 5.0, 5.0])
//!     .unwrap()
//!     .with_extrapolation(ExtrapolationMode::Cyclic);
//!
//! assert!((series.value(5.0) - 2.5).abs() < 1e-12);
//! assert!((series.derivative(5.0) - 0.5).abs() < 1e-12);
//! // 循环外推 t=25 -> t=5
//! assert!((series.value(25.0) - 2.5).abs() < 1e-12);
//! ```

use mt_foundation::{MtError, MtResult};
use serde::{Deserialize, Serialize};

/// 外推模式
///
/// 查询时间超出数据范围时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationMode {
    /// 截断：超出范围时取端点值，导数为零
    #[default]
    Clamp,
    /// 线性：沿首/末段斜率延伸
    Linear,
    /// 循环：`t -> t_start + (t - t_start) mod (t_end - t_start)`
    Cyclic,
}

/// 时间序列数据
///
/// # 约束
///
/// - 时间数组严格单调递增
/// - 时间和值数组长度相等且非空
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
    extrap_mode: ExtrapolationMode,
}

impl TimeSeries {
    /// 从时间和值数组创建时间序列
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> MtResult<Self> {
        MtError::check_size("time series values", times.len(), values.len())?;
        if times.is_empty() {
            return Err(MtError::invalid_input("时间序列不能为空"));
        }
        for i in 1..times.len() {
            if !(times[i] > times[i - 1]) {
                return Err(MtError::invalid_input(format!(
                    "时间必须严格递增: times[{}]={} <= times[{}]={}",
                    i,
                    times[i],
                    i - 1,
                    times[i - 1]
                )));
            }
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(MtError::invalid_input(format!("时间序列含非有限值: {}", v)));
        }

        Ok(Self {
            times,
            values,
            extrap_mode: ExtrapolationMode::Clamp,
        })
    }

    /// 从 (时间, 值) 点对列表创建时间序列
    pub fn from_points(points: Vec<(f64, f64)>) -> MtResult<Self> {
        let (times, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Self::new(times, values)
    }

    /// 设置外推模式
    pub fn with_extrapolation(mut self, mode: ExtrapolationMode) -> Self {
        self.extrap_mode = mode;
        self
    }

    /// 外推模式
    pub fn extrapolation_mode(&self) -> ExtrapolationMode {
        self.extrap_mode
    }

    /// 时间范围
    pub fn time_range(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// 数据点数量
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// 是否为空（构造保证非空）
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 时刻 t 的插值
    pub fn value(&self, t: f64) -> f64 {
        let n = self.times.len();
        if n == 1 {
            return self.values[0];
        }
        let (t_start, t_end) = self.time_range();

        if t < t_start || t > t_end {
            return match self.extrap_mode {
                ExtrapolationMode::Clamp => {
                    if t < t_start {
                        self.values[0]
                    } else {
                        self.values[n - 1]
                    }
                }
                ExtrapolationMode::Linear => {
                    let seg = if t < t_start { 0 } else { n - 2 };
                    let anchor = if t < t_start { 0 } else { n - 1 };
                    self.values[anchor] + self.slope(seg) * (t - self.times[anchor])
                }
                ExtrapolationMode::Cyclic => self.interpolate(self.wrap(t)),
            };
        }

        self.interpolate(t)
    }

    /// 时刻 t 的时间导数（所在段斜率，节点处取右侧段）
    pub fn derivative(&self, t: f64) -> f64 {
        let n = self.times.len();
        if n == 1 {
            return 0.0;
        }
        let (t_start, t_end) = self.time_range();

        if t < t_start || t > t_end {
            return match self.extrap_mode {
                ExtrapolationMode::Clamp => 0.0,
                ExtrapolationMode::Linear => {
                    if t < t_start {
                        self.slope(0)
                    } else {
                        self.slope(n - 2)
                    }
                }
                ExtrapolationMode::Cyclic => self.slope(self.segment(self.wrap(t))),
            };
        }

        self.slope(self.segment(t))
    }

    fn wrap(&self, t: f64) -> f64 {
        let (t_start, t_end) = self.time_range();
        t_start + (t - t_start).rem_euclid(t_end - t_start)
    }

    /// 包含 t 的段索引，`0..n-1`
    fn segment(&self, t: f64) -> usize {
        let n = self.times.len();
        let idx = self.times.partition_point(|&ti| ti <= t);
        idx.saturating_sub(1).min(n - 2)
    }

    fn slope(&self, seg: usize) -> f64 {
        (self.values[seg + 1] - self.values[seg]) / (self.times[seg + 1] - self.times[seg])
    }

    fn interpolate(&self, t: f64) -> f64 {
        let seg = self.segment(t);
        self.values[seg] + self.slope(seg) * (t - self.times[seg])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> TimeSeries {
        TimeSeries::new(vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 0.0]).unwrap()
    }

    #[test]
    fn test_interpolation() {
        let ts = ramp();
        assert!((ts.value(0.5) - 1.0).abs() < 1e-12);
        assert!((ts.value(2.0) - 1.0).abs() < 1e-12);
        assert!((ts.value(1.0) - 2.0).abs() < 1e-12);
        assert!((ts.value(3.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_derivative_piecewise() {
        let ts = ramp();
        assert!((ts.derivative(0.5) - 2.0).abs() < 1e-12);
        assert!((ts.derivative(2.5) + 1.0).abs() < 1e-12);
        // 节点处取右侧段
        assert!((ts.derivative(1.0) + 1.0).abs() < 1e-12);
        // 末端点仍在最后一段
        assert!((ts.derivative(3.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_extrapolation() {
        let ts = ramp();
        assert_eq!(ts.value(-5.0), 0.0);
        assert_eq!(ts.value(10.0), 0.0);
        assert_eq!(ts.derivative(10.0), 0.0);
    }

    #[test]
    fn test_linear_extrapolation() {
        let ts = ramp().with_extrapolation(ExtrapolationMode::Linear);
        assert!((ts.value(-1.0) + 2.0).abs() < 1e-12);
        assert!((ts.value(4.0) + 1.0).abs() < 1e-12);
        assert!((ts.derivative(4.0) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cyclic_extrapolation() {
        let ts = ramp().with_extrapolation(ExtrapolationMode::Cyclic);
        assert!((ts.value(3.5) - ts.value(0.5)).abs() < 1e-12);
        assert!((ts.value(-2.5) - ts.value(0.5)).abs() < 1e-12);
        assert!((ts.derivative(3.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_is_constant() {
        let ts = TimeSeries::new(vec![5.0], vec![3.0]).unwrap();
        assert_eq!(ts.value(-100.0), 3.0);
        assert_eq!(ts.value(100.0), 3.0);
        assert_eq!(ts.derivative(5.0), 0.0);
    }

    #[test]
    fn test_invalid_series() {
        assert!(TimeSeries::new(vec![], vec![]).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(TimeSeries::new(vec![0.0, 0.0], vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_from_points() {
        let ts = TimeSeries::from_points(vec![(0.0, 1.0), (2.0, 3.0)]).unwrap();
        assert_eq!(ts.len(), 2);
        assert!((ts.value(1.0) - 2.0).abs() < 1e-12);
    }
}

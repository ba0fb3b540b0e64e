// crates/mt_physics/src/current/wetting.rs

//! 干湿权重
//!
//! 总水深 `h` 不超过阈值 WATT 时节点为干，权重为 0；
//! `h >= watt + transition` 时权重为 1；其间线性过渡。

use mt_config::WettingConfig;

/// 干湿处理参数
#[derive(Debug, Clone, Copy)]
pub struct WettingDrying {
    /// 干湿阈值 [m]
    pub watt: f64,
    /// 过渡带宽度 [m]
    pub transition: f64,
}

impl Default for WettingDrying {
    fn default() -> Self {
        Self::from_config(&WettingConfig::default())
    }
}

impl WettingDrying {
    /// 由配置创建
    pub fn from_config(config: &WettingConfig) -> Self {
        Self {
            watt: config.watt,
            transition: config.transition,
        }
    }

    /// 是否为湿节点
    #[inline]
    pub fn is_wet(&self, h: f64) -> bool {
        h > self.watt
    }

    /// 干湿权重 wλ ∈ [0, 1]
    #[inline]
    pub fn wet_weight(&self, h: f64) -> f64 {
        if !(h > self.watt) {
            0.0
        } else if self.transition <= 0.0 || h >= self.watt + self.transition {
            1.0
        } else {
            (h - self.watt) / self.transition
        }
    }

    /// 扩散项使用的水深下限
    #[inline]
    pub fn limited_depth(&self, h: f64) -> f64 {
        h.max(self.watt)
    }
}

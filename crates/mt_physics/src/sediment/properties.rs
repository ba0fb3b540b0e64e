// crates/mt_physics/src/sediment/properties.rs

//! 泥沙属性

use serde::{Deserialize, Serialize};

/// 重力加速度 [m/s²]
pub const G: f64 = 9.81;
/// 水的运动黏度 [m²/s]
pub const NU_WATER: f64 = 1.0e-6;

/// 泥沙颗粒属性
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SedimentProperties {
    /// 中值粒径 [m]
    pub d50: f64,
    /// 泥沙密度 [kg/m³]
    pub rho_s: f64,
    /// 水密度 [kg/m³]
    pub rho_w: f64,
    /// 相对密度 s = ρs/ρw
    pub relative_density: f64,
    /// 无量纲粒径 D*
    pub dimensionless_diameter: f64,
    /// 临界希尔兹数
    pub critical_shields: f64,
}

impl SedimentProperties {
    /// 由粒径与密度计算
    pub fn new(d50: f64, rho_s: f64, rho_w: f64) -> Self {
        let s = rho_s / rho_w;
        let d_star = d50 * ((s - 1.0) * G / (NU_WATER * NU_WATER)).powf(1.0 / 3.0);
        // Soulsby-Whitehouse (1997)
        let theta_cr = 0.30 / (1.0 + 1.2 * d_star) + 0.055 * (1.0 - (-0.02 * d_star).exp());
        Self {
            d50,
            rho_s,
            rho_w,
            relative_density: s,
            dimensionless_diameter: d_star,
            critical_shields: theta_cr,
        }
    }

    /// 床面切应力对应的希尔兹数
    #[inline]
    pub fn shields_number(&self, tau_b: f64) -> f64 {
        tau_b / ((self.rho_s - self.rho_w) * G * self.d50)
    }

    /// 输沙率量纲尺度 `sqrt((s-1) g d³)` [m²/s]
    #[inline]
    pub fn transport_scale(&self) -> f64 {
        ((self.relative_density - 1.0) * G * self.d50.powi(3)).sqrt()
    }
}

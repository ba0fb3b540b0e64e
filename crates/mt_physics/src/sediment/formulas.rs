// crates/mt_physics/src/sediment/formulas.rs

//! 输沙公式库
//!
//! 所有公式实现 [`SedimentFormula`]：
//! - `bedload`: 单宽推移质输沙率 [m²/s]
//! - `suspended_load`: 单宽悬移质输沙率 [m²/s]
//!
//! 已实现：
//! - Meyer-Peter-Müller (1948)：仅推移质
//! - Engelund-Hansen (1967)：全沙，全部计入悬移质
//! - Van Rijn (1984)：推移质与简化悬移质
//!
//! # 使用示例
//!
//! ```
//! use mt_config::SedimentFormulaKind;
//! use mt_physics::sediment::{formula_for, HydraulicState, SedimentProperties};
//!
//! let sand = SedimentProperties::new(2.0e-4, 2650.0, 1000.0);
//! let flow = HydraulicState::from_manning(2.0, 1.0, 0.025, 1000.0);
//! let formula = formula_for(SedimentFormulaKind::VanRijn);
//! assert!(formula.suspended_load(&flow, &sand) > 0.0);
//! ```

use super::properties::{SedimentProperties, G};
use mt_config::SedimentFormulaKind;

/// 局部水力状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicState {
    /// 水深 [m]
    pub depth: f64,
    /// 流速大小 [m/s]
    pub speed: f64,
    /// 床面切应力 [Pa]
    pub shear_stress: f64,
}

impl HydraulicState {
    /// 按 Manning 公式由流速计算床面切应力
    ///
    /// `τ = ρ g n² u² / h^(1/3)`
    pub fn from_manning(depth: f64, speed: f64, manning_n: f64, rho_w: f64) -> Self {
        let shear_stress = if depth > 0.0 {
            rho_w * G * manning_n * manning_n * speed * speed / depth.cbrt()
        } else {
            0.0
        };
        Self {
            depth,
            speed,
            shear_stress,
        }
    }
}

/// 输沙公式能力接口
pub trait SedimentFormula: Send + Sync {
    /// 公式名称
    fn name(&self) -> &'static str;

    /// 单宽推移质输沙率 [m²/s]
    fn bedload(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64;

    /// 单宽悬移质输沙率 [m²/s]
    fn suspended_load(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64;

    /// 平衡含沙量 [kg/m³]：悬移质输沙率除以单宽流量
    fn equilibrium_concentration(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        let q = flow.speed * flow.depth;
        if q <= 1e-12 {
            return 0.0;
        }
        sed.rho_s * self.suspended_load(flow, sed) / q
    }
}

// ============================================================
// Meyer-Peter-Müller (1948)
// ============================================================

/// Meyer-Peter-Müller：`Φ = 8 (θ - θ_cr)^1.5`
#[derive(Debug, Clone, Copy)]
pub struct MeyerPeterMuller {
    /// 系数
    pub coefficient: f64,
    /// 指数
    pub exponent: f64,
}

impl Default for MeyerPeterMuller {
    fn default() -> Self {
        Self {
            coefficient: 8.0,
            exponent: 1.5,
        }
    }
}

impl SedimentFormula for MeyerPeterMuller {
    fn name(&self) -> &'static str {
        "Meyer-Peter-Müller"
    }

    fn bedload(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        let excess = sed.shields_number(flow.shear_stress) - sed.critical_shields;
        if excess <= 0.0 {
            return 0.0;
        }
        self.coefficient * excess.powf(self.exponent) * sed.transport_scale()
    }

    fn suspended_load(&self, _flow: &HydraulicState, _sed: &SedimentProperties) -> f64 {
        0.0
    }
}

// ============================================================
// Engelund-Hansen (1967)
// ============================================================

/// Engelund-Hansen 全沙公式：`Φ = 0.1 θ^2.5 / f`，`f = 2τ / (ρ u²)`
#[derive(Debug, Clone, Copy, Default)]
pub struct EngelundHansen;

impl EngelundHansen {
    fn total_load(flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        if flow.speed <= 1e-12 || flow.shear_stress <= 0.0 {
            return 0.0;
        }
        let friction = 2.0 * flow.shear_stress / (sed.rho_w * flow.speed * flow.speed);
        let theta = sed.shields_number(flow.shear_stress);
        0.1 * theta.powf(2.5) / friction * sed.transport_scale()
    }
}

impl SedimentFormula for EngelundHansen {
    fn name(&self) -> &'static str {
        "Engelund-Hansen"
    }

    fn bedload(&self, _flow: &HydraulicState, _sed: &SedimentProperties) -> f64 {
        0.0
    }

    fn suspended_load(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        Self::total_load(flow, sed)
    }
}

// ============================================================
// Van Rijn (1984)
// ============================================================

/// Van Rijn (1984)
///
/// 推移质 `Φ = 0.053 T^2.1 D*^-0.3`，`T = (θ - θ_cr) / θ_cr`；
/// 悬移质 `q_s = 0.012 u d50 M^2.4 D*^-0.6`，`M = (u - u_cr) / sqrt((s-1) g d50)`。
/// 二次摩阻下 `u_cr = u sqrt(θ_cr / θ)`。
#[derive(Debug, Clone, Copy, Default)]
pub struct VanRijn;

impl SedimentFormula for VanRijn {
    fn name(&self) -> &'static str {
        "Van Rijn 1984"
    }

    fn bedload(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        let theta = sed.shields_number(flow.shear_stress);
        let theta_cr = sed.critical_shields;
        if theta <= theta_cr {
            return 0.0;
        }
        let t_param = (theta - theta_cr) / theta_cr;
        0.053 * t_param.powf(2.1) * sed.dimensionless_diameter.powf(-0.3) * sed.transport_scale()
    }

    fn suspended_load(&self, flow: &HydraulicState, sed: &SedimentProperties) -> f64 {
        let theta = sed.shields_number(flow.shear_stress);
        if theta <= sed.critical_shields {
            return 0.0;
        }
        let u_cr = flow.speed * (sed.critical_shields / theta).sqrt();
        let mobility = (flow.speed - u_cr) / ((sed.relative_density - 1.0) * G * sed.d50).sqrt();
        0.012 * flow.speed * sed.d50 * mobility.powf(2.4) * sed.dimensionless_diameter.powf(-0.6)
    }
}

// ============================================================
// 公式选择
// ============================================================

/// 按配置选择输沙公式
pub fn formula_for(kind: SedimentFormulaKind) -> Box<dyn SedimentFormula> {
    match kind {
        SedimentFormulaKind::MeyerPeterMuller => Box::new(MeyerPeterMuller::default()),
        SedimentFormulaKind::EngelundHansen => Box::new(EngelundHansen),
        SedimentFormulaKind::VanRijn => Box::new(VanRijn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sand() -> SedimentProperties {
        SedimentProperties::new(2.0e-4, 2650.0, 1000.0)
    }

    fn flow(speed: f64) -> HydraulicState {
        HydraulicState::from_manning(2.0, speed, 0.025, 1000.0)
    }

    #[test]
    fn test_no_transport_in_still_water() {
        for kind in [
            SedimentFormulaKind::MeyerPeterMuller,
            SedimentFormulaKind::EngelundHansen,
            SedimentFormulaKind::VanRijn,
        ] {
            let f = formula_for(kind);
            assert_eq!(f.bedload(&flow(0.0), &sand()), 0.0, "{}", f.name());
            assert_eq!(f.suspended_load(&flow(0.0), &sand()), 0.0, "{}", f.name());
            assert_eq!(f.equilibrium_concentration(&flow(0.0), &sand()), 0.0);
        }
    }

    #[test]
    fn test_mpm_matches_closed_form() {
        let sed = sand();
        let fl = flow(1.5);
        let theta = sed.shields_number(fl.shear_stress);
        assert!(theta > sed.critical_shields);
        let expected = 8.0 * (theta - sed.critical_shields).powf(1.5) * sed.transport_scale();
        assert!((MeyerPeterMuller::default().bedload(&fl, &sed) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_loads_increase_with_speed() {
        let sed = sand();
        for kind in [SedimentFormulaKind::EngelundHansen, SedimentFormulaKind::VanRijn] {
            let f = formula_for(kind);
            let slow = f.suspended_load(&flow(0.8), &sed);
            let fast = f.suspended_load(&flow(1.6), &sed);
            assert!(fast > slow, "{}", f.name());
        }
        let vr = VanRijn;
        assert!(vr.bedload(&flow(1.6), &sed) > vr.bedload(&flow(0.8), &sed));
    }

    #[test]
    fn test_below_critical_is_zero() {
        let sed = SedimentProperties::new(2.0e-3, 2650.0, 1000.0);
        let fl = flow(0.05);
        assert!(sed.shields_number(fl.shear_stress) < sed.critical_shields);
        assert_eq!(MeyerPeterMuller::default().bedload(&fl, &sed), 0.0);
        assert_eq!(VanRijn.suspended_load(&fl, &sed), 0.0);
    }
}

// crates/mt_physics/src/transport/species.rs

//! 输运物质
//!
//! 同一求解器的不同实例化。各物质给出物理取值范围、
//! 残差中的反应项，以及（悬沙）湿节点上的自身源项。

use crate::sediment::{formula_for, HydraulicState, SedimentFormula, SedimentProperties};
use glam::DVec2;
use mt_config::{SedimentConfig, SpeciesConfig};
use std::fmt;
use std::sync::Arc;

/// 悬沙模型：输沙公式 + 泥沙属性
#[derive(Clone)]
pub struct SedimentModel {
    formula: Arc<dyn SedimentFormula>,
    properties: SedimentProperties,
    manning_n: f64,
    adaptation_time: f64,
}

impl fmt::Debug for SedimentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SedimentModel")
            .field("formula", &self.formula.name())
            .field("properties", &self.properties)
            .field("manning_n", &self.manning_n)
            .field("adaptation_time", &self.adaptation_time)
            .finish()
    }
}

impl SedimentModel {
    /// 由配置创建
    pub fn from_config(config: &SedimentConfig) -> Self {
        Self {
            formula: Arc::from(formula_for(config.formula)),
            properties: SedimentProperties::new(config.d50, config.rho_s, config.rho_w),
            manning_n: config.manning_n,
            adaptation_time: config.adaptation_time,
        }
    }

    /// 使用指定公式
    pub fn with_formula(mut self, formula: Arc<dyn SedimentFormula>) -> Self {
        self.formula = formula;
        self
    }

    /// 公式名称
    pub fn formula_name(&self) -> &'static str {
        self.formula.name()
    }

    /// 节点水力状态
    pub fn hydraulic_state(&self, depth: f64, velocity: DVec2) -> HydraulicState {
        HydraulicState::from_manning(depth, velocity.length(), self.manning_n, self.properties.rho_w)
    }

    /// 单宽推移质输沙率 [m²/s]
    pub fn bedload(&self, depth: f64, velocity: DVec2) -> f64 {
        self.formula
            .bedload(&self.hydraulic_state(depth, velocity), &self.properties)
    }

    /// 平衡含沙量 [kg/m³]
    pub fn equilibrium_concentration(&self, depth: f64, velocity: DVec2) -> f64 {
        self.formula
            .equilibrium_concentration(&self.hydraulic_state(depth, velocity), &self.properties)
    }

    /// 冲淤源项：向平衡含沙量弛豫
    pub fn exchange(&self, c: f64, depth: f64, velocity: DVec2) -> f64 {
        (self.equilibrium_concentration(depth, velocity) - c) / self.adaptation_time
    }
}

/// 输运物质
#[derive(Debug, Clone)]
pub enum Species {
    /// 盐度 [psu]，上限 360
    Salinity,
    /// 水温 [°C]
    Temperature,
    /// 溶解氧 [mg/L]
    DissolvedOxygen {
        /// 饱和浓度
        saturation: f64,
    },
    /// 一般示踪剂
    Tracer,
    /// 悬沙 [kg/m³]
    SuspendedSediment(SedimentModel),
}

impl Species {
    /// 由配置创建
    pub fn from_config(config: &SpeciesConfig) -> Self {
        match config {
            SpeciesConfig::Salinity => Self::Salinity,
            SpeciesConfig::Temperature => Self::Temperature,
            SpeciesConfig::DissolvedOxygen { saturation } => Self::DissolvedOxygen {
                saturation: *saturation,
            },
            SpeciesConfig::Tracer => Self::Tracer,
            SpeciesConfig::SuspendedSediment(sed) => {
                Self::SuspendedSediment(SedimentModel::from_config(sed))
            }
        }
    }

    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Salinity => "salinity",
            Self::Temperature => "temperature",
            Self::DissolvedOxygen { .. } => "dissolved_oxygen",
            Self::Tracer => "tracer",
            Self::SuspendedSediment(_) => "suspended_sediment",
        }
    }

    /// 物理取值范围 `(下限, 上限)`
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Salinity => (0.0, 360.0),
            Self::Temperature => (0.0, 40.0),
            Self::DissolvedOxygen { .. } => (0.0, 20.0),
            Self::Tracer | Self::SuspendedSediment(_) => (0.0, f64::INFINITY),
        }
    }

    /// 残差中的反应项（正值使浓度减小）
    #[inline]
    pub fn reaction(&self, c: f64, decay_rate: f64) -> f64 {
        match self {
            Self::DissolvedOxygen { saturation } => decay_rate * (c - saturation),
            Self::Tracer => decay_rate * c,
            _ => 0.0,
        }
    }

    /// 湿节点上的自身源项 [单位/s]
    #[inline]
    pub fn source(&self, c: f64, depth: f64, velocity: DVec2) -> f64 {
        match self {
            Self::SuspendedSediment(model) => model.exchange(c, depth, velocity),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Species::Salinity.bounds(), (0.0, 360.0));
        assert_eq!(Species::Tracer.bounds().1, f64::INFINITY);
    }

    #[test]
    fn test_reaction_terms() {
        assert_eq!(Species::Salinity.reaction(30.0, 0.1), 0.0);
        assert!((Species::Tracer.reaction(2.0, 0.1) - 0.2).abs() < 1e-12);
        let oxygen = Species::DissolvedOxygen { saturation: 8.0 };
        // 欠饱和时复氧（负反应项使浓度增大）
        assert!(oxygen.reaction(6.0, 0.1) < 0.0);
        assert!(oxygen.reaction(9.0, 0.1) > 0.0);
    }

    #[test]
    fn test_sediment_source_relaxes_to_equilibrium() {
        let species = Species::from_config(&SpeciesConfig::SuspendedSediment(SedimentConfig::default()));
        let v = DVec2::new(1.2, 0.0);
        let model = match &species {
            Species::SuspendedSediment(m) => m.clone(),
            _ => unreachable!(),
        };
        let c_eq = model.equilibrium_concentration(2.0, v);
        assert!(c_eq > 0.0);
        assert!(species.source(0.0, 2.0, v) > 0.0);
        assert!(species.source(2.0 * c_eq, 2.0, v) < 0.0);
        assert_eq!(species.name(), "suspended_sediment");
    }

    #[test]
    fn test_from_config() {
        let s = Species::from_config(&SpeciesConfig::DissolvedOxygen { saturation: 9.0 });
        assert!(matches!(s, Species::DissolvedOxygen { saturation } if saturation == 9.0));
    }
}

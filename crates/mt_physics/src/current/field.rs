// crates/mt_physics/src/current/field.rs

//! 流场数据（SoA 布局）
//!
//! 节点量由流场提供者写入；单元平均流速、干单元标记、单元尺寸
//! 以及干湿权重由 [`CurrentField::refresh_derived`] 统一计算。

use crate::current::wetting::WettingDrying;
use glam::DVec2;
use mt_foundation::{MtError, MtResult};
use mt_mesh::TriMesh;

/// 节点的水动力约束
///
/// 水动力模型在该节点施加的边界条件。带有任一约束的节点为水动力边界节点。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydroConstraint {
    /// x 方向流速给定（闭边界为零）
    pub u_fixed: bool,
    /// y 方向流速给定
    pub v_fixed: bool,
    /// 水位给定（开边界）
    pub water_level_fixed: bool,
}

impl HydroConstraint {
    /// 无约束（内部节点）
    pub const FREE: Self = Self {
        u_fixed: false,
        v_fixed: false,
        water_level_fixed: false,
    };

    /// 闭边界：两个流速分量均固定为零
    pub const CLOSED: Self = Self {
        u_fixed: true,
        v_fixed: true,
        water_level_fixed: false,
    };

    /// 开边界：水位给定
    pub const OPEN: Self = Self {
        u_fixed: false,
        v_fixed: false,
        water_level_fixed: true,
    };

    /// 是否为水动力边界节点：两个流速分量均固定的闭边界，或水位开边界
    #[inline]
    pub fn is_boundary(&self) -> bool {
        (self.u_fixed && self.v_fixed) || self.water_level_fixed
    }
}

/// 流场
#[derive(Debug, Clone)]
pub struct CurrentField {
    // ===== 节点 =====
    /// 流速 [m/s]
    pub velocity: Vec<DVec2>,
    /// 总水深 [m]
    pub depth: Vec<f64>,
    /// 湍流弥散系数 (x, y) [m²/s]
    pub dispersion: Vec<DVec2>,
    /// 水动力约束
    pub constraint: Vec<HydroConstraint>,
    /// 干湿权重（派生）
    pub wet_weight: Vec<f64>,

    // ===== 单元（派生） =====
    /// 单元平均流速
    pub element_velocity: Vec<DVec2>,
    /// 干单元标记：三个节点都干
    pub element_dry: Vec<bool>,
    /// 单元特征尺寸
    pub element_size: Vec<f64>,
}

impl CurrentField {
    /// 创建静水、无约束的流场
    pub fn new(n_nodes: usize, n_elements: usize) -> Self {
        Self {
            velocity: vec![DVec2::ZERO; n_nodes],
            depth: vec![0.0; n_nodes],
            dispersion: vec![DVec2::ZERO; n_nodes],
            constraint: vec![HydroConstraint::FREE; n_nodes],
            wet_weight: vec![0.0; n_nodes],
            element_velocity: vec![DVec2::ZERO; n_elements],
            element_dry: vec![true; n_elements],
            element_size: vec![0.0; n_elements],
        }
    }

    /// 按网格尺寸创建
    pub fn for_mesh(mesh: &TriMesh) -> Self {
        Self::new(mesh.n_nodes(), mesh.n_elements())
    }

    /// 节点数
    pub fn n_nodes(&self) -> usize {
        self.depth.len()
    }

    /// 单元数
    pub fn n_elements(&self) -> usize {
        self.element_dry.len()
    }

    /// 检查尺寸与网格一致
    pub fn check_mesh(&self, mesh: &TriMesh) -> MtResult<()> {
        MtError::check_size("current velocity", mesh.n_nodes(), self.velocity.len())?;
        MtError::check_size("current depth", mesh.n_nodes(), self.depth.len())?;
        MtError::check_size("current dispersion", mesh.n_nodes(), self.dispersion.len())?;
        MtError::check_size("current constraint", mesh.n_nodes(), self.constraint.len())?;
        MtError::check_size("current elements", mesh.n_elements(), self.element_dry.len())?;
        Ok(())
    }

    /// 重新计算干湿权重与单元量
    pub fn refresh_derived(&mut self, mesh: &TriMesh, wetting: &WettingDrying) {
        self.wet_weight.clear();
        self.wet_weight
            .extend(self.depth.iter().map(|&h| wetting.wet_weight(h)));

        for e in 0..mesh.n_elements() {
            let nodes = mesh.element_nodes(e);
            let sum = nodes.iter().fold(DVec2::ZERO, |acc, &n| acc + self.velocity[n]);
            self.element_velocity[e] = sum / 3.0;
            self.element_dry[e] = nodes.iter().all(|&n| !wetting.is_wet(self.depth[n]));
            self.element_size[e] = mesh.element_size(e);
        }
    }

    /// 湿节点数
    pub fn n_wet(&self, wetting: &WettingDrying) -> usize {
        self.depth.iter().filter(|&&h| wetting.is_wet(h)).count()
    }
}

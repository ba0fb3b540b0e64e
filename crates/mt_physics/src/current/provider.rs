// crates/mt_physics/src/current/provider.rs

//! 流场提供者
//!
//! 浅水方程求解器在本项目之外；这里只定义每步填写流场的接口，
//! 并给出均匀流和静态数组两种实现。

use crate::current::field::{CurrentField, HydroConstraint};
use glam::DVec2;
use mt_foundation::{MtError, MtResult};
use mt_mesh::TriMesh;

/// 流场提供者
pub trait CurrentProvider: Send {
    /// 名称
    fn name(&self) -> &'static str;

    /// 写入时刻 `time` 的节点流速、水深、弥散与约束
    fn update(&mut self, time: f64, mesh: &TriMesh, field: &mut CurrentField) -> MtResult<()>;
}

// ============================================================
// 均匀流
// ============================================================

/// 均匀流：恒定流速、水平水面、恒定弥散
#[derive(Debug, Clone)]
pub struct UniformCurrent {
    velocity: DVec2,
    water_level: f64,
    dispersion: f64,
    open_boundaries: bool,
}

impl UniformCurrent {
    /// 创建均匀流
    pub fn new(velocity: DVec2, water_level: f64) -> Self {
        Self {
            velocity,
            water_level,
            dispersion: 0.0,
            open_boundaries: false,
        }
    }

    /// 湍流弥散系数（两方向相同）
    pub fn with_dispersion(mut self, k: f64) -> Self {
        self.dispersion = k;
        self
    }

    /// 网格边界节点标记为水位开边界
    pub fn with_open_boundaries(mut self, open: bool) -> Self {
        self.open_boundaries = open;
        self
    }
}

impl CurrentProvider for UniformCurrent {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn update(&mut self, _time: f64, mesh: &TriMesh, field: &mut CurrentField) -> MtResult<()> {
        field.check_mesh(mesh)?;
        for n in 0..mesh.n_nodes() {
            let h = (self.water_level - mesh.node_z_bed(n)).max(0.0);
            field.depth[n] = h;
            field.velocity[n] = if h > 0.0 { self.velocity } else { DVec2::ZERO };
            field.dispersion[n] = DVec2::splat(self.dispersion);
            field.constraint[n] = if self.open_boundaries && mesh.is_boundary_node(n) {
                HydroConstraint::OPEN
            } else {
                HydroConstraint::FREE
            };
        }
        Ok(())
    }
}

// ============================================================
// 静态数组
// ============================================================

/// 静态流场：调用方给定的节点数组，整个模拟期间不变
#[derive(Debug, Clone)]
pub struct StaticCurrent {
    velocity: Vec<DVec2>,
    depth: Vec<f64>,
    dispersion: Vec<DVec2>,
    constraint: Vec<HydroConstraint>,
}

impl StaticCurrent {
    /// 创建静态流场，弥散为零、无约束
    pub fn new(velocity: Vec<DVec2>, depth: Vec<f64>) -> MtResult<Self> {
        MtError::check_size("static depth", velocity.len(), depth.len())?;
        let n = velocity.len();
        Ok(Self {
            velocity,
            depth,
            dispersion: vec![DVec2::ZERO; n],
            constraint: vec![HydroConstraint::FREE; n],
        })
    }

    /// 设置弥散系数
    pub fn with_dispersion(mut self, dispersion: Vec<DVec2>) -> MtResult<Self> {
        MtError::check_size("static dispersion", self.velocity.len(), dispersion.len())?;
        self.dispersion = dispersion;
        Ok(self)
    }

    /// 设置水动力约束
    pub fn with_constraints(mut self, constraint: Vec<HydroConstraint>) -> MtResult<Self> {
        MtError::check_size("static constraint", self.velocity.len(), constraint.len())?;
        self.constraint = constraint;
        Ok(self)
    }

    /// 修改单个节点流速
    pub fn set_velocity(&mut self, node: usize, v: DVec2) -> MtResult<()> {
        MtError::check_index("Node", node, self.velocity.len())?;
        self.velocity[node] = v;
        Ok(())
    }
}

impl CurrentProvider for StaticCurrent {
    fn name(&self) -> &'static str {
        "static"
    }

    fn update(&mut self, _time: f64, mesh: &TriMesh, field: &mut CurrentField) -> MtResult<()> {
        field.check_mesh(mesh)?;
        MtError::check_size("static current", mesh.n_nodes(), self.velocity.len())?;
        field.velocity.copy_from_slice(&self.velocity);
        field.depth.copy_from_slice(&self.depth);
        field.dispersion.copy_from_slice(&self.dispersion);
        field.constraint.copy_from_slice(&self.constraint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_mesh::RectMeshBuilder;

    #[test]
    fn test_uniform_depth_from_bed() {
        let mesh = RectMeshBuilder::new(2, 1, 2.0, 1.0)
            .with_bed_level(-1.0)
            .with_bed_slope(DVec2::new(0.75, 0.0))
            .build()
            .unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        let mut current = UniformCurrent::new(DVec2::new(0.2, 0.0), 0.0).with_dispersion(0.5);
        current.update(0.0, &mesh, &mut field).unwrap();

        // z = -1, -0.25, 0.5 → h = 1, 0.25, 0
        assert!((field.depth[0] - 1.0).abs() < 1e-12);
        assert!((field.depth[1] - 0.25).abs() < 1e-12);
        assert_eq!(field.depth[2], 0.0);
        assert_eq!(field.velocity[2], DVec2::ZERO);
        assert_eq!(field.dispersion[0], DVec2::splat(0.5));
    }

    #[test]
    fn test_uniform_open_boundaries() {
        let mesh = RectMeshBuilder::new(2, 2, 2.0, 2.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        let mut current = UniformCurrent::new(DVec2::X, 1.0).with_open_boundaries(true);
        current.update(0.0, &mesh, &mut field).unwrap();
        assert_eq!(field.constraint[0], HydroConstraint::OPEN);
        assert_eq!(field.constraint[4], HydroConstraint::FREE);
    }

    #[test]
    fn test_static_size_mismatch() {
        let mesh = RectMeshBuilder::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        let mut current = StaticCurrent::new(vec![DVec2::ZERO; 3], vec![1.0; 3]).unwrap();
        assert!(current.update(0.0, &mesh, &mut field).is_err());
        assert!(StaticCurrent::new(vec![DVec2::ZERO; 3], vec![1.0; 2]).is_err());
    }
}

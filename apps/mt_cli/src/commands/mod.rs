// apps/mt_cli/src/commands/mod.rs

//! 子命令及其共用的装配步骤

pub mod info;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use glam::DVec2;
use mt_config::{CurrentConfig, MeshConfig, TransportConfig};
use mt_mesh::{RectMeshBuilder, TriMesh};
use mt_physics::{BoundarySpec, UniformCurrent};

/// 按配置生成矩形网格
pub fn build_mesh(config: &MeshConfig) -> Result<TriMesh> {
    RectMeshBuilder::new(config.nx, config.ny, config.lx, config.ly)
        .with_bed_level(config.bed_level)
        .build()
        .context("网格生成失败")
}

/// 按配置生成均匀流场
pub fn build_current(config: &CurrentConfig) -> UniformCurrent {
    UniformCurrent::new(DVec2::new(config.u, config.v), config.water_level)
        .with_dispersion(config.dispersion)
        .with_open_boundaries(config.open_boundaries)
}

/// 读取边界条件文件（未配置时为空）
pub fn load_boundaries(config: &TransportConfig, n_nodes: usize) -> Result<Vec<BoundarySpec>> {
    let Some(path) = &config.boundary.file else {
        return Ok(Vec::new());
    };
    let mask = mt_io::parse_key_mask(&config.boundary.keys)?;
    let specs = mt_io::read_boundary_file(path, &mask, n_nodes)
        .with_context(|| format!("读取边界条件失败: {}", path.display()))?;
    Ok(specs)
}

/// 读取初始场（未配置文件时全场取缺省值）
pub fn load_initial_values(config: &TransportConfig, n_nodes: usize) -> Result<Vec<f64>> {
    match &config.initial.file {
        Some(path) => mt_io::load_initial(path, config.initial.format, n_nodes)
            .with_context(|| format!("读取初始场失败: {}", path.display())),
        None => Ok(vec![config.initial.default_value; n_nodes]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mt_physics::{CurrentField, CurrentProvider, HydroConstraint};

    #[test]
    fn test_current_open_boundaries_from_config() {
        let mut config = TransportConfig::default();
        config.mesh.nx = 3;
        config.mesh.ny = 2;
        let mesh = build_mesh(&config.mesh).unwrap();

        for open in [false, true] {
            config.current.open_boundaries = open;
            let mut field = CurrentField::for_mesh(&mesh);
            build_current(&config.current).update(0.0, &mesh, &mut field).unwrap();
            let n_open = field.constraint.iter().filter(|c| **c == HydroConstraint::OPEN).count();
            let expected = if open { mesh.boundary_nodes().len() } else { 0 };
            assert_eq!(n_open, expected);
        }
    }
}

// crates/mt_physics/src/transport/extrapolation.rs

//! 欠定边界节点的外推松弛
//!
//! 对每个湿的外推节点 i，遍历相邻单元中的另外两个节点 m，
//! 若 `h_m > h_i`，则
//!
//! ```text
//! C_i += f · min(h_i / h_m, 1) · (C_m - C_i)
//! ```
//!
//! m 本身也是外推节点时使用更小的系数，避免外推节点之间相互放大。
//! 每步执行一次，多步累积后收敛。邻点值取自本阶段开始时的快照，
//! 每个外推节点只写自身，结果与线程调度无关。

use crate::current::{CurrentField, WettingDrying};
use crate::transport::state::TransportState;
use mt_config::ExtrapolationConfig;
use mt_mesh::TriMesh;
use rayon::prelude::*;

/// 松弛系数
#[derive(Debug, Clone, Copy)]
pub struct ExtrapolationParams {
    /// 邻点为普通节点时的系数
    pub relaxation: f64,
    /// 邻点也是外推节点时的系数
    pub neighbor_relaxation: f64,
}

impl Default for ExtrapolationParams {
    fn default() -> Self {
        Self::from_config(&ExtrapolationConfig::default())
    }
}

impl ExtrapolationParams {
    /// 由配置创建
    pub fn from_config(config: &ExtrapolationConfig) -> Self {
        Self {
            relaxation: config.relaxation,
            neighbor_relaxation: config.extrapolated_neighbor_relaxation,
        }
    }
}

/// 对全部外推节点执行一次松弛，返回被修改的节点数
pub fn relax_extrapolated(
    state: &mut TransportState,
    mesh: &TriMesh,
    field: &CurrentField,
    wetting: &WettingDrying,
    params: &ExtrapolationParams,
) -> usize {
    let snapshot = state.values();
    let TransportState { dofs, bindings, .. } = state;
    let bindings = &*bindings;

    dofs.par_iter_mut()
        .enumerate()
        .filter(|(i, _)| bindings[*i].extrapolate)
        .map(|(i, dof)| {
            let h_i = field.depth[i];
            if !wetting.is_wet(h_i) {
                return 0;
            }

            let mut c = dof.c;
            let mut touched = false;
            for &e in mesh.node_elements(i) {
                for m in mesh.element_nodes(e) {
                    if m == i {
                        continue;
                    }
                    let h_m = field.depth[m];
                    if !(h_m > h_i) {
                        continue;
                    }
                    let f = if bindings[m].extrapolate {
                        params.neighbor_relaxation
                    } else {
                        params.relaxation
                    };
                    c += f * (h_i / h_m).min(1.0) * (snapshot[m] - c);
                    touched = true;
                }
            }
            dof.c = c;
            usize::from(touched)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use mt_mesh::RectMeshBuilder;

    #[test]
    fn test_no_wetter_neighbor_unchanged() {
        let mesh = RectMeshBuilder::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        field.depth = vec![1.0; 4];
        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        state.set_values(&[0.0, 5.0, 5.0, 5.0]).unwrap();
        state.bindings[0].extrapolate = true;

        let n = relax_extrapolated(&mut state, &mesh, &field, &WettingDrying::default(), &ExtrapolationParams::default());
        assert_eq!(n, 0);
        assert_eq!(state.value(0), 0.0);
    }

    #[test]
    fn test_relaxes_toward_wetter_neighbors() {
        let mesh = RectMeshBuilder::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        field.depth = vec![0.5, 1.0, 1.0, 1.0];
        field.velocity = vec![DVec2::ZERO; 4];
        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        state.set_values(&[0.0, 8.0, 8.0, 8.0]).unwrap();
        state.bindings[0].extrapolate = true;

        let params = ExtrapolationParams { relaxation: 0.1, neighbor_relaxation: 0.01 };
        relax_extrapolated(&mut state, &mesh, &field, &WettingDrying::default(), &params);
        let c = state.value(0);
        assert!(c > 0.0 && c < 8.0);
        // 邻点保持不变
        assert_eq!(state.value(1), 8.0);
    }

    #[test]
    fn test_dry_extrapolated_node_skipped() {
        let mesh = RectMeshBuilder::new(1, 1, 1.0, 1.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        field.depth = vec![0.001, 1.0, 1.0, 1.0];
        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        state.set_values(&[0.0, 8.0, 8.0, 8.0]).unwrap();
        state.bindings[0].extrapolate = true;
        relax_extrapolated(&mut state, &mesh, &field, &WettingDrying::default(), &ExtrapolationParams::default());
        assert_eq!(state.value(0), 0.0);
    }
}

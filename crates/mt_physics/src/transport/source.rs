// crates/mt_physics/src/transport/source.rs

//! 源汇与边界重施加
//!
//! 每步组装之前逐节点执行（节点间相互独立，并行），分两段，
//! 中间插入外推松弛：
//!
//! [`apply_boundaries`]
//! 1. 负值截断为零
//! 2. 给定浓度节点：`C = max(f(t), 0)`，`dC/dt = f'(t)`
//!
//! [`apply_sources`]
//! 3. 源汇项：
//!    - 湿节点且有点源：`Q(t) (C_src(t) - C) / (h M)`
//!    - 干节点：`-k_dry C`
//!    - 其余湿节点：物质自身源项（悬沙冲淤，守恒物质为 0）
//! 4. 残差累加器清零

use crate::current::{CurrentField, WettingDrying};
use crate::transport::species::Species;
use crate::transport::state::{DofBinding, DofState, TransportState};
use rayon::prelude::*;

/// 源汇阶段参数
#[derive(Debug, Clone, Copy)]
pub struct SourceParams {
    /// 干湿参数
    pub wetting: WettingDrying,
    /// 干节点衰减率 [1/s]
    pub dry_decay_rate: f64,
}

// ============================================================
// 截断与给定值
// ============================================================

#[inline]
fn impose_dof(dof: &mut DofState, binding: &DofBinding, time: f64) {
    if dof.c < 0.0 {
        dof.c = 0.0;
    }

    if let Some(f) = &binding.boundary {
        // NaN 经 max 也归零
        dof.c = f.value(time).max(0.0);
        dof.dcdt = f.derivative(time);
    }
}

/// 负值截断并重施加给定浓度
pub fn apply_boundaries(state: &mut TransportState, time: f64) {
    let TransportState { dofs, bindings, .. } = state;
    dofs.par_iter_mut()
        .zip(bindings.par_iter())
        .for_each(|(dof, binding)| impose_dof(dof, binding, time));
}

// ============================================================
// 源汇项
// ============================================================

/// 单节点源汇项
#[allow(clippy::too_many_arguments)]
#[inline]
fn source_term(
    c: f64,
    binding: &DofBinding,
    depth: f64,
    velocity: glam::DVec2,
    mass: f64,
    time: f64,
    species: &Species,
    params: &SourceParams,
) -> f64 {
    let wet = params.wetting.is_wet(depth);
    match &binding.point_source {
        Some(ps) if wet => {
            let q = ps.discharge.value(time);
            q * (ps.concentration_at(time) - c) / (depth * mass)
        }
        _ if !wet => -params.dry_decay_rate * c,
        _ => species.source(c, depth, velocity),
    }
}

/// 按当前浓度计算全部节点的源汇项，并清零残差
pub fn apply_sources(
    state: &mut TransportState,
    field: &CurrentField,
    species: &Species,
    params: &SourceParams,
    time: f64,
) {
    let TransportState {
        dofs,
        bindings,
        residual,
        lumped_mass,
    } = state;

    dofs.par_iter_mut()
        .zip(bindings.par_iter())
        .enumerate()
        .for_each(|(i, (dof, binding))| {
            dof.source_sink = source_term(
                dof.c,
                binding,
                field.depth[i],
                field.velocity[i],
                lumped_mass[i],
                time,
                species,
                params,
            );
        });

    residual.par_iter().for_each(|r| r.store(0.0));
}

// crates/mt_physics/src/transport/assembler.rs

//! 单元残差组装
//!
//! 对每个非干单元计算流线迎风（SUPG）稳定化的对流-扩散残差，
//! 并累加到单元三个节点的残差累加器中。
//!
//! # 单元计算
//!
//! ```text
//! ∇C = Σ C_k (b_k, c_k)          ∇h = Σ h_k (b_k, c_k)
//! D_k = (K_k + D_bg + D_num) · wλ_k
//! R_k = u_k·∇C - (D_kx h_x C_x + D_ky h_y C_y) / max(h_k, watt) + 反应项
//! R̄  = (1/3) Σ_{k 内部节点} wλ_k R_k
//! τ  = 0.5 · size / |ū|           (|ū| 低于阈值时 τ = 0)
//! s_j = -τ (b_j ū + c_j v̄) R̄ A   (s_j > 0 时乘 wλ_j)
//! r_j = s_j - Σ_l m_jl min(wλ_j, h_l/h_j) R_l - A (b_j D̄x C_x + c_j D̄y C_y)
//! ```
//!
//! 其中 `m_jj = A/6`、`m_jl = A/12`，D̄ 为单元三节点有效弥散的均值。
//! 每个单元返回候选稳定步长 τ（流速可忽略时为 +∞），调用方取最小值。
//!
//! # 组装策略
//!
//! - `Sequential`: 串行，按单元顺序累加
//! - `Atomic`: 单元并行，逐节点原子累加
//! - `Colored`: 按单元着色分组，同色单元不共享节点，组内并行、组间串行
//! - `CollectThenAccumulate`: 并行计算后按单元顺序串行累加，结果逐位可复现

use crate::current::CurrentField;
use crate::transport::species::Species;
use crate::transport::state::{DofClass, TransportState};
use glam::DVec2;
use mt_config::AssemblyStrategy;
use mt_mesh::{ElementColoring, TriMesh};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// 浓度梯度模长的正则化小量
const GRAD_EPS: f64 = 1e-12;

// ============================================================
// 参数
// ============================================================

/// 组装参数
#[derive(Debug, Clone, Copy)]
pub struct AssemblyParams {
    /// 背景弥散系数 [m²/s]
    pub dispersion: f64,
    /// 数值弥散系数（0 关闭）
    pub numerical_dispersion: f64,
    /// 衰减/反应速率 [1/s]
    pub decay_rate: f64,
    /// 稳定化流速阈值 [m/s]
    pub velocity_threshold: f64,
    /// 干湿阈值 [m]
    pub watt: f64,
}

impl Default for AssemblyParams {
    fn default() -> Self {
        Self {
            dispersion: 0.0,
            numerical_dispersion: 0.0,
            decay_rate: 0.0,
            velocity_threshold: 1e-5,
            watt: 0.01,
        }
    }
}

/// 单元对三个节点的残差贡献
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementResidual {
    /// 单元节点
    pub nodes: [usize; 3],
    /// 各节点残差
    pub residual: [f64; 3],
    /// 候选稳定步长
    pub stable_dt: f64,
}

// ============================================================
// 单元计算
// ============================================================

/// 计算单个单元的残差贡献，干单元返回 `None`
pub fn element_residual(
    e: usize,
    mesh: &TriMesh,
    field: &CurrentField,
    state: &TransportState,
    species: &Species,
    params: &AssemblyParams,
) -> Option<ElementResidual> {
    if field.element_dry[e] {
        return None;
    }

    let nodes = mesh.element_nodes(e);
    let shape = mesh.shape(e);
    let area = mesh.element_area(e);
    let size = field.element_size[e];
    let u_mean = field.element_velocity[e];

    let c = nodes.map(|n| state.dofs[n].c);
    let h = nodes.map(|n| field.depth[n]);
    let w = nodes.map(|n| field.wet_weight[n]);

    let grad_c = shape.gradient_of(c);
    let grad_h = shape.gradient_of(h);

    let d_num = if params.numerical_dispersion > 0.0 {
        params.numerical_dispersion * size * u_mean.dot(grad_c).abs() / (grad_c.length() + GRAD_EPS)
    } else {
        0.0
    };
    let isotropic = DVec2::splat(params.dispersion + d_num);

    // 节点残差
    let mut d = [DVec2::ZERO; 3];
    let mut r = [0.0; 3];
    for k in 0..3 {
        let n = nodes[k];
        d[k] = (field.dispersion[n] + isotropic) * w[k];
        let advective = field.velocity[n].dot(grad_c);
        let depth_correction = (d[k] * grad_h * grad_c).element_sum() / h[k].max(params.watt);
        r[k] = advective - depth_correction + species.reaction(c[k], params.decay_rate);
    }

    let r_mean = (0..3)
        .filter(|&k| state.bindings[nodes[k]].class() == DofClass::Interior)
        .map(|k| w[k] * r[k])
        .sum::<f64>()
        / 3.0;

    let speed = u_mean.length();
    let (tau, stable_dt) = if speed > params.velocity_threshold {
        let tau = 0.5 * size / speed;
        (tau, tau)
    } else {
        (0.0, f64::INFINITY)
    };

    let d_mean = (d[0] + d[1] + d[2]) / 3.0;
    let mut residual = [0.0; 3];
    for j in 0..3 {
        let grad_j = shape.grad(j);

        let mut supg = -tau * grad_j.dot(u_mean) * r_mean * area;
        if supg > 0.0 {
            supg *= w[j];
        }

        let galerkin: f64 = (0..3)
            .map(|l| {
                let (m, ratio) = if l == j {
                    (area / 6.0, 1.0)
                } else if h[j] > 0.0 {
                    (area / 12.0, h[l] / h[j])
                } else {
                    (area / 12.0, 0.0)
                };
                m * w[j].min(ratio) * r[l]
            })
            .sum();

        // 干节点不接收扩散通量
        let diffusive = w[j] * area * (grad_j * d_mean * grad_c).element_sum();

        residual[j] = supg - galerkin - diffusive;
    }

    Some(ElementResidual {
        nodes,
        residual,
        stable_dt,
    })
}

// ============================================================
// 性能指标
// ============================================================

/// 组装性能指标
#[derive(Debug, Clone, Default)]
pub struct AssemblyMetrics {
    /// 组装次数
    pub total_calls: usize,
    /// 累计处理单元数
    pub total_elements: usize,
    /// 累计耗时
    pub total_duration: Duration,
}

impl AssemblyMetrics {
    /// 记录一次组装
    pub fn record(&mut self, n_elements: usize, duration: Duration) {
        self.total_calls += 1;
        self.total_elements += n_elements;
        self.total_duration += duration;
    }

    /// 重置指标
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 平均每单元耗时
    pub fn avg_time_per_element(&self) -> Duration {
        match u32::try_from(self.total_elements) {
            Ok(n) if n > 0 => self.total_duration / n,
            _ => Duration::ZERO,
        }
    }
}

// ============================================================
// 组装器
// ============================================================

/// 单元残差组装器
#[derive(Debug, Clone)]
pub struct ElementAssembler {
    params: AssemblyParams,
    strategy: AssemblyStrategy,
    coloring: Option<ElementColoring>,
    metrics: AssemblyMetrics,
}

impl ElementAssembler {
    /// 创建组装器
    pub fn new(params: AssemblyParams, strategy: AssemblyStrategy) -> Self {
        Self {
            params,
            strategy,
            coloring: None,
            metrics: AssemblyMetrics::default(),
        }
    }

    /// 组装参数
    pub fn params(&self) -> &AssemblyParams {
        &self.params
    }

    /// 组装策略
    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
    }

    /// 性能指标
    pub fn metrics(&self) -> &AssemblyMetrics {
        &self.metrics
    }

    /// 预先计算单元着色（`Colored` 策略使用）
    pub fn setup_coloring(&mut self, mesh: &TriMesh) {
        let coloring = ElementColoring::from_mesh(mesh);
        log::debug!(
            "单元着色: {} 个单元, {} 种颜色",
            mesh.n_elements(),
            coloring.num_colors()
        );
        self.coloring = Some(coloring);
    }

    /// 颜色数量
    pub fn num_colors(&self) -> usize {
        self.coloring.as_ref().map_or(0, |c| c.num_colors())
    }

    /// 组装全部单元残差，返回最小候选稳定步长
    ///
    /// 调用前残差累加器须已清零。
    pub fn assemble(
        &mut self,
        mesh: &TriMesh,
        field: &CurrentField,
        state: &TransportState,
        species: &Species,
    ) -> f64 {
        let start = Instant::now();

        let stable_dt = match self.strategy {
            AssemblyStrategy::Sequential => self.assemble_sequential(mesh, field, state, species),
            AssemblyStrategy::Atomic => self.assemble_atomic(mesh, field, state, species),
            AssemblyStrategy::Colored => {
                if self.coloring.is_none() {
                    self.setup_coloring(mesh);
                }
                self.assemble_colored(mesh, field, state, species)
            }
            AssemblyStrategy::CollectThenAccumulate => {
                self.assemble_collected(mesh, field, state, species)
            }
        };

        self.metrics.record(mesh.n_elements(), start.elapsed());
        stable_dt
    }

    /// 串行组装
    fn assemble_sequential(
        &self,
        mesh: &TriMesh,
        field: &CurrentField,
        state: &TransportState,
        species: &Species,
    ) -> f64 {
        let mut stable_dt = f64::INFINITY;
        for e in 0..mesh.n_elements() {
            if let Some(er) = element_residual(e, mesh, field, state, species, &self.params) {
                scatter(state, &er);
                stable_dt = stable_dt.min(er.stable_dt);
            }
        }
        stable_dt
    }

    /// 单元并行，原子累加
    fn assemble_atomic(
        &self,
        mesh: &TriMesh,
        field: &CurrentField,
        state: &TransportState,
        species: &Species,
    ) -> f64 {
        (0..mesh.n_elements())
            .into_par_iter()
            .filter_map(|e| element_residual(e, mesh, field, state, species, &self.params))
            .map(|er| {
                scatter(state, &er);
                er.stable_dt
            })
            .reduce(|| f64::INFINITY, f64::min)
    }

    /// 着色并行：同色单元互不共享节点
    fn assemble_colored(
        &self,
        mesh: &TriMesh,
        field: &CurrentField,
        state: &TransportState,
        species: &Species,
    ) -> f64 {
        let Some(coloring) = &self.coloring else {
            return self.assemble_atomic(mesh, field, state, species);
        };

        let mut stable_dt = f64::INFINITY;
        for color in 0..coloring.num_colors() {
            let color_dt = coloring
                .elements_with_color(color)
                .par_iter()
                .filter_map(|&e| element_residual(e, mesh, field, state, species, &self.params))
                .map(|er| {
                    for (k, &n) in er.nodes.iter().enumerate() {
                        state.accumulate_exclusive(n, er.residual[k]);
                    }
                    er.stable_dt
                })
                .reduce(|| f64::INFINITY, f64::min);
            stable_dt = stable_dt.min(color_dt);
        }
        stable_dt
    }

    /// 并行计算，按单元顺序串行累加
    fn assemble_collected(
        &self,
        mesh: &TriMesh,
        field: &CurrentField,
        state: &TransportState,
        species: &Species,
    ) -> f64 {
        let results: Vec<Option<ElementResidual>> = (0..mesh.n_elements())
            .into_par_iter()
            .map(|e| element_residual(e, mesh, field, state, species, &self.params))
            .collect();

        results
            .iter()
            .flatten()
            .fold(f64::INFINITY, |dt, er| {
                scatter(state, er);
                dt.min(er.stable_dt)
            })
    }
}

#[inline]
fn scatter(state: &TransportState, er: &ElementResidual) {
    for (k, &n) in er.nodes.iter().enumerate() {
        state.add_residual(n, er.residual[k]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::current::WettingDrying;
    use mt_mesh::RectMeshBuilder;

    fn setup(velocity: DVec2, values: &[f64]) -> (TriMesh, CurrentField, TransportState) {
        let mesh = RectMeshBuilder::new(2, 2, 2.0, 2.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        field.velocity = vec![velocity; mesh.n_nodes()];
        field.depth = vec![1.0; mesh.n_nodes()];
        field.refresh_derived(&mesh, &WettingDrying::default());
        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        state.set_values(values).unwrap();
        (mesh, field, state)
    }

    fn ramp(mesh: &TriMesh) -> Vec<f64> {
        (0..mesh.n_nodes()).map(|n| 1.0 + mesh.node_xy(n).x).collect()
    }

    #[test]
    fn test_uniform_field_has_zero_residual() {
        let (mesh, field, state) = setup(DVec2::new(0.5, 0.2), &[3.0; 9]);
        for e in 0..mesh.n_elements() {
            let er = element_residual(e, &mesh, &field, &state, &Species::Salinity, &AssemblyParams::default()).unwrap();
            assert!(er.residual.iter().all(|r| r.abs() < 1e-14));
        }
    }

    #[test]
    fn test_dry_element_contributes_nothing() {
        let (mesh, mut field, state) = setup(DVec2::X, &[1.0; 9]);
        field.depth = vec![0.0; mesh.n_nodes()];
        field.refresh_derived(&mesh, &WettingDrying::default());
        assert!(element_residual(0, &mesh, &field, &state, &Species::Salinity, &AssemblyParams::default()).is_none());
    }

    #[test]
    fn test_dry_node_receives_no_diffusive_flux() {
        let mesh = TriMesh::new(
            vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)],
            vec![0.0; 3],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        field.velocity = vec![DVec2::ZERO; 3];
        field.depth = vec![0.005, 1.0, 1.0];
        field.dispersion = vec![DVec2::ONE; 3];
        field.refresh_derived(&mesh, &WettingDrying { watt: 0.01, transition: 0.0 });
        assert_eq!(field.wet_weight[0], 0.0);

        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        state.set_values(&[0.0, 10.0, 10.0]).unwrap();
        let er = element_residual(0, &mesh, &field, &state, &Species::Salinity, &AssemblyParams::default()).unwrap();

        assert_eq!(er.residual[0], 0.0);
        // 湿节点之间仍有扩散
        assert!(er.residual[1] < 0.0 && er.residual[2] < 0.0);
    }

    #[test]
    fn test_stable_dt_from_tau() {
        let (mesh, field, state) = setup(DVec2::new(0.5, 0.0), &[1.0; 9]);
        let er = element_residual(0, &mesh, &field, &state, &Species::Salinity, &AssemblyParams::default()).unwrap();
        let expected = 0.5 * mesh.element_size(0) / 0.5;
        assert!((er.stable_dt - expected).abs() < 1e-12);

        let (mesh, field, state) = setup(DVec2::ZERO, &[1.0; 9]);
        let er = element_residual(0, &mesh, &field, &state, &Species::Salinity, &AssemblyParams::default()).unwrap();
        assert_eq!(er.stable_dt, f64::INFINITY);
    }

    #[test]
    fn test_pure_diffusion_conserves_residual_sum() {
        let mut values = vec![0.0; 9];
        values[4] = 10.0;
        let (mesh, mut field, state) = setup(DVec2::ZERO, &values);
        field.dispersion = vec![DVec2::splat(0.3); mesh.n_nodes()];
        let mut asm = ElementAssembler::new(AssemblyParams::default(), AssemblyStrategy::Sequential);
        asm.assemble(&mesh, &field, &state, &Species::Salinity);

        let total: f64 = (0..9).map(|i| state.residual(i)).sum();
        assert!(total.abs() < 1e-12);
        // 峰值节点减小
        assert!(state.residual(4) < 0.0);
    }

    #[test]
    fn test_advection_residual_sign() {
        let (mesh, field, state) = setup(DVec2::new(1.0, 0.0), &[0.0; 9]);
        let values = ramp(&mesh);
        let mut state = state;
        state.set_values(&values).unwrap();
        let mut asm = ElementAssembler::new(AssemblyParams::default(), AssemblyStrategy::Sequential);
        asm.assemble(&mesh, &field, &state, &Species::Salinity);
        // C 沿 x 增大，流向 +x，内部节点浓度下降
        assert!(state.residual(4) < 0.0);
    }

    #[test]
    fn test_strategies_agree() {
        let (mesh, mut field, base) = setup(DVec2::new(0.3, -0.1), &[0.0; 9]);
        field.dispersion = vec![DVec2::splat(0.05); mesh.n_nodes()];
        let values: Vec<f64> = (0..9).map(|i| (i * i % 7) as f64).collect();

        let mut reference: Option<(Vec<f64>, f64)> = None;
        for strategy in [
            AssemblyStrategy::Sequential,
            AssemblyStrategy::Atomic,
            AssemblyStrategy::Colored,
            AssemblyStrategy::CollectThenAccumulate,
        ] {
            let mut state = base.clone();
            state.set_values(&values).unwrap();
            state.reset_residuals();
            let mut asm = ElementAssembler::new(AssemblyParams::default(), strategy);
            let dt = asm.assemble(&mesh, &field, &state, &Species::Salinity);
            let res: Vec<f64> = (0..9).map(|i| state.residual(i)).collect();
            match &reference {
                None => reference = Some((res, dt)),
                Some((r0, dt0)) => {
                    assert_eq!(dt, *dt0, "{:?}", strategy);
                    for (a, b) in res.iter().zip(r0) {
                        assert!((a - b).abs() < 1e-12, "{:?}", strategy);
                    }
                }
            }
            assert_eq!(asm.metrics().total_calls, 1);
        }
    }
}

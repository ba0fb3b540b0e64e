// crates/mt_physics/src/transport/model.rs

//! 输运模型
//!
//! 把节点状态、边界绑定、源汇阶段、单元组装器和积分器组合在一起。
//! 模型独占 [`TransportState`]，对网格和流场只读。
//!
//! 每步调用顺序固定：
//!
//! ```text
//! prepare(t)   源汇/边界重施加 + 外推松弛
//! assemble()   单元残差组装，返回最小候选稳定步长
//! integrate()  两步积分，返回失稳节点
//! ```
//!
//! 三个阶段都在模型自带的线程池内并行执行。

use crate::current::{CurrentField, WettingDrying};
use crate::engine::parallel::build_thread_pool;
use crate::transport::assembler::{AssemblyMetrics, AssemblyParams, ElementAssembler};
use crate::transport::boundary::{resolve_boundaries, BoundarySpec, ResolveReport};
use crate::transport::extrapolation::{relax_extrapolated, ExtrapolationParams};
use crate::transport::integrator::Ab2Integrator;
use crate::transport::source::{apply_boundaries, apply_sources, SourceParams};
use crate::transport::species::Species;
use crate::transport::state::TransportState;
use mt_config::{AssemblyStrategy, ResultField, TransportConfig};
use mt_foundation::{MtError, MtResult};
use mt_mesh::TriMesh;
use rayon::ThreadPool;

/// 模型参数
#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    /// 组装参数
    pub assembly: AssemblyParams,
    /// 干湿参数
    pub wetting: WettingDrying,
    /// 干节点衰减率 [1/s]
    pub dry_decay_rate: f64,
    /// 外推松弛系数
    pub extrapolation: ExtrapolationParams,
    /// 组装策略
    pub strategy: AssemblyStrategy,
    /// 工作线程数（0 为 rayon 默认）
    pub num_threads: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}

impl TransportSettings {
    /// 由配置创建
    pub fn from_config(config: &TransportConfig) -> Self {
        let wetting = WettingDrying::from_config(&config.wetting);
        Self {
            assembly: AssemblyParams {
                dispersion: config.physics.dispersion,
                numerical_dispersion: config.physics.numerical_dispersion,
                decay_rate: config.physics.decay_rate,
                velocity_threshold: config.physics.velocity_threshold,
                watt: wetting.watt,
            },
            wetting,
            dry_decay_rate: config.wetting.dry_decay_rate,
            extrapolation: ExtrapolationParams::from_config(&config.extrapolation),
            strategy: config.parallel.strategy,
            num_threads: config.parallel.num_threads,
        }
    }

    /// 设置背景弥散
    pub fn with_dispersion(mut self, dispersion: f64) -> Self {
        self.assembly.dispersion = dispersion;
        self
    }

    /// 设置组装策略
    pub fn with_strategy(mut self, strategy: AssemblyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// 设置线程数
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }
}

/// 输运模型
pub struct TransportModel {
    species: Species,
    settings: TransportSettings,
    state: TransportState,
    assembler: ElementAssembler,
    integrator: Ab2Integrator,
    report: ResolveReport,
    unmatched: Vec<BoundarySpec>,
    pool: ThreadPool,
}

impl TransportModel {
    /// 在网格上创建模型并解析边界条件
    ///
    /// `field` 须已由流场提供者写入水动力约束，外推节点据此确定。
    /// 未匹配的边界条件记录警告后保留，可由 [`Self::unmatched_boundaries`] 取得。
    pub fn new(
        mesh: &TriMesh,
        field: &CurrentField,
        settings: TransportSettings,
        species: Species,
        boundaries: Vec<BoundarySpec>,
    ) -> MtResult<Self> {
        field.check_mesh(mesh)?;

        let mut state = TransportState::new(mesh.lumped_masses().to_vec());
        let mut pending = boundaries;
        let report = resolve_boundaries(&mut state.bindings, &mut pending, &field.constraint);
        for spec in &pending {
            log::warn!("边界条件未匹配: {} 节点 {}", spec.kind, spec.node);
        }

        let mut assembler = ElementAssembler::new(settings.assembly, settings.strategy);
        if settings.strategy == AssemblyStrategy::Colored {
            assembler.setup_coloring(mesh);
        }

        let pool = build_thread_pool(settings.num_threads)?;

        log::info!(
            "输运模型 [{}]: {} 节点 ({} 给定, {} 外推, {} 点源), {} 单元, {} 线程",
            species.name(),
            mesh.n_nodes(),
            report.prescribed,
            report.extrapolated,
            report.point_sources,
            mesh.n_elements(),
            pool.current_num_threads()
        );

        Ok(Self {
            species,
            settings,
            state,
            assembler,
            integrator: Ab2Integrator::new(),
            report,
            unmatched: pending,
            pool,
        })
    }

    /// 输运物质
    pub fn species(&self) -> &Species {
        &self.species
    }

    /// 模型参数
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// 节点状态
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// 积分器
    pub fn integrator(&self) -> &Ab2Integrator {
        &self.integrator
    }

    /// 边界解析统计
    pub fn resolve_report(&self) -> ResolveReport {
        self.report
    }

    /// 未匹配的边界条件
    pub fn unmatched_boundaries(&self) -> &[BoundarySpec] {
        &self.unmatched
    }

    /// 组装性能指标
    pub fn assembly_metrics(&self) -> &AssemblyMetrics {
        self.assembler.metrics()
    }

    /// 工作线程数
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// 设置初值（全部校验通过才写入）
    pub fn set_initial(&mut self, values: &[f64]) -> MtResult<()> {
        self.state.set_values(values)
    }

    /// 截断与边界重施加，外推松弛，再按松弛后的浓度计算源汇项
    pub fn prepare(&mut self, time: f64, mesh: &TriMesh, field: &CurrentField) {
        let Self {
            species,
            settings,
            state,
            pool,
            ..
        } = self;
        let source = SourceParams {
            wetting: settings.wetting,
            dry_decay_rate: settings.dry_decay_rate,
        };
        pool.install(|| {
            apply_boundaries(state, time);
            relax_extrapolated(state, mesh, field, &settings.wetting, &settings.extrapolation);
            apply_sources(state, field, species, &source, time);
        });
    }

    /// 单元组装，返回最小候选稳定步长
    pub fn assemble(&mut self, mesh: &TriMesh, field: &CurrentField) -> f64 {
        let Self {
            species,
            state,
            assembler,
            pool,
            ..
        } = self;
        pool.install(|| assembler.assemble(mesh, field, state, species))
    }

    /// 积分一步，失败时返回首个失稳节点
    pub fn integrate(&mut self, dt: f64) -> Result<(), usize> {
        let bounds = self.species.bounds();
        let Self {
            state,
            integrator,
            pool,
            ..
        } = self;
        pool.install(|| integrator.integrate(state, dt, bounds))
    }

    /// 输出量
    pub fn output(&self, field: ResultField) -> Vec<f64> {
        match field {
            ResultField::Concentration => self.state.values(),
            ResultField::RateOfChange => self.state.rates(),
        }
    }

    /// 总量 `Σ C·M`
    pub fn total_mass(&self) -> f64 {
        self.state.total_mass()
    }

    /// 节点推移质输沙率，仅悬沙模型有值
    pub fn bedload(&self, field: &CurrentField) -> MtResult<Option<Vec<f64>>> {
        let Species::SuspendedSediment(model) = &self.species else {
            return Ok(None);
        };
        MtError::check_size("bedload field", self.state.len(), field.n_nodes())?;
        Ok(Some(
            field
                .depth
                .iter()
                .zip(&field.velocity)
                .map(|(&h, &v)| model.bedload(h, v))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::current::{CurrentProvider, HydroConstraint, UniformCurrent};
    use crate::transport::boundary::BoundaryKind;
    use glam::DVec2;
    use mt_config::{SedimentConfig, SpeciesConfig};
    use mt_mesh::RectMeshBuilder;

    fn fixture(open: bool) -> (TriMesh, CurrentField) {
        let mesh = RectMeshBuilder::new(3, 2, 3.0, 2.0).with_bed_level(-1.0).build().unwrap();
        let mut field = CurrentField::for_mesh(&mesh);
        UniformCurrent::new(DVec2::new(0.1, 0.0), 0.0)
            .with_open_boundaries(open)
            .update(0.0, &mesh, &mut field)
            .unwrap();
        field.refresh_derived(&mesh, &WettingDrying::default());
        (mesh, field)
    }

    #[test]
    fn test_construction_classifies_nodes() {
        let (mesh, field) = fixture(true);
        let specs = vec![
            BoundarySpec::constant(BoundaryKind::Concentration, 0, 30.0),
            BoundarySpec::constant(BoundaryKind::Concentration, 99, 30.0),
        ];
        let settings = TransportSettings::default().with_num_threads(1);
        let model = TransportModel::new(&mesh, &field, settings, Species::Salinity, specs).unwrap();

        let n_boundary = mesh.boundary_nodes().len();
        let (p, e, i) = model.state().class_counts();
        assert_eq!(p, 1);
        assert_eq!(e, n_boundary - 1);
        assert_eq!(i, mesh.n_nodes() - n_boundary);
        assert_eq!(model.unmatched_boundaries().len(), 1);
        assert_eq!(model.num_threads(), 1);
        assert!(field.constraint.iter().any(|c| *c == HydroConstraint::OPEN));
    }

    #[test]
    fn test_prepare_applies_boundary() {
        let (mesh, field) = fixture(false);
        let specs = vec![BoundarySpec::constant(BoundaryKind::Concentration, 2, 12.0)];
        let mut model =
            TransportModel::new(&mesh, &field, TransportSettings::default(), Species::Salinity, specs).unwrap();
        model.prepare(0.0, &mesh, &field);
        assert_eq!(model.state().value(2), 12.0);
        assert_eq!(model.output(ResultField::Concentration)[2], 12.0);
    }

    #[test]
    fn test_full_step_cycle() {
        let (mesh, field) = fixture(false);
        let specs = vec![BoundarySpec::constant(BoundaryKind::Concentration, 0, 10.0)];
        let settings = TransportSettings::default().with_strategy(AssemblyStrategy::Colored);
        let mut model = TransportModel::new(&mesh, &field, settings, Species::Salinity, specs).unwrap();

        for _ in 0..5 {
            model.prepare(0.0, &mesh, &field);
            let stable = model.assemble(&mesh, &field);
            assert!(stable.is_finite() && stable > 0.0);
            model.integrate(0.5).unwrap();
        }
        assert!(model.state().values().iter().all(|&c| (0.0..=10.0).contains(&c)));
        assert_eq!(model.integrator().previous_dt(), 0.5);
        assert_eq!(model.assembly_metrics().total_calls, 5);
    }

    #[test]
    fn test_bedload_only_for_sediment() {
        let (mesh, field) = fixture(false);
        let model =
            TransportModel::new(&mesh, &field, TransportSettings::default(), Species::Tracer, Vec::new()).unwrap();
        assert!(model.bedload(&field).unwrap().is_none());

        let species = Species::from_config(&SpeciesConfig::SuspendedSediment(SedimentConfig::default()));
        let model = TransportModel::new(&mesh, &field, TransportSettings::default(), species, Vec::new()).unwrap();
        let qb = model.bedload(&field).unwrap().unwrap();
        assert_eq!(qb.len(), mesh.n_nodes());
        assert!(qb.iter().all(|&q| q >= 0.0));
    }

    #[test]
    fn test_initial_values_validated() {
        let (mesh, field) = fixture(false);
        let mut model =
            TransportModel::new(&mesh, &field, TransportSettings::default(), Species::Salinity, Vec::new()).unwrap();
        assert!(model.set_initial(&[1.0; 3]).is_err());
        model.set_initial(&vec![2.0; mesh.n_nodes()]).unwrap();
        assert!((model.total_mass() - 2.0 * mesh.total_area()).abs() < 1e-9);
    }

    #[test]
    fn test_point_source_sees_relaxed_value() {
        let (mesh, mut field) = fixture(true);
        // 节点 0 为外推角点，邻点更深
        field.depth = vec![2.0; mesh.n_nodes()];
        field.depth[0] = 1.0;
        let mut specs = vec![BoundarySpec::constant(BoundaryKind::PointSource, 0, 1.0)];
        specs.push(BoundarySpec::constant(BoundaryKind::SourceConcentration, 0, 0.0));
        let settings = TransportSettings::default().with_num_threads(1);
        let mut model = TransportModel::new(&mesh, &field, settings, Species::Salinity, specs).unwrap();

        let mut initial = vec![10.0; mesh.n_nodes()];
        initial[0] = 0.0;
        model.set_initial(&initial).unwrap();
        model.prepare(0.0, &mesh, &field);

        let c0 = model.state().value(0);
        assert!(c0 > 0.0, "外推松弛应先于源汇");
        let m0 = mesh.lumped_masses()[0];
        let expected = 1.0 * (0.0 - c0) / (1.0 * m0);
        assert!((model.state().dof(0).source_sink - expected).abs() < 1e-12);
    }
}

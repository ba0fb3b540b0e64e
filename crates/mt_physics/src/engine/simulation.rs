// crates/mt_physics/src/engine/simulation.rs

//! 模拟驱动
//!
//! 单一模拟时钟按离散步推进。每步严格按序：
//!
//! 1. 流场提供者写入时刻 t 的流场，刷新干湿权重与单元量
//! 2. 源汇/边界重施加，外推松弛
//! 3. 单元组装
//! 4. 选择步长并积分
//! 5. 失稳检查；通过后 `t += dt`
//!
//! 失稳不可恢复：写出一条诊断记录（时间不推进，节点值为步前状态）后返回错误。
//!
//! ## 步长选择
//!
//! - 固定步长：使用 `dt`，超过单元稳定步长时记一次警告
//! - 自适应：`min(dt, cfl · 稳定步长)`
//! - 两者都截断到剩余时间

use crate::current::{CurrentField, CurrentProvider};
use crate::error::{TransportError, TransportResult};
use crate::transport::{BoundarySpec, Species, TransportModel, TransportSettings};
use mt_config::{ResultField, TimeConfig};
use mt_foundation::{MtError, MtResult};
use mt_mesh::TriMesh;

/// 剩余时间小于该值视为已到达结束时间
const TIME_EPS: f64 = 1e-9;

/// 结果输出接口
pub trait ResultSink {
    /// 写出一条记录：时间 + 每节点一个值
    fn write_record(&mut self, time: f64, values: &[f64]) -> MtResult<()>;
}

/// 内存结果（测试与嵌入使用）
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// 全部记录
    pub records: Vec<(f64, Vec<f64>)>,
}

impl ResultSink for MemorySink {
    fn write_record(&mut self, time: f64, values: &[f64]) -> MtResult<()> {
        self.records.push((time, values.to_vec()));
        Ok(())
    }
}

/// 时间控制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeControl {
    /// 步长（自适应时为上限）[s]
    pub dt: f64,
    /// 起始时间 [s]
    pub start: f64,
    /// 结束时间 [s]
    pub end: f64,
    /// 是否自适应
    pub adaptive: bool,
    /// 稳定步长安全系数
    pub cfl: f64,
}

impl TimeControl {
    /// 固定步长
    pub fn fixed(dt: f64, start: f64, end: f64) -> Self {
        Self {
            dt,
            start,
            end,
            adaptive: false,
            cfl: 0.9,
        }
    }

    /// 由配置创建
    pub fn from_config(config: &TimeConfig) -> Self {
        Self {
            dt: config.dt,
            start: config.start_time,
            end: config.end_time,
            adaptive: config.adaptive,
            cfl: config.cfl,
        }
    }

    /// 校验
    pub fn validate(&self) -> MtResult<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(MtError::invalid_config("time.dt", self.dt.to_string(), "步长必须为正"));
        }
        if !(self.end >= self.start) {
            return Err(MtError::invalid_config(
                "time.end_time",
                self.end.to_string(),
                "结束时间不能早于起始时间",
            ));
        }
        MtError::check_range("time.cfl", self.cfl, f64::MIN_POSITIVE, 1.0)
    }
}

/// 单步信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// 步序号（从 1 开始）
    pub step: usize,
    /// 步末时间
    pub time: f64,
    /// 实际步长
    pub dt: f64,
    /// 单元最小候选稳定步长
    pub stable_dt: f64,
}

/// 运行统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// 完成步数
    pub steps: usize,
    /// 写出记录数
    pub records: usize,
    /// 结束时间
    pub final_time: f64,
    /// 全程最小候选稳定步长
    pub min_stable_dt: f64,
    /// 最终总量 `Σ C·M`
    pub total_mass: f64,
}

/// 模拟驱动
pub struct Simulation {
    mesh: TriMesh,
    field: CurrentField,
    provider: Box<dyn CurrentProvider>,
    model: TransportModel,
    time_control: TimeControl,
    time: f64,
    step: usize,
    output_interval: usize,
    output_field: ResultField,
    stability_warned: bool,
}

impl Simulation {
    /// 创建模拟
    ///
    /// 先在起始时刻更新一次流场，再据其水动力约束构造输运模型。
    pub fn new(
        mesh: TriMesh,
        mut provider: Box<dyn CurrentProvider>,
        settings: TransportSettings,
        species: Species,
        boundaries: Vec<BoundarySpec>,
        time_control: TimeControl,
    ) -> MtResult<Self> {
        time_control.validate()?;

        let mut field = CurrentField::for_mesh(&mesh);
        provider.update(time_control.start, &mesh, &mut field)?;
        field.refresh_derived(&mesh, &settings.wetting);
        log::debug!(
            "流场 [{}]: {}/{} 湿节点",
            provider.name(),
            field.n_wet(&settings.wetting),
            mesh.n_nodes()
        );

        let model = TransportModel::new(&mesh, &field, settings, species, boundaries)?;

        Ok(Self {
            mesh,
            field,
            provider,
            model,
            time_control,
            time: time_control.start,
            step: 0,
            output_interval: 1,
            output_field: ResultField::Concentration,
            stability_warned: false,
        })
    }

    /// 设置输出间隔与输出量
    pub fn with_output(mut self, interval: usize, field: ResultField) -> Self {
        self.output_interval = interval.max(1);
        self.output_field = field;
        self
    }

    /// 设置初值
    pub fn set_initial(&mut self, values: &[f64]) -> MtResult<()> {
        self.model.set_initial(values)
    }

    /// 当前时间
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 已完成步数
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// 网格
    pub fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    /// 当前流场
    pub fn field(&self) -> &CurrentField {
        &self.field
    }

    /// 输运模型
    pub fn model(&self) -> &TransportModel {
        &self.model
    }

    /// 时间控制
    pub fn time_control(&self) -> &TimeControl {
        &self.time_control
    }

    /// 是否已到结束时间
    pub fn is_finished(&self) -> bool {
        self.time_control.end - self.time <= TIME_EPS
    }

    /// 当前输出量
    pub fn output_values(&self) -> Vec<f64> {
        self.model.output(self.output_field)
    }

    fn choose_dt(&mut self, stable_dt: f64) -> f64 {
        let tc = self.time_control;
        let dt = if tc.adaptive && stable_dt.is_finite() {
            tc.dt.min(tc.cfl * stable_dt)
        } else {
            if !tc.adaptive && tc.dt > stable_dt && !self.stability_warned {
                log::warn!(
                    "步长 {} s 超过单元稳定步长 {:.4e} s，结果可能振荡",
                    tc.dt,
                    stable_dt
                );
                self.stability_warned = true;
            }
            tc.dt
        };
        dt.min(tc.end - self.time)
    }

    /// 推进一步
    ///
    /// 失稳时返回 [`TransportError::NumericalInstability`]，时间与步数不变。
    pub fn step(&mut self) -> TransportResult<StepInfo> {
        self.provider.update(self.time, &self.mesh, &mut self.field)?;
        let wetting = self.model.settings().wetting;
        self.field.refresh_derived(&self.mesh, &wetting);

        self.model.prepare(self.time, &self.mesh, &self.field);
        let stable_dt = self.model.assemble(&self.mesh, &self.field);
        let dt = self.choose_dt(stable_dt);

        if let Err(dof) = self.model.integrate(dt) {
            return Err(TransportError::NumericalInstability {
                time: self.time,
                step: self.step + 1,
                dof,
            });
        }

        self.time += dt;
        self.step += 1;
        log::trace!("第{}步: t={:.3} s, dt={:.4} s", self.step, self.time, dt);

        Ok(StepInfo {
            step: self.step,
            time: self.time,
            dt,
            stable_dt,
        })
    }

    /// 运行到结束时间
    ///
    /// 每 `output_interval` 步写出一条记录，最后一步不在间隔上时补写一条。
    /// 失稳时写出一条诊断记录后返回错误。
    pub fn run(&mut self, sink: &mut dyn ResultSink) -> TransportResult<RunSummary> {
        let mut records = 0;
        let mut min_stable_dt = f64::INFINITY;
        let mut last_written = self.step;

        while !self.is_finished() {
            match self.step() {
                Ok(info) => {
                    min_stable_dt = min_stable_dt.min(info.stable_dt);
                    if info.step % self.output_interval == 0 {
                        sink.write_record(self.time, &self.output_values())?;
                        records += 1;
                        last_written = info.step;
                    }
                }
                Err(err) if err.is_instability() => {
                    log::error!("{}", err);
                    if let Err(write_err) = sink.write_record(self.time, &self.output_values()) {
                        log::error!("诊断记录写出失败: {}", write_err);
                    }
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }

        if last_written != self.step {
            sink.write_record(self.time, &self.output_values())?;
            records += 1;
        }

        let summary = RunSummary {
            steps: self.step,
            records,
            final_time: self.time,
            min_stable_dt,
            total_mass: self.model.total_mass(),
        };
        log::info!(
            "模拟完成: {} 步, t={:.3} s, {} 条记录, 总量 {:.6e}",
            summary.steps,
            summary.final_time,
            summary.records,
            summary.total_mass
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::current::UniformCurrent;
    use glam::DVec2;
    use mt_mesh::RectMeshBuilder;

    fn simulation(tc: TimeControl) -> Simulation {
        let mesh = RectMeshBuilder::new(4, 2, 4.0, 2.0).with_bed_level(-1.0).build().unwrap();
        let provider = Box::new(UniformCurrent::new(DVec2::new(0.2, 0.0), 0.0));
        Simulation::new(mesh, provider, TransportSettings::default(), Species::Tracer, Vec::new(), tc).unwrap()
    }

    #[test]
    fn test_time_control_validation() {
        assert!(TimeControl::fixed(1.0, 0.0, 10.0).validate().is_ok());
        assert!(TimeControl::fixed(0.0, 0.0, 10.0).validate().is_err());
        assert!(TimeControl::fixed(1.0, 5.0, 1.0).validate().is_err());
        let mut tc = TimeControl::fixed(1.0, 0.0, 1.0);
        tc.cfl = 1.5;
        assert!(tc.validate().is_err());
    }

    #[test]
    fn test_last_step_truncated_to_end() {
        let mut sim = simulation(TimeControl::fixed(0.4, 0.0, 1.0));
        let mut sink = MemorySink::default();
        let summary = sim.run(&mut sink).unwrap();
        assert_eq!(summary.steps, 3);
        assert!((summary.final_time - 1.0).abs() < 1e-12);
        assert_eq!(sink.records.len(), 3);
        assert!((sink.records[2].0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_interval_with_final_record() {
        let mut sim = simulation(TimeControl::fixed(0.1, 0.0, 0.5)).with_output(2, ResultField::RateOfChange);
        let mut sink = MemorySink::default();
        let summary = sim.run(&mut sink).unwrap();
        assert_eq!(summary.steps, 5);
        // 第 2、4 步 + 结束补写
        assert_eq!(summary.records, 3);
        assert_eq!(sink.records.len(), 3);
        assert_eq!(sink.records[0].1.len(), sim.mesh().n_nodes());
    }

    #[test]
    fn test_adaptive_dt_limited_by_stability() {
        let mut tc = TimeControl::fixed(100.0, 0.0, 100.0);
        tc.adaptive = true;
        tc.cfl = 0.5;
        let mut sim = simulation(tc);
        let info = sim.step().unwrap();
        assert!((info.dt - 0.5 * info.stable_dt).abs() < 1e-12);
        assert!(info.dt < 100.0);
    }

    #[test]
    fn test_zero_length_run() {
        let mut sim = simulation(TimeControl::fixed(1.0, 3.0, 3.0));
        let mut sink = MemorySink::default();
        let summary = sim.run(&mut sink).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.records, 0);
        assert_eq!(sim.time(), 3.0);
    }
}

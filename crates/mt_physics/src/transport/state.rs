// crates/mt_physics/src/transport/state.rs

//! 节点输运状态
//!
//! 每个自由度一条定长记录，模型构造时一次性分配，索引即节点号。
//!
//! - [`DofState`]: 每步变化的量（输运量、上一步变化率、源汇项）
//! - [`DofBinding`]: 构造时确定的边界绑定（给定函数、点源、外推标记）
//! - 残差累加器单独存放为 `AtomicF64`，单元并行散射时逐节点原子累加

use crate::forcing::TimeFunction;
use mt_foundation::{AtomicF64, MtError, MtResult};

/// 每步变化的节点量
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DofState {
    /// 输运量 C
    pub c: f64,
    /// 上一步变化率（两步格式使用）
    pub dcdt: f64,
    /// 源汇项 [单位/s]
    pub source_sink: f64,
}

/// 点源
#[derive(Debug, Clone)]
pub struct PointSource {
    /// 体积流量 Q(t) [m³/s]
    pub discharge: TimeFunction,
    /// 源浓度 C_src(t)，缺省为 0
    pub concentration: Option<TimeFunction>,
}

impl PointSource {
    /// 时刻 t 的源浓度
    #[inline]
    pub fn concentration_at(&self, t: f64) -> f64 {
        self.concentration.as_ref().map_or(0.0, |f| f.value(t))
    }
}

/// 节点边界绑定
#[derive(Debug, Clone, Default)]
pub struct DofBinding {
    /// 给定浓度函数
    pub boundary: Option<TimeFunction>,
    /// 点源
    pub point_source: Option<PointSource>,
    /// 是否由邻点外推
    pub extrapolate: bool,
}

/// 节点分类（初始化后三者恰有其一）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofClass {
    /// 给定浓度
    Prescribed,
    /// 外推
    Extrapolated,
    /// 内部
    Interior,
}

impl DofBinding {
    /// 节点分类
    #[inline]
    pub fn class(&self) -> DofClass {
        if self.boundary.is_some() {
            DofClass::Prescribed
        } else if self.extrapolate {
            DofClass::Extrapolated
        } else {
            DofClass::Interior
        }
    }

    /// 是否给定浓度
    #[inline]
    pub fn is_prescribed(&self) -> bool {
        self.boundary.is_some()
    }
}

/// 输运状态
#[derive(Debug, Clone)]
pub struct TransportState {
    pub(crate) dofs: Vec<DofState>,
    pub(crate) bindings: Vec<DofBinding>,
    pub(crate) residual: Vec<AtomicF64>,
    pub(crate) lumped_mass: Vec<f64>,
}

impl TransportState {
    /// 创建全零状态
    pub fn new(lumped_mass: Vec<f64>) -> Self {
        let n = lumped_mass.len();
        Self {
            dofs: vec![DofState::default(); n],
            bindings: vec![DofBinding::default(); n],
            residual: (0..n).map(|_| AtomicF64::new(0.0)).collect(),
            lumped_mass,
        }
    }

    /// 自由度数量
    #[inline]
    pub fn len(&self) -> usize {
        self.dofs.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    /// 节点记录
    #[inline]
    pub fn dof(&self, i: usize) -> &DofState {
        &self.dofs[i]
    }

    /// 节点绑定
    #[inline]
    pub fn binding(&self, i: usize) -> &DofBinding {
        &self.bindings[i]
    }

    /// 节点输运量
    #[inline]
    pub fn value(&self, i: usize) -> f64 {
        self.dofs[i].c
    }

    /// 集中质量
    #[inline]
    pub fn lumped_mass(&self, i: usize) -> f64 {
        self.lumped_mass[i]
    }

    /// 当前残差
    #[inline]
    pub fn residual(&self, i: usize) -> f64 {
        self.residual[i].load()
    }

    /// 向节点残差原子累加
    #[inline]
    pub fn add_residual(&self, i: usize, r: f64) {
        self.residual[i].fetch_add(r);
    }

    /// 无竞争累加：调用方保证同一时刻没有其他线程写节点 i
    #[inline]
    pub(crate) fn accumulate_exclusive(&self, i: usize, r: f64) {
        let slot = &self.residual[i];
        slot.store(slot.load() + r);
    }

    /// 全部输运量
    pub fn values(&self) -> Vec<f64> {
        self.dofs.iter().map(|d| d.c).collect()
    }

    /// 全部变化率
    pub fn rates(&self) -> Vec<f64> {
        self.dofs.iter().map(|d| d.dcdt).collect()
    }

    /// 设置初值
    pub fn set_values(&mut self, values: &[f64]) -> MtResult<()> {
        MtError::check_size("initial values", self.dofs.len(), values.len())?;
        if let Some(i) = values.iter().position(|&v| !(v >= 0.0) || !v.is_finite()) {
            return Err(MtError::invalid_input(format!("节点 {} 初值无效: {}", i, values[i])));
        }
        for (dof, &v) in self.dofs.iter_mut().zip(values) {
            dof.c = v;
        }
        Ok(())
    }

    /// 修改单个节点值
    pub fn set_value(&mut self, i: usize, v: f64) -> MtResult<()> {
        MtError::check_index("Node", i, self.dofs.len())?;
        self.dofs[i].c = v;
        Ok(())
    }

    /// 节点分类统计 `(给定, 外推, 内部)`
    pub fn class_counts(&self) -> (usize, usize, usize) {
        self.bindings.iter().fold((0, 0, 0), |(p, e, i), b| match b.class() {
            DofClass::Prescribed => (p + 1, e, i),
            DofClass::Extrapolated => (p, e + 1, i),
            DofClass::Interior => (p, e, i + 1),
        })
    }

    /// 总量 `Σ C·M`
    pub fn total_mass(&self) -> f64 {
        self.dofs
            .iter()
            .zip(&self.lumped_mass)
            .map(|(d, m)| d.c * m)
            .sum()
    }

    /// 清零全部残差
    pub fn reset_residuals(&mut self) {
        for r in &self.residual {
            r.store(0.0);
        }
    }
}

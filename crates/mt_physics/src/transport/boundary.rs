// crates/mt_physics/src/transport/boundary.rs

//! 边界条件解析
//!
//! 模型构造时把读入的边界条件逐一绑定到节点，并确定哪些节点需要外推：
//!
//! - 节点有给定浓度函数 → 绑定，之后每步强制取该函数值
//! - 否则若为水动力边界节点（流场在此施加了流速或水位条件）→ 外推
//! - 否则为内部节点
//!
//! 同一节点同一类别只取输入顺序中的第一条；已匹配的条目从待处理列表中移除，
//! 剩余条目（节点越界、重复、缺少流量的源浓度）原样留给调用方报告。
//!
//! # 使用示例
//!
//! ```
//! use mt_physics::current::HydroConstraint;
//! use mt_physics::transport::boundary::{resolve_boundaries, BoundaryKind, BoundarySpec};
//! use mt_physics::transport::state::DofBinding;
//!
//! let mut bindings = vec![DofBinding::default(); 3];
//! let mut pending = vec![BoundarySpec::constant(BoundaryKind::Concentration, 0, 35.0)];
//! let constraints = [HydroConstraint::OPEN, HydroConstraint::OPEN, HydroConstraint::FREE];
//!
//! let report = resolve_boundaries(&mut bindings, &mut pending, &constraints);
//! assert!(pending.is_empty());
//! assert_eq!((report.prescribed, report.extrapolated), (1, 1));
//! ```

use crate::current::HydroConstraint;
use crate::forcing::TimeFunction;
use crate::transport::state::{DofBinding, PointSource};
use std::collections::HashMap;
use std::fmt;

/// 边界条件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// 给定浓度
    Concentration,
    /// 点源流量 [m³/s]
    PointSource,
    /// 点源浓度
    SourceConcentration,
}

impl BoundaryKind {
    /// 全部类别
    pub const ALL: [BoundaryKind; 3] = [
        BoundaryKind::Concentration,
        BoundaryKind::PointSource,
        BoundaryKind::SourceConcentration,
    ];

    /// 输入文件中的键
    pub fn key(&self) -> &'static str {
        match self {
            Self::Concentration => "concentration",
            Self::PointSource => "point_source",
            Self::SourceConcentration => "source_concentration",
        }
    }

    /// 由键解析
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 一条边界条件：(类别, 节点, 时间函数)
#[derive(Debug, Clone)]
pub struct BoundarySpec {
    /// 类别
    pub kind: BoundaryKind,
    /// 节点
    pub node: usize,
    /// 时间函数
    pub function: TimeFunction,
}

impl BoundarySpec {
    /// 创建
    pub fn new(kind: BoundaryKind, node: usize, function: TimeFunction) -> Self {
        Self { kind, node, function }
    }

    /// 常数边界
    pub fn constant(kind: BoundaryKind, node: usize, value: f64) -> Self {
        Self::new(kind, node, TimeFunction::Constant(value))
    }
}

/// 解析统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// 给定浓度节点数
    pub prescribed: usize,
    /// 外推节点数
    pub extrapolated: usize,
    /// 点源数
    pub point_sources: usize,
}

/// 把待处理边界条件绑定到节点
///
/// `constraints` 为流场给出的每节点水动力约束。返回后 `pending`
/// 中只剩未匹配条目，顺序不变。
pub fn resolve_boundaries(
    bindings: &mut [DofBinding],
    pending: &mut Vec<BoundarySpec>,
    constraints: &[HydroConstraint],
) -> ResolveReport {
    let n = bindings.len();

    // 每个 (节点, 类别) 的第一条
    let mut first: HashMap<(usize, BoundaryKind), usize> = HashMap::new();
    for (idx, spec) in pending.iter().enumerate() {
        if spec.node < n {
            first.entry((spec.node, spec.kind)).or_insert(idx);
        }
    }

    let mut matched = vec![false; pending.len()];
    let mut report = ResolveReport::default();

    for (i, binding) in bindings.iter_mut().enumerate() {
        if let Some(&idx) = first.get(&(i, BoundaryKind::Concentration)) {
            binding.boundary = Some(pending[idx].function.clone());
            matched[idx] = true;
        }

        if let Some(&idx) = first.get(&(i, BoundaryKind::PointSource)) {
            let concentration = first
                .get(&(i, BoundaryKind::SourceConcentration))
                .map(|&c_idx| {
                    matched[c_idx] = true;
                    pending[c_idx].function.clone()
                });
            binding.point_source = Some(PointSource {
                discharge: pending[idx].function.clone(),
                concentration,
            });
            matched[idx] = true;
            report.point_sources += 1;
        }

        binding.extrapolate = binding.boundary.is_none()
            && constraints.get(i).is_some_and(|c| c.is_boundary());

        if binding.boundary.is_some() {
            report.prescribed += 1;
        } else if binding.extrapolate {
            report.extrapolated += 1;
        }
    }

    let mut flags = matched.into_iter();
    pending.retain(|_| !flags.next().unwrap_or(false));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::state::DofClass;

    #[test]
    fn test_first_match_wins_and_is_removed() {
        let mut bindings = vec![DofBinding::default(); 2];
        let mut pending = vec![
            BoundarySpec::constant(BoundaryKind::Concentration, 1, 5.0),
            BoundarySpec::constant(BoundaryKind::Concentration, 1, 7.0),
        ];
        resolve_boundaries(&mut bindings, &mut pending, &[HydroConstraint::FREE; 2]);

        let f = bindings[1].boundary.as_ref().unwrap();
        assert_eq!(f.value(0.0), 5.0);
        // 重复条目留下
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].function.value(0.0), 7.0);
    }

    #[test]
    fn test_classification_exclusive() {
        let mut bindings = vec![DofBinding::default(); 4];
        let mut pending = vec![BoundarySpec::constant(BoundaryKind::Concentration, 0, 1.0)];
        let constraints = [
            HydroConstraint::OPEN,
            HydroConstraint::CLOSED,
            HydroConstraint::FREE,
            HydroConstraint { u_fixed: true, ..HydroConstraint::FREE },
        ];
        let report = resolve_boundaries(&mut bindings, &mut pending, &constraints);

        assert_eq!(bindings[0].class(), DofClass::Prescribed);
        assert_eq!(bindings[1].class(), DofClass::Extrapolated);
        assert_eq!(bindings[2].class(), DofClass::Interior);
        // 只固定一个流速分量不算边界
        assert_eq!(bindings[3].class(), DofClass::Interior);
        assert_eq!(report, ResolveReport { prescribed: 1, extrapolated: 1, point_sources: 0 });
        // 给定浓度节点不外推
        assert!(!bindings[0].extrapolate);
    }

    #[test]
    fn test_point_source_pairs_with_concentration() {
        let mut bindings = vec![DofBinding::default(); 3];
        let mut pending = vec![
            BoundarySpec::constant(BoundaryKind::SourceConcentration, 2, 30.0),
            BoundarySpec::constant(BoundaryKind::PointSource, 2, 0.5),
            BoundarySpec::constant(BoundaryKind::SourceConcentration, 1, 10.0),
        ];
        let report = resolve_boundaries(&mut bindings, &mut pending, &[HydroConstraint::FREE; 3]);

        let ps = bindings[2].point_source.as_ref().unwrap();
        assert_eq!(ps.discharge.value(0.0), 0.5);
        assert_eq!(ps.concentration_at(0.0), 30.0);
        assert_eq!(report.point_sources, 1);
        // 节点 1 没有流量，源浓度未匹配
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].node, 1);
        // 点源不改变分类
        assert_eq!(bindings[2].class(), DofClass::Interior);
    }

    #[test]
    fn test_out_of_range_node_left_pending() {
        let mut bindings = vec![DofBinding::default(); 2];
        let mut pending = vec![
            BoundarySpec::constant(BoundaryKind::Concentration, 9, 1.0),
            BoundarySpec::constant(BoundaryKind::Concentration, 0, 2.0),
        ];
        resolve_boundaries(&mut bindings, &mut pending, &[HydroConstraint::FREE; 2]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].node, 9);
    }

    #[test]
    fn test_kind_keys() {
        for kind in BoundaryKind::ALL {
            assert_eq!(BoundaryKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(BoundaryKind::from_key("salinity"), None);
        assert_eq!(BoundaryKind::PointSource.to_string(), "point_source");
    }
}

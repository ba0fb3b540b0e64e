// crates/mt_mesh/src/tri_mesh.rs

//! 只读三角形网格
//!
//! SoA 布局，构造时一次性计算全部几何量，之后不可修改。
//!
//! # 设计要点
//!
//! 1. **节点自由度**: 输运量定义在节点上，单元为三节点线性三角形
//! 2. **预计算**: 形函数系数、面积、特征尺寸、集中质量在构造时确定
//! 3. **邻接**: 节点→单元邻接采用 offsets + indices 压缩格式
//! 4. **边界识别**: 只属于一个单元的边为边界边，其端点为边界节点

use crate::shape::ShapeFunctions;
use glam::DVec2;
use mt_foundation::{MtError, MtResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 三角形网格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriMesh {
    // ===== 节点数据 =====
    node_xy: Vec<DVec2>,
    node_z_bed: Vec<f64>,
    /// 集中质量 `Σ A_e / 3`
    lumped_mass: Vec<f64>,
    /// 节点→单元邻接 (压缩格式)
    node_element_offsets: Vec<usize>,
    node_element_indices: Vec<usize>,
    /// 边界节点标记
    boundary_node: Vec<bool>,

    // ===== 单元数据 =====
    element_nodes: Vec<[usize; 3]>,
    element_shape: Vec<ShapeFunctions>,
    element_area: Vec<f64>,
    /// 最小高 `2A / 最长边`
    element_size: Vec<f64>,
}

impl TriMesh {
    /// 由节点与单元数组构造网格
    ///
    /// # 错误
    ///
    /// - 坐标与高程数组长度不一致
    /// - 单元引用不存在的节点或重复节点
    /// - 退化（零面积）单元
    /// - 存在不属于任何单元的孤立节点
    pub fn new(nodes: Vec<DVec2>, z_bed: Vec<f64>, elements: Vec<[usize; 3]>) -> MtResult<Self> {
        let n_nodes = nodes.len();
        MtError::check_size("z_bed", n_nodes, z_bed.len())?;
        if elements.is_empty() {
            return Err(MtError::invalid_mesh("网格不含任何单元"));
        }

        let mut element_shape = Vec::with_capacity(elements.len());
        let mut element_area = Vec::with_capacity(elements.len());
        let mut element_size = Vec::with_capacity(elements.len());
        let mut lumped_mass = vec![0.0; n_nodes];
        let mut counts = vec![0usize; n_nodes];
        let mut edge_use: HashMap<(usize, usize), u32> = HashMap::new();

        for (e, tri) in elements.iter().enumerate() {
            for &n in tri {
                MtError::check_index("Node", n, n_nodes)?;
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(MtError::invalid_mesh(format!("单元 {} 含重复节点 {:?}", e, tri)));
            }

            let p = tri.map(|n| nodes[n]);
            let (shape, two_area) = ShapeFunctions::from_vertices(p)
                .ok_or_else(|| MtError::invalid_mesh(format!("单元 {} 面积为零", e)))?;
            let area = 0.5 * two_area.abs();

            let longest = (0..3)
                .map(|k| (p[(k + 1) % 3] - p[k]).length())
                .fold(0.0_f64, f64::max);

            element_shape.push(shape);
            element_area.push(area);
            element_size.push(two_area.abs() / longest);

            for k in 0..3 {
                lumped_mass[tri[k]] += area / 3.0;
                counts[tri[k]] += 1;
                let a = tri[k];
                let b = tri[(k + 1) % 3];
                *edge_use.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }

        if let Some(orphan) = counts.iter().position(|&c| c == 0) {
            return Err(MtError::invalid_mesh(format!("节点 {} 不属于任何单元", orphan)));
        }

        // 压缩邻接
        let mut node_element_offsets = Vec::with_capacity(n_nodes + 1);
        node_element_offsets.push(0);
        for &c in &counts {
            let last = node_element_offsets[node_element_offsets.len() - 1];
            node_element_offsets.push(last + c);
        }
        let mut cursor = node_element_offsets.clone();
        let mut node_element_indices = vec![0usize; node_element_offsets[n_nodes]];
        for (e, tri) in elements.iter().enumerate() {
            for &n in tri {
                node_element_indices[cursor[n]] = e;
                cursor[n] += 1;
            }
        }

        let mut boundary_node = vec![false; n_nodes];
        for (&(a, b), &uses) in &edge_use {
            if uses == 1 {
                boundary_node[a] = true;
                boundary_node[b] = true;
            }
        }

        log::debug!(
            "网格构建完成: {} 节点, {} 单元, {} 边界节点",
            n_nodes,
            elements.len(),
            boundary_node.iter().filter(|&&b| b).count()
        );

        Ok(Self {
            node_xy: nodes,
            node_z_bed: z_bed,
            lumped_mass,
            node_element_offsets,
            node_element_indices,
            boundary_node,
            element_nodes: elements,
            element_shape,
            element_area,
            element_size,
        })
    }

    // =========================================================================
    // 基本统计
    // =========================================================================

    /// 节点数量（即自由度数量）
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.node_xy.len()
    }

    /// 单元数量
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.element_nodes.len()
    }

    /// 总面积
    pub fn total_area(&self) -> f64 {
        self.element_area.iter().sum()
    }

    // =========================================================================
    // 节点访问
    // =========================================================================

    /// 节点坐标
    #[inline]
    pub fn node_xy(&self, n: usize) -> DVec2 {
        self.node_xy[n]
    }

    /// 节点底高程
    #[inline]
    pub fn node_z_bed(&self, n: usize) -> f64 {
        self.node_z_bed[n]
    }

    /// 全部节点底高程
    pub fn z_bed(&self) -> &[f64] {
        &self.node_z_bed
    }

    /// 节点集中质量
    #[inline]
    pub fn lumped_mass(&self, n: usize) -> f64 {
        self.lumped_mass[n]
    }

    /// 全部集中质量
    pub fn lumped_masses(&self) -> &[f64] {
        &self.lumped_mass
    }

    /// 节点所属单元
    #[inline]
    pub fn node_elements(&self, n: usize) -> &[usize] {
        &self.node_element_indices[self.node_element_offsets[n]..self.node_element_offsets[n + 1]]
    }

    /// 是否为边界节点
    #[inline]
    pub fn is_boundary_node(&self, n: usize) -> bool {
        self.boundary_node[n]
    }

    /// 边界节点列表
    pub fn boundary_nodes(&self) -> Vec<usize> {
        (0..self.n_nodes()).filter(|&n| self.boundary_node[n]).collect()
    }

    // =========================================================================
    // 单元访问
    // =========================================================================

    /// 单元节点
    #[inline]
    pub fn element_nodes(&self, e: usize) -> [usize; 3] {
        self.element_nodes[e]
    }

    /// 全部单元节点
    pub fn elements(&self) -> &[[usize; 3]] {
        &self.element_nodes
    }

    /// 单元形函数系数
    #[inline]
    pub fn shape(&self, e: usize) -> &ShapeFunctions {
        &self.element_shape[e]
    }

    /// 单元面积
    #[inline]
    pub fn element_area(&self, e: usize) -> f64 {
        self.element_area[e]
    }

    /// 单元特征尺寸
    #[inline]
    pub fn element_size(&self, e: usize) -> f64 {
        self.element_size[e]
    }

    /// 单元形心
    pub fn element_centroid(&self, e: usize) -> DVec2 {
        let [a, b, c] = self.element_nodes[e];
        (self.node_xy[a] + self.node_xy[b] + self.node_xy[c]) / 3.0
    }
}

// crates/mt_mesh/src/coloring.rs

//! 单元着色
//!
//! 共享节点的两个单元视为相邻，同一颜色内的单元互不共享节点，
//! 因此同色单元并行向节点散射时无需原子操作。

use crate::tri_mesh::TriMesh;
use std::collections::HashSet;

/// 着色结果
#[derive(Debug, Clone)]
pub struct ElementColoring {
    element_colors: Vec<usize>,
    color_elements: Vec<Vec<usize>>,
}

impl ElementColoring {
    /// 按共享节点贪心着色（度数高者优先）
    pub fn from_mesh(mesh: &TriMesh) -> Self {
        let n = mesh.n_elements();

        let mut neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        for node in 0..mesh.n_nodes() {
            let elems = mesh.node_elements(node);
            for (i, &a) in elems.iter().enumerate() {
                for &b in &elems[i + 1..] {
                    neighbors[a].insert(b);
                    neighbors[b].insert(a);
                }
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&e| std::cmp::Reverse(neighbors[e].len()));

        let mut colors = vec![usize::MAX; n];
        let mut num_colors = 0;
        for e in order {
            let used: HashSet<usize> = neighbors[e]
                .iter()
                .map(|&m| colors[m])
                .filter(|&c| c != usize::MAX)
                .collect();
            let mut color = 0;
            while used.contains(&color) {
                color += 1;
            }
            colors[e] = color;
            num_colors = num_colors.max(color + 1);
        }

        let mut color_elements = vec![Vec::new(); num_colors];
        for (e, &c) in colors.iter().enumerate() {
            color_elements[c].push(e);
        }

        log::debug!("单元着色: {} 单元, {} 种颜色", n, num_colors);

        Self {
            element_colors: colors,
            color_elements,
        }
    }

    /// 颜色数量
    pub fn num_colors(&self) -> usize {
        self.color_elements.len()
    }

    /// 指定颜色的单元
    pub fn elements_with_color(&self, color: usize) -> &[usize] {
        self.color_elements.get(color).map_or(&[][..], |v| v.as_slice())
    }

    /// 单元颜色
    pub fn color_of(&self, element: usize) -> Option<usize> {
        self.element_colors.get(element).copied()
    }

    /// 检查同色单元是否共享节点
    pub fn is_valid(&self, mesh: &TriMesh) -> bool {
        for group in &self.color_elements {
            let mut seen = HashSet::new();
            for &e in group {
                for n in mesh.element_nodes(e) {
                    if !seen.insert(n) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

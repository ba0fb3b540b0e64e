// crates/mt_mesh/src/generation.rs

//! 规则矩形网格生成
//!
//! 将 `nx × ny` 个矩形格子各沿对角线剖分为两个三角形。
//! 节点编号按行优先：`n = j * (nx + 1) + i`。
//!
//! # 使用示例
//!
//! ```
//! use mt_mesh::RectMeshBuilder;
//!
//! let mesh = RectMeshBuilder::new(4, 2, 40.0, 20.0)
//!     .with_bed_level(-5.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(mesh.n_nodes(), 15);
//! assert_eq!(mesh.n_elements(), 16);
//! ```

use crate::tri_mesh::TriMesh;
use glam::DVec2;
use mt_foundation::{MtError, MtResult};

/// 矩形网格构建器
#[derive(Debug, Clone)]
pub struct RectMeshBuilder {
    nx: usize,
    ny: usize,
    lx: f64,
    ly: f64,
    origin: DVec2,
    bed_level: f64,
    bed_slope: DVec2,
}

impl RectMeshBuilder {
    /// 新建构建器
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            origin: DVec2::ZERO,
            bed_level: 0.0,
            bed_slope: DVec2::ZERO,
        }
    }

    /// 左下角坐标
    pub fn with_origin(mut self, origin: DVec2) -> Self {
        self.origin = origin;
        self
    }

    /// 原点处底高程
    pub fn with_bed_level(mut self, z: f64) -> Self {
        self.bed_level = z;
        self
    }

    /// 底坡（高程随 x、y 的变化率）
    pub fn with_bed_slope(mut self, slope: DVec2) -> Self {
        self.bed_slope = slope;
        self
    }

    /// 生成网格
    pub fn build(&self) -> MtResult<TriMesh> {
        if self.nx == 0 || self.ny == 0 {
            return Err(MtError::invalid_input(format!(
                "网格划分数必须为正: nx={}, ny={}",
                self.nx, self.ny
            )));
        }
        if !(self.lx > 0.0 && self.ly > 0.0) {
            return Err(MtError::invalid_input(format!(
                "区域尺寸必须为正: lx={}, ly={}",
                self.lx, self.ly
            )));
        }

        let dx = self.lx / self.nx as f64;
        let dy = self.ly / self.ny as f64;
        let row = self.nx + 1;

        let mut nodes = Vec::with_capacity(row * (self.ny + 1));
        let mut z_bed = Vec::with_capacity(row * (self.ny + 1));
        for j in 0..=self.ny {
            for i in 0..=self.nx {
                let local = DVec2::new(i as f64 * dx, j as f64 * dy);
                nodes.push(self.origin + local);
                z_bed.push(self.bed_level + self.bed_slope.dot(local));
            }
        }

        let mut elements = Vec::with_capacity(2 * self.nx * self.ny);
        for j in 0..self.ny {
            for i in 0..self.nx {
                let n00 = j * row + i;
                let n10 = n00 + 1;
                let n01 = n00 + row;
                let n11 = n01 + 1;
                elements.push([n00, n10, n11]);
                elements.push([n00, n11, n01]);
            }
        }

        TriMesh::new(nodes, z_bed, elements)
    }
}

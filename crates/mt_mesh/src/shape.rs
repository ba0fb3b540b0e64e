// crates/mt_mesh/src/shape.rs

//! 线性三角形形函数
//!
//! 对节点 `(x_k, y_k)`，`N_k(x, y) = a_k + b_k x + c_k y`，
//! 满足 `N_k(x_l, y_l) = δ_kl`。`b_k`、`c_k` 即 `∂N_k/∂x`、`∂N_k/∂y`，
//! 在单元内为常数。

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 单元形函数系数矩阵（3×3）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeFunctions {
    /// 常数项
    pub a: [f64; 3],
    /// x 方向导数
    pub b: [f64; 3],
    /// y 方向导数
    pub c: [f64; 3],
}

impl ShapeFunctions {
    /// 由三个顶点计算系数
    ///
    /// 返回 `(系数, 有向双倍面积)`；退化三角形的双倍面积为零，
    /// 调用方负责拒绝。
    pub fn from_vertices(p: [DVec2; 3]) -> Option<(Self, f64)> {
        let two_area = (p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[2].x - p[0].x) * (p[1].y - p[0].y);
        if two_area.abs() < f64::EPSILON || !two_area.is_finite() {
            return None;
        }

        let mut a = [0.0; 3];
        let mut b = [0.0; 3];
        let mut c = [0.0; 3];
        for k in 0..3 {
            let j = (k + 1) % 3;
            let l = (k + 2) % 3;
            a[k] = (p[j].x * p[l].y - p[l].x * p[j].y) / two_area;
            b[k] = (p[j].y - p[l].y) / two_area;
            c[k] = (p[l].x - p[j].x) / two_area;
        }
        Some((Self { a, b, c }, two_area))
    }

    /// 第 k 个形函数的梯度
    #[inline]
    pub fn grad(&self, k: usize) -> DVec2 {
        DVec2::new(self.b[k], self.c[k])
    }

    /// 第 k 个形函数在点 p 的值
    #[inline]
    pub fn eval(&self, k: usize, p: DVec2) -> f64 {
        self.a[k] + self.b[k] * p.x + self.c[k] * p.y
    }

    /// 节点值的单元内梯度 `Σ v_k ∇N_k`
    #[inline]
    pub fn gradient_of(&self, values: [f64; 3]) -> DVec2 {
        DVec2::new(
            values[0] * self.b[0] + values[1] * self.b[1] + values[2] * self.b[2],
            values[0] * self.c[0] + values[1] * self.c[1] + values[2] * self.c[2],
        )
    }
}

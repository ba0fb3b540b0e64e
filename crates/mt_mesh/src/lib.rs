// crates/mt_mesh/src/lib.rs

//! MariTrans 网格模块
//!
//! 提供输运求解所需的只读三角形网格。
//!
//! # 核心类型
//!
//! - [`TriMesh`]: 节点坐标、底高程、三节点单元、节点→单元邻接，
//!   以及预计算的形函数系数、单元面积、特征尺寸和集中质量
//! - [`ShapeFunctions`]: 线性三角形形函数 `N_k = a_k + b_k x + c_k y`
//! - [`RectMeshBuilder`]: 规则矩形区域三角剖分（测试与命令行用）
//! - [`ElementColoring`]: 按共享节点着色，同色单元可无锁并行散射
//!
//! # 示例
//!
//! ```rust
//! use glam::DVec2;
//! use mt_mesh::TriMesh;
//!
//! let mesh = TriMesh::new(
//!     vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)],
//!     vec![0.0; 3],
//!     vec![[0, 1, 2]],
//! ).unwrap();
//! assert_eq!(mesh.n_elements(), 1);
//! assert!((mesh.element_area(0) - 0.5).abs() < 1e-12);
//! ```

pub mod coloring;
pub mod generation;
pub mod shape;
pub mod tri_mesh;

pub use coloring::ElementColoring;
pub use generation::RectMeshBuilder;
pub use shape::ShapeFunctions;
pub use tri_mesh::TriMesh;

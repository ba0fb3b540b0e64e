// crates/mt_config/src/lib.rs

//! MariTrans Config Layer
//!
//! 配置层，将 JSON 配置文件反序列化为 [`TransportConfig`] 并校验。
//! 所有字段都有默认值，配置文件只需写出与默认值不同的部分。
//!
//! # 模块概览
//!
//! - [`transport_config`]: 输运模型全部配置项
//! - [`error`]: 配置错误类型
//!
//! # 示例
//!
//! ```
//! use mt_config::TransportConfig;
//!
//! let config: TransportConfig = serde_json::from_str(
//!     r#"{ "species": { "kind": "salinity" }, "time": { "dt": 2.0 } }"#,
//! ).unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.time.dt, 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod transport_config;

pub use error::ConfigError;
pub use transport_config::{
    AssemblyStrategy, BoundaryConfig, CurrentConfig, ExtrapolationConfig, InitialFormat,
    InitialStateConfig, MeshConfig, OutputConfig, ParallelConfig, PhysicsConfig, ResultField,
    SedimentConfig, SedimentFormulaKind, SpeciesConfig, TimeConfig, TransportConfig,
    WettingConfig,
};

// crates/mt_config/src/transport_config.rs

//! TransportConfig - 输运模型配置
//!
//! 定义输运求解的全部配置参数。各段都实现 `Default`，
//! 字段缺省时使用 `#[serde(default = "...")]` 指定的默认值。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 输运模型配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// 输运物质
    #[serde(default)]
    pub species: SpeciesConfig,

    /// 物理参数
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// 干湿处理
    #[serde(default)]
    pub wetting: WettingConfig,

    /// 边界外推松弛
    #[serde(default)]
    pub extrapolation: ExtrapolationConfig,

    /// 并行
    #[serde(default)]
    pub parallel: ParallelConfig,

    /// 时间控制
    #[serde(default)]
    pub time: TimeConfig,

    /// 结果输出
    #[serde(default)]
    pub output: OutputConfig,

    /// 初始场
    #[serde(default)]
    pub initial: InitialStateConfig,

    /// 边界条件
    #[serde(default)]
    pub boundary: BoundaryConfig,

    /// 矩形网格（命令行使用）
    #[serde(default)]
    pub mesh: MeshConfig,

    /// 均匀流场（命令行使用）
    #[serde(default)]
    pub current: CurrentConfig,
}

// =============================================================================
// 输运物质
// =============================================================================

/// 输运物质
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeciesConfig {
    /// 盐度 [psu]
    #[default]
    Salinity,
    /// 水温 [°C]
    Temperature,
    /// 溶解氧 [mg/L]，以 `decay_rate` 向饱和值复氧
    DissolvedOxygen {
        /// 饱和浓度 [mg/L]
        #[serde(default = "default_oxygen_saturation")]
        saturation: f64,
    },
    /// 一般示踪剂，以 `decay_rate` 一阶衰减
    Tracer,
    /// 悬移质泥沙 [kg/m³]
    SuspendedSediment(SedimentConfig),
}

fn default_oxygen_saturation() -> f64 { 8.0 }

/// 泥沙参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SedimentConfig {
    /// 输沙公式
    #[serde(default)]
    pub formula: SedimentFormulaKind,

    /// 中值粒径 [m]
    #[serde(default = "default_d50")]
    pub d50: f64,

    /// 泥沙密度 [kg/m³]
    #[serde(default = "default_rho_s")]
    pub rho_s: f64,

    /// 水密度 [kg/m³]
    #[serde(default = "default_rho_w")]
    pub rho_w: f64,

    /// Manning 糙率，用于由流速计算床面切应力
    #[serde(default = "default_manning")]
    pub manning_n: f64,

    /// 非平衡适应时间 [s]
    #[serde(default = "default_adaptation_time")]
    pub adaptation_time: f64,
}

fn default_d50() -> f64 { 2.0e-4 }
fn default_rho_s() -> f64 { 2650.0 }
fn default_rho_w() -> f64 { 1000.0 }
fn default_manning() -> f64 { 0.025 }
fn default_adaptation_time() -> f64 { 600.0 }

impl Default for SedimentConfig {
    fn default() -> Self {
        Self {
            formula: SedimentFormulaKind::default(),
            d50: default_d50(),
            rho_s: default_rho_s(),
            rho_w: default_rho_w(),
            manning_n: default_manning(),
            adaptation_time: default_adaptation_time(),
        }
    }
}

/// 输沙公式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SedimentFormulaKind {
    /// Meyer-Peter & Müller (1948)
    MeyerPeterMuller,
    /// Engelund-Hansen (1967)
    EngelundHansen,
    /// Van Rijn (1984)
    #[default]
    VanRijn,
}

// =============================================================================
// 物理参数
// =============================================================================

/// 物理参数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// 分子/背景弥散系数 [m²/s]，叠加在流场湍流弥散之上
    #[serde(default)]
    pub dispersion: f64,

    /// 衰减/反应速率 [1/s]
    #[serde(default)]
    pub decay_rate: f64,

    /// 残差型数值弥散系数（0 表示关闭）
    #[serde(default)]
    pub numerical_dispersion: f64,

    /// 流速阈值 [m/s]，单元平均流速低于此值时不施加流线迎风修正
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f64,
}

fn default_velocity_threshold() -> f64 { 1.0e-5 }

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            dispersion: 0.0,
            decay_rate: 0.0,
            numerical_dispersion: 0.0,
            velocity_threshold: default_velocity_threshold(),
        }
    }
}

/// 干湿处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WettingConfig {
    /// 干湿阈值水深 WATT [m]
    #[serde(default = "default_watt")]
    pub watt: f64,

    /// 干湿过渡带宽度 [m]，权重在 `[watt, watt + transition]` 内线性变化
    #[serde(default = "default_transition")]
    pub transition: f64,

    /// 干节点衰减速率 [1/s]
    #[serde(default = "default_dry_decay_rate")]
    pub dry_decay_rate: f64,
}

fn default_watt() -> f64 { 0.01 }
fn default_transition() -> f64 { 0.09 }
fn default_dry_decay_rate() -> f64 { 1.0e-4 }

impl Default for WettingConfig {
    fn default() -> Self {
        Self {
            watt: default_watt(),
            transition: default_transition(),
            dry_decay_rate: default_dry_decay_rate(),
        }
    }
}

/// 边界外推松弛系数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtrapolationConfig {
    /// 向较湿邻点松弛的比例
    #[serde(default = "default_relaxation")]
    pub relaxation: f64,

    /// 邻点本身也在外推时使用的比例
    #[serde(default = "default_extrapolated_relaxation")]
    pub extrapolated_neighbor_relaxation: f64,
}

fn default_relaxation() -> f64 { 0.01 }
fn default_extrapolated_relaxation() -> f64 { 0.001 }

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            relaxation: default_relaxation(),
            extrapolated_neighbor_relaxation: default_extrapolated_relaxation(),
        }
    }
}

// =============================================================================
// 并行与时间
// =============================================================================

/// 单元组装策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStrategy {
    /// 串行
    Sequential,
    /// 并行，逐节点原子累加
    #[default]
    Atomic,
    /// 按颜色分组并行，同色单元不共享节点
    Colored,
    /// 并行计算单元贡献，再按单元顺序串行散射（结果可逐位复现）
    CollectThenAccumulate,
}

/// 并行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// 工作线程数（0 表示由 rayon 决定）
    #[serde(default)]
    pub num_threads: usize,

    /// 组装策略
    #[serde(default)]
    pub strategy: AssemblyStrategy,
}

/// 时间控制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 时间步长 [s]；自适应模式下为步长上限
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// 起始时间 [s]
    #[serde(default)]
    pub start_time: f64,

    /// 结束时间 [s]
    #[serde(default = "default_end_time")]
    pub end_time: f64,

    /// 是否按单元稳定步长自适应
    #[serde(default)]
    pub adaptive: bool,

    /// 自适应模式下稳定步长的安全系数
    #[serde(default = "default_cfl")]
    pub cfl: f64,
}

fn default_dt() -> f64 { 1.0 }
fn default_end_time() -> f64 { 3600.0 }
fn default_cfl() -> f64 { 0.9 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            start_time: 0.0,
            end_time: default_end_time(),
            adaptive: false,
            cfl: default_cfl(),
        }
    }
}

// =============================================================================
// 输入输出
// =============================================================================

/// 写入结果流的物理量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResultField {
    /// 输运量
    #[default]
    Concentration,
    /// 变化率
    RateOfChange,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 结果文件
    #[serde(default = "default_output_file")]
    pub file: PathBuf,

    /// 每隔多少步写一条记录
    #[serde(default = "default_output_interval")]
    pub interval: usize,

    /// 写出的物理量
    #[serde(default)]
    pub field: ResultField,
}

fn default_output_file() -> PathBuf { PathBuf::from("transport.bin") }
fn default_output_interval() -> usize { 1 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
            interval: default_output_interval(),
            field: ResultField::default(),
        }
    }
}

/// 初始场文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitialFormat {
    /// 文本格式
    #[default]
    Text,
    /// 二进制网格属性格式
    Binary,
}

/// 初始场配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialStateConfig {
    /// 初始场文件，缺省时全场取 `default_value`
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// 文件格式
    #[serde(default)]
    pub format: InitialFormat,

    /// 缺省初值
    #[serde(default)]
    pub default_value: f64,
}

/// 边界条件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// 边界条件文件
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// 读取的键（其余记录跳过）
    #[serde(default = "default_boundary_keys")]
    pub keys: Vec<String>,
}

fn default_boundary_keys() -> Vec<String> {
    vec![
        "concentration".to_string(),
        "point_source".to_string(),
        "source_concentration".to_string(),
    ]
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            file: None,
            keys: default_boundary_keys(),
        }
    }
}

/// 矩形网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// x 方向划分数
    #[serde(default = "default_nx")]
    pub nx: usize,
    /// y 方向划分数
    #[serde(default = "default_ny")]
    pub ny: usize,
    /// x 方向长度 [m]
    #[serde(default = "default_lx")]
    pub lx: f64,
    /// y 方向长度 [m]
    #[serde(default = "default_ly")]
    pub ly: f64,
    /// 底高程 [m]
    #[serde(default = "default_bed_level")]
    pub bed_level: f64,
}

fn default_nx() -> usize { 20 }
fn default_ny() -> usize { 5 }
fn default_lx() -> f64 { 1000.0 }
fn default_ly() -> f64 { 250.0 }
fn default_bed_level() -> f64 { -2.0 }

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            nx: default_nx(),
            ny: default_ny(),
            lx: default_lx(),
            ly: default_ly(),
            bed_level: default_bed_level(),
        }
    }
}

/// 均匀流场配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConfig {
    /// x 方向流速 [m/s]
    #[serde(default = "default_u")]
    pub u: f64,
    /// y 方向流速 [m/s]
    #[serde(default)]
    pub v: f64,
    /// 水位 [m]
    #[serde(default)]
    pub water_level: f64,
    /// 湍流弥散系数 [m²/s]
    #[serde(default)]
    pub dispersion: f64,
    /// 网格外边界是否为水位开边界（否则为自由节点，不做外推）
    #[serde(default)]
    pub open_boundaries: bool,
}

fn default_u() -> f64 { 0.1 }

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            u: default_u(),
            v: 0.0,
            water_level: 0.0,
            dispersion: 0.0,
            open_boundaries: false,
        }
    }
}

// =============================================================================
// 加载与校验
// =============================================================================

impl TransportConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let config: TransportConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("physics.dispersion", self.physics.dispersion)?;
        non_negative("physics.decay_rate", self.physics.decay_rate)?;
        non_negative("physics.numerical_dispersion", self.physics.numerical_dispersion)?;
        positive("physics.velocity_threshold", self.physics.velocity_threshold)?;

        positive("wetting.watt", self.wetting.watt)?;
        non_negative("wetting.transition", self.wetting.transition)?;
        non_negative("wetting.dry_decay_rate", self.wetting.dry_decay_rate)?;

        fraction("extrapolation.relaxation", self.extrapolation.relaxation)?;
        fraction(
            "extrapolation.extrapolated_neighbor_relaxation",
            self.extrapolation.extrapolated_neighbor_relaxation,
        )?;

        positive("time.dt", self.time.dt)?;
        if !(self.time.end_time >= self.time.start_time) {
            return Err(ConfigError::invalid(
                "time.end_time",
                self.time.end_time,
                "结束时间不能早于起始时间",
            ));
        }
        fraction("time.cfl", self.time.cfl)?;

        if self.output.interval == 0 {
            return Err(ConfigError::invalid("output.interval", 0, "输出间隔至少为 1 步"));
        }
        if self.initial.default_value < 0.0 || !self.initial.default_value.is_finite() {
            return Err(ConfigError::invalid(
                "initial.default_value",
                self.initial.default_value,
                "初值必须为非负有限数",
            ));
        }

        match &self.species {
            SpeciesConfig::DissolvedOxygen { saturation } => {
                positive("species.saturation", *saturation)?;
            }
            SpeciesConfig::SuspendedSediment(sed) => {
                positive("species.d50", sed.d50)?;
                positive("species.rho_w", sed.rho_w)?;
                if sed.rho_s <= sed.rho_w {
                    return Err(ConfigError::invalid(
                        "species.rho_s",
                        sed.rho_s,
                        "泥沙密度必须大于水密度",
                    ));
                }
                positive("species.manning_n", sed.manning_n)?;
                positive("species.adaptation_time", sed.adaptation_time)?;
            }
            _ => {}
        }

        Ok(())
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须为正"))
    }
}

fn non_negative(key: &str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "不能为负"))
    }
}

fn fraction(key: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "必须在 (0, 1] 范围内"))
    }
}

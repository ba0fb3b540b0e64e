// apps/mt_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 配置 → 网格与流场 → 边界与初值 → 模拟驱动 → 结果流。

use super::{build_current, build_mesh, load_boundaries, load_initial_values};
use anyhow::{Context, Result};
use clap::Args;
use mt_config::TransportConfig;
use mt_io::ResultWriter;
use mt_physics::{Simulation, Species, TimeControl, TransportSettings};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 结果文件（覆盖配置中的 output.file）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 模拟结束时间 [秒]（覆盖配置）
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,

    /// 工作线程数，0 为自动（覆盖配置）
    #[arg(long)]
    pub threads: Option<usize>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== MariTrans 模拟启动 ===");

    let mut config = TransportConfig::from_file(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    if let Some(end) = args.end_time {
        config.time.end_time = end;
    }
    if let Some(threads) = args.threads {
        config.parallel.num_threads = threads;
    }
    if let Some(output) = args.output {
        config.output.file = output;
    }
    config.validate().context("配置无效")?;

    let mesh = build_mesh(&config.mesh)?;
    let n_nodes = mesh.n_nodes();
    info!("网格: {} 节点, {} 单元", n_nodes, mesh.n_elements());

    let current = build_current(&config.current);
    let species = Species::from_config(&config.species);
    let settings = TransportSettings::from_config(&config);
    let boundaries = load_boundaries(&config, n_nodes)?;
    let initial = load_initial_values(&config, n_nodes)?;

    info!(
        "物质: {}, 组装策略: {:?}, 边界条件: {} 条",
        species.name(),
        settings.strategy,
        boundaries.len()
    );

    let mut sim = Simulation::new(
        mesh,
        Box::new(current),
        settings,
        species,
        boundaries,
        TimeControl::from_config(&config.time),
    )?
    .with_output(config.output.interval, config.output.field);
    sim.set_initial(&initial)?;

    let unmatched = sim.model().unmatched_boundaries().len();
    if unmatched > 0 {
        warn!("{} 条边界条件未能绑定", unmatched);
    }

    let mut writer = ResultWriter::create(&config.output.file, n_nodes)
        .with_context(|| format!("无法创建结果文件: {}", config.output.file.display()))?;

    info!(
        "开始模拟: t = {} → {} s, dt = {} s",
        config.time.start_time, config.time.end_time, config.time.dt
    );
    let start = Instant::now();
    let result = sim.run(&mut writer);
    // 失稳时诊断记录也要落盘
    let records = writer.finish()?;
    let summary = result?;

    let metrics = sim.model().assembly_metrics();
    info!("=== 模拟完成 ===");
    info!("总步数: {}", summary.steps);
    info!("结束时间: {:.3} s", summary.final_time);
    info!("最小稳定步长: {:.4e} s", summary.min_stable_dt);
    info!("总量: {:.6e}", summary.total_mass);
    info!("结果记录: {} 条 → {}", records, config.output.file.display());
    info!(
        "计算时间: {:.2} s (组装 {:.3} µs/单元)",
        start.elapsed().as_secs_f64(),
        metrics.avg_time_per_element().as_secs_f64() * 1e6
    );

    Ok(())
}

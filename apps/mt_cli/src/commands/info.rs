// apps/mt_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 打印默认配置，或统计结果文件中每条记录的范围。

use anyhow::{bail, Context, Result};
use clap::Args;
use mt_config::TransportConfig;
use mt_io::ResultReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径（用于确定结果文件的节点数）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 结果文件
    #[arg(short, long)]
    pub results: Option<PathBuf>,

    /// 每条记录的节点数（未给出时由配置中的网格推算）
    #[arg(long)]
    pub nodes: Option<usize>,

    /// 打印默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== MariTrans 信息 ===");

    if args.defaults || (args.results.is_none() && args.config.is_none()) {
        print_default_config()?;
    }

    if let Some(results) = &args.results {
        let n_nodes = match args.nodes {
            Some(n) => n,
            None => {
                let config = match &args.config {
                    Some(path) => TransportConfig::from_file(path)
                        .with_context(|| format!("加载配置失败: {}", path.display()))?,
                    None => bail!("需要 --nodes 或 --config 以确定记录长度"),
                };
                (config.mesh.nx + 1) * (config.mesh.ny + 1)
            }
        };
        print_results_summary(results, n_nodes)?;
    } else if let Some(path) = &args.config {
        let config = TransportConfig::from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?;
        println!("=== 配置 {} ===", path.display());
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    Ok(())
}

fn print_default_config() -> Result<()> {
    println!("=== 默认配置 ===");
    println!("版本: {}", env!("CARGO_PKG_VERSION"));
    println!("{}", serde_json::to_string_pretty(&TransportConfig::default())?);
    Ok(())
}

fn print_results_summary(path: &Path, n_nodes: usize) -> Result<()> {
    let n_records = ResultReader::count_records(path, n_nodes)?;
    println!("=== 结果文件 {} ===", path.display());
    println!("节点数: {}, 记录数: {}", n_nodes, n_records);

    let reader = ResultReader::open(path, n_nodes)?;
    for record in reader {
        let record = record?;
        let (min, max) = record
            .values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let mean = record.values.iter().map(|&v| v as f64).sum::<f64>() / n_nodes.max(1) as f64;
        println!(
            "  t = {:>12.3} s  min = {:>12.5}  max = {:>12.5}  mean = {:>12.5}",
            record.time, min, max, mean
        );
    }
    Ok(())
}

// apps/mt_cli/src/main.rs

//! MariTrans 命令行界面
//!
//! 读取 JSON 配置，在矩形三角形网格和均匀流场上运行标量输运，
//! 结果写入大端 `f32` 结果流。
//!
//! 所有致命错误在此处统一记录并以退出码 1 结束进程。

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MariTrans 标量输运求解器命令行工具
#[derive(Parser)]
#[command(name = "mt_cli")]
#[command(author = "MariTrans Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MariTrans depth-integrated scalar transport solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 显示默认配置或结果文件概况
    Info(commands::info::InfoArgs),
    /// 验证配置及其引用的输入文件
    Validate(commands::validate::ValidateArgs),
}

fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(level: Level) -> anyhow::Result<()> {
    // try_init 同时把库中的 log 记录桥接到 tracing
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(parse_level(&cli.log_level)) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

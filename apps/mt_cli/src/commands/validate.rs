// apps/mt_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 校验配置值，并试读配置引用的初始场与边界条件文件。

use super::{build_mesh, load_boundaries, load_initial_values};
use anyhow::{bail, Result};
use clap::Args;
use mt_config::TransportConfig;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== MariTrans 配置验证 ===");

    let mut result = ValidationResult::default();
    if let Some(config) = validate_config(&args.config, &mut result) {
        check_time_and_output(&config, &mut result);
        check_inputs(&config, &mut result);
    }

    print_validation_result(&result, args.strict)
}

fn validate_config(path: &Path, result: &mut ValidationResult) -> Option<TransportConfig> {
    println!("\n检查配置文件: {}", path.display());
    match TransportConfig::from_file(path) {
        Ok(config) => {
            println!("  ✓ 配置有效");
            Some(config)
        }
        Err(e) => {
            result.add_error(e.to_string());
            None
        }
    }
}

fn check_time_and_output(config: &TransportConfig, result: &mut ValidationResult) {
    let span = config.time.end_time - config.time.start_time;
    if span == 0.0 {
        result.add_warning("模拟时长为零");
    }
    if config.time.dt > span && span > 0.0 {
        result.add_warning(format!("时间步长 {} s 大于模拟时长 {} s", config.time.dt, span));
    }
    if let Some(parent) = config.output.file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            result.add_error(format!("结果目录不存在: {}", parent.display()));
        }
    }
    if config.current.u == 0.0 && config.current.v == 0.0 && config.current.dispersion == 0.0 {
        result.add_warning("流速与弥散均为零，输运项为空");
    }
}

fn check_inputs(config: &TransportConfig, result: &mut ValidationResult) {
    let mesh = match build_mesh(&config.mesh) {
        Ok(mesh) => mesh,
        Err(e) => {
            result.add_error(format!("{:#}", e));
            return;
        }
    };
    let n_nodes = mesh.n_nodes();
    println!("  ✓ 网格: {} 节点, {} 单元", n_nodes, mesh.n_elements());

    match load_initial_values(config, n_nodes) {
        Ok(_) if config.initial.file.is_some() => println!("  ✓ 初始场文件有效"),
        Ok(_) => {}
        Err(e) => result.add_error(format!("{:#}", e)),
    }

    match load_boundaries(config, n_nodes) {
        Ok(specs) if config.boundary.file.is_some() => {
            if specs.is_empty() {
                result.add_warning("边界条件文件中没有选中的记录");
            } else {
                println!("  ✓ 边界条件: {} 条", specs.len());
            }
        }
        Ok(_) => result.add_warning("未配置边界条件文件"),
        Err(e) => result.add_error(format!("{:#}", e)),
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
        }
    }

    if result.is_ok(strict) {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_strict_mode() {
        let mut result = ValidationResult::default();
        assert!(result.is_ok(true));
        result.add_warning("w");
        assert!(result.is_ok(false));
        assert!(!result.is_ok(true));
        result.add_error("e");
        assert!(!result.is_ok(false));
    }

    #[test]
    fn test_missing_initial_file_reported() {
        let dir = tempdir().unwrap();
        let mut config = TransportConfig::default();
        config.mesh.nx = 2;
        config.mesh.ny = 2;
        config.initial.file = Some(dir.path().join("none.txt"));

        let mut result = ValidationResult::default();
        check_inputs(&config, &mut result);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_valid_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(&path, r#"{ "time": { "dt": 5.0, "end_time": 100.0 } }"#).unwrap();
        let mut result = ValidationResult::default();
        let config = validate_config(&path, &mut result).unwrap();
        assert_eq!(config.time.dt, 5.0);
        assert!(result.errors.is_empty());
    }
}

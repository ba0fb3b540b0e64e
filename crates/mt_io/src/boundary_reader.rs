// crates/mt_io/src/boundary_reader.rs

//! 边界条件文件读取
//!
//! 每行一条记录：
//!
//! ```text
//! <key> <node> <v>                      # 常数
//! <key> <node> <t0> <v0> <t1> <v1> ...  # 分段线性时间序列
//! ```
//!
//! 键不在掩码中的记录跳过，其余记录保持文件顺序。

use crate::error::{IoError, IoResult};
use mt_physics::{BoundaryKind, BoundarySpec, TimeFunction, TimeSeries};
use std::path::Path;

/// 注释前缀
const COMMENT_PREFIX: char = '#';

/// 由键名列表构造掩码
///
/// 未知键报错。
pub fn parse_key_mask(keys: &[String]) -> IoResult<Vec<BoundaryKind>> {
    let mut mask = Vec::with_capacity(keys.len());
    for key in keys {
        let kind = BoundaryKind::from_key(key.trim()).ok_or_else(|| {
            IoError::format(
                "boundary.keys",
                format!(
                    "未知边界键 '{}'，可用: {}",
                    key,
                    BoundaryKind::ALL.map(|k| k.key()).join(", ")
                ),
            )
        })?;
        if !mask.contains(&kind) {
            mask.push(kind);
        }
    }
    Ok(mask)
}

/// 读取边界条件文件
pub fn read_boundary_file(
    path: impl AsRef<Path>,
    mask: &[BoundaryKind],
    n_nodes: usize,
) -> IoResult<Vec<BoundarySpec>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| IoError::access(path, e))?;
    let specs = parse_boundary_text(&content, &path.display().to_string(), mask, n_nodes)?;
    log::info!("边界条件: {} ({} 条)", path.display(), specs.len());
    Ok(specs)
}

/// 解析边界条件文本
pub fn parse_boundary_text(
    content: &str,
    file: &str,
    mask: &[BoundaryKind],
    n_nodes: usize,
) -> IoResult<Vec<BoundarySpec>> {
    let mut specs = Vec::new();
    let mut skipped = 0usize;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw.find(COMMENT_PREFIX) {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let key = fields.next().unwrap_or_default();
        let kind = match BoundaryKind::from_key(key) {
            Some(kind) if mask.contains(&kind) => kind,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let node_field = fields
            .next()
            .ok_or_else(|| IoError::parse(file, line_no, "缺少节点号"))?;
        let node: usize = node_field
            .parse()
            .map_err(|_| IoError::parse(file, line_no, format!("无效节点号: {}", node_field)))?;
        if node >= n_nodes {
            return Err(IoError::parse(
                file,
                line_no,
                format!("节点号 {} 超出范围 0..{}", node, n_nodes),
            ));
        }

        let numbers = fields
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| IoError::parse(file, line_no, format!("无效数值: {}", s)))
            })
            .collect::<IoResult<Vec<f64>>>()?;
        check_values(kind, &numbers, file, line_no)?;

        let function = match numbers.len() {
            0 => return Err(IoError::parse(file, line_no, "缺少边界值")),
            1 => TimeFunction::Constant(numbers[0]),
            n if n % 2 == 1 => {
                return Err(IoError::parse(
                    file,
                    line_no,
                    format!("时间序列需成对的 (t, v)，实际 {} 个数", n),
                ))
            }
            _ => {
                let (times, values): (Vec<f64>, Vec<f64>) =
                    numbers.chunks_exact(2).map(|p| (p[0], p[1])).unzip();
                let series = TimeSeries::new(times, values)
                    .map_err(|e| IoError::parse(file, line_no, e.to_string()))?;
                TimeFunction::series(series)
            }
        };

        specs.push(BoundarySpec::new(kind, node, function));
    }

    if skipped > 0 {
        log::debug!("{}: 跳过 {} 条未选中的记录", file, skipped);
    }
    Ok(specs)
}

/// 数值须有限；浓度类记录的取值（常数或序列中的 v）不得为负
fn check_values(kind: BoundaryKind, numbers: &[f64], file: &str, line_no: usize) -> IoResult<()> {
    if let Some(bad) = numbers.iter().find(|v| !v.is_finite()) {
        return Err(IoError::parse(file, line_no, format!("非有限数值: {}", bad)));
    }
    if !matches!(kind, BoundaryKind::Concentration | BoundaryKind::SourceConcentration) {
        return Ok(());
    }
    let values: Vec<f64> = if numbers.len() == 1 {
        numbers.to_vec()
    } else {
        numbers.iter().skip(1).step_by(2).copied().collect()
    };
    match values.iter().find(|&&v| v < 0.0) {
        Some(v) => Err(IoError::parse(file, line_no, format!("浓度不得为负: {}", v))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> Vec<BoundaryKind> {
        BoundaryKind::ALL.to_vec()
    }

    #[test]
    fn test_constant_and_series() {
        let text = "\
# 西边界
concentration 0 35.0
concentration 3 0 10 100 20   # 升高
point_source 5 0.5
";
        let specs = parse_boundary_text(text, "bc.txt", &all(), 6).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].node, 0);
        assert_eq!(specs[0].function.value(1e6), 35.0);
        assert_eq!(specs[1].function.value(50.0), 15.0);
        assert!((specs[1].function.derivative(50.0) - 0.1).abs() < 1e-12);
        assert_eq!(specs[2].kind, BoundaryKind::PointSource);
    }

    #[test]
    fn test_mask_and_unknown_keys_skipped() {
        let text = "concentration 0 1\nwater_level 1 2\nsource_concentration 2 3\n";
        let specs =
            parse_boundary_text(text, "bc.txt", &[BoundaryKind::SourceConcentration], 3).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].node, 2);
    }

    #[test]
    fn test_odd_series_rejected() {
        let err = parse_boundary_text("concentration 0 0 1 10\n", "bc.txt", &all(), 1).unwrap_err();
        assert!(matches!(err, IoError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_negative_or_nan_concentration_rejected() {
        for text in [
            "concentration 0 -1.0\n",
            "concentration 0 NaN\n",
            "source_concentration 0 0 5 10 -2\n",
            "point_source 0 inf\n",
        ] {
            let err = parse_boundary_text(text, "bc.txt", &all(), 1).unwrap_err();
            assert!(matches!(err, IoError::Parse { line: 1, .. }), "{text}");
        }
        // 点源流量可为负（汇），序列时间可为负
        let specs =
            parse_boundary_text("point_source 0 -0.5\nconcentration 0 -10 1 10 2\n", "bc.txt", &all(), 1)
                .unwrap();
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn test_node_out_of_range() {
        assert!(parse_boundary_text("concentration 4 1\n", "bc.txt", &all(), 4).is_err());
    }

    #[test]
    fn test_key_mask() {
        let keys = vec!["point_source".to_string(), "concentration".to_string()];
        assert_eq!(
            parse_key_mask(&keys).unwrap(),
            vec![BoundaryKind::PointSource, BoundaryKind::Concentration]
        );
        assert!(parse_key_mask(&["flux".to_string()]).is_err());
    }
}

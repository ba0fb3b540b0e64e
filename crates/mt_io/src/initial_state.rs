// crates/mt_io/src/initial_state.rs

//! 初始场读取
//!
//! 两种格式：
//!
//! - 文本：首行为边界节点数与内部节点数，其后每节点一行
//!   `id f1 f2 value`（空白或逗号分隔，f1/f2 忽略，id 从 0 开始）
//! - 二进制（大端）：
//!
//! ```text
//! magic "MTIS" | version u32 | flags u32 | n_points u32
//! 每点: [id u32] [x y z f64] value f64 [status u8]
//! ```
//!
//! 任何错误都使整个文件作废，不做部分加载。

use crate::error::{IoError, IoResult};
use mt_config::InitialFormat;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 二进制魔数
pub const INITIAL_MAGIC: &[u8; 4] = b"MTIS";

/// 当前二进制版本
pub const INITIAL_VERSION: u32 = 2;

/// 支持的最低版本
pub const MIN_INITIAL_VERSION: u32 = 1;

/// 二进制每点字段标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialFlags(pub u32);

impl InitialFlags {
    /// 每点带节点号
    pub const POINT_NUMBERS: u32 = 1;
    /// 每点带坐标
    pub const COORDINATES: u32 = 2;
    /// 每点带状态字节（版本 2 起）
    pub const STATUS: u32 = 4;

    /// 是否含某标志
    #[inline]
    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }
}

/// 按配置格式加载初始场
pub fn load_initial(path: impl AsRef<Path>, format: InitialFormat, n_nodes: usize) -> IoResult<Vec<f64>> {
    let path = path.as_ref();
    let values = match format {
        InitialFormat::Text => read_initial_text(path, n_nodes)?,
        InitialFormat::Binary => read_initial_binary(path, n_nodes)?,
    };
    log::info!("初始场: {} ({} 节点, {:?})", path.display(), values.len(), format);
    Ok(values)
}

// ============================================================
// 文本
// ============================================================

/// 读取文本初始场文件
pub fn read_initial_text(path: impl AsRef<Path>, n_nodes: usize) -> IoResult<Vec<f64>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| IoError::access(path, e))?;
    parse_initial_text(&content, &path.display().to_string(), n_nodes)
}

/// 解析文本初始场
///
/// 空行与 `#` 开头的行跳过。
pub fn parse_initial_text(content: &str, file: &str, n_nodes: usize) -> IoResult<Vec<f64>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| IoError::parse(file, 1, "缺少节点数文件头"))?;
    let counts = split_fields(header);
    if counts.len() < 2 {
        return Err(IoError::parse(file, header_line, "文件头应为: 边界节点数 内部节点数"));
    }
    let n_boundary = parse_count(counts[0], file, header_line)?;
    let n_interior = parse_count(counts[1], file, header_line)?;
    if n_boundary.checked_add(n_interior) != Some(n_nodes) {
        return Err(IoError::parse(
            file,
            header_line,
            format!(
                "节点数 {} + {} 与网格节点数 {} 不一致",
                n_boundary, n_interior, n_nodes
            ),
        ));
    }

    let mut values = vec![f64::NAN; n_nodes];
    let mut seen = vec![false; n_nodes];
    let mut count = 0;

    for (line_no, line) in lines {
        let fields = split_fields(line);
        if fields.len() < 4 {
            return Err(IoError::parse(
                file,
                line_no,
                format!("应有 4 列 (id f1 f2 value)，实际 {} 列", fields.len()),
            ));
        }

        let id: usize = fields[0]
            .parse()
            .map_err(|_| IoError::parse(file, line_no, format!("无效节点号: {}", fields[0])))?;
        if id >= n_nodes {
            return Err(IoError::parse(
                file,
                line_no,
                format!("节点号 {} 超出范围 0..{}", id, n_nodes),
            ));
        }
        if seen[id] {
            return Err(IoError::parse(file, line_no, format!("节点 {} 重复", id)));
        }

        let value: f64 = fields[3]
            .parse()
            .map_err(|_| IoError::parse(file, line_no, format!("无效数值: {}", fields[3])))?;
        check_value(value).map_err(|msg| IoError::parse(file, line_no, msg))?;

        values[id] = value;
        seen[id] = true;
        count += 1;
    }

    if count != n_nodes {
        return Err(IoError::NodeCountMismatch {
            expected: n_nodes,
            found: count,
        });
    }
    Ok(values)
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_count(s: &str, file: &str, line: usize) -> IoResult<usize> {
    s.parse()
        .map_err(|_| IoError::parse(file, line, format!("无效节点数: {}", s)))
}

fn check_value(value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("初值非有限: {}", value));
    }
    if value < 0.0 {
        return Err(format!("初值为负: {}", value));
    }
    Ok(())
}

// ============================================================
// 二进制
// ============================================================

/// 读取二进制初始场文件
pub fn read_initial_binary(path: impl AsRef<Path>, n_nodes: usize) -> IoResult<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::access(path, e))?;
    let mut reader = BinaryReader {
        inner: BufReader::new(file),
        file: path.display().to_string(),
    };

    let mut magic = [0u8; 4];
    reader.read_bytes(&mut magic)?;
    if &magic != INITIAL_MAGIC {
        return Err(IoError::format(&reader.file, "魔数不匹配，不是初始场文件"));
    }

    let version = reader.read_u32()?;
    if !(MIN_INITIAL_VERSION..=INITIAL_VERSION).contains(&version) {
        return Err(IoError::format(
            &reader.file,
            format!(
                "不支持的版本 {}，支持 {}..={}",
                version, MIN_INITIAL_VERSION, INITIAL_VERSION
            ),
        ));
    }

    let flags = InitialFlags(reader.read_u32()?);
    let n_points = reader.read_u32()? as usize;
    if n_points != n_nodes {
        return Err(IoError::NodeCountMismatch {
            expected: n_nodes,
            found: n_points,
        });
    }

    let has_status = flags.has(InitialFlags::STATUS) && version >= 2;
    let mut values = vec![f64::NAN; n_nodes];
    let mut seen = vec![false; n_nodes];

    for k in 0..n_points {
        let id = if flags.has(InitialFlags::POINT_NUMBERS) {
            reader.read_u32()? as usize
        } else {
            k
        };
        if flags.has(InitialFlags::COORDINATES) {
            for _ in 0..3 {
                reader.read_f64()?;
            }
        }
        let value = reader.read_f64()?;
        if has_status {
            reader.read_u8()?;
        }

        if id >= n_nodes {
            return Err(IoError::format(
                &reader.file,
                format!("第 {} 点节点号 {} 超出范围", k, id),
            ));
        }
        if seen[id] {
            return Err(IoError::format(&reader.file, format!("节点 {} 重复", id)));
        }
        check_value(value)
            .map_err(|msg| IoError::format(&reader.file, format!("节点 {}: {}", id, msg)))?;
        values[id] = value;
        seen[id] = true;
    }

    Ok(values)
}

/// 二进制初始场内容
#[derive(Debug, Clone, Default)]
pub struct BinaryInitialState {
    /// 每节点初值
    pub values: Vec<f64>,
    /// 节点坐标（可选）
    pub coordinates: Option<Vec<[f64; 3]>>,
    /// 是否写节点号
    pub point_numbers: bool,
    /// 状态字节（可选）
    pub status: Option<Vec<u8>>,
}

impl BinaryInitialState {
    /// 仅含初值
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    fn flags(&self) -> InitialFlags {
        let mut bits = 0;
        if self.point_numbers {
            bits |= InitialFlags::POINT_NUMBERS;
        }
        if self.coordinates.is_some() {
            bits |= InitialFlags::COORDINATES;
        }
        if self.status.is_some() {
            bits |= InitialFlags::STATUS;
        }
        InitialFlags(bits)
    }
}

/// 写出二进制初始场文件（当前版本）
pub fn write_initial_binary(path: impl AsRef<Path>, state: &BinaryInitialState) -> IoResult<()> {
    let path = path.as_ref();
    let n = state.values.len();
    if let Some(coords) = &state.coordinates {
        if coords.len() != n {
            return Err(IoError::NodeCountMismatch { expected: n, found: coords.len() });
        }
    }
    if let Some(status) = &state.status {
        if status.len() != n {
            return Err(IoError::NodeCountMismatch { expected: n, found: status.len() });
        }
    }

    let file = File::create(path).map_err(|e| IoError::access(path, e))?;
    let mut writer = BufWriter::new(file);
    let io = |e| IoError::access(path, e);

    writer.write_all(INITIAL_MAGIC).map_err(io)?;
    writer.write_all(&INITIAL_VERSION.to_be_bytes()).map_err(io)?;
    writer.write_all(&state.flags().0.to_be_bytes()).map_err(io)?;
    writer.write_all(&(n as u32).to_be_bytes()).map_err(io)?;

    for (i, &value) in state.values.iter().enumerate() {
        if state.point_numbers {
            writer.write_all(&(i as u32).to_be_bytes()).map_err(io)?;
        }
        if let Some(coords) = &state.coordinates {
            for c in coords[i] {
                writer.write_all(&c.to_be_bytes()).map_err(io)?;
            }
        }
        writer.write_all(&value.to_be_bytes()).map_err(io)?;
        if let Some(status) = &state.status {
            writer.write_all(&[status[i]]).map_err(io)?;
        }
    }

    writer.flush().map_err(io)?;
    Ok(())
}

/// 大端读取辅助
struct BinaryReader<R: Read> {
    inner: R,
    file: String,
}

impl<R: Read> BinaryReader<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> IoResult<()> {
        self.inner
            .read_exact(buf)
            .map_err(|e| IoError::format(&self.file, format!("文件意外结束: {}", e)))
    }

    fn read_u8(&mut self) -> IoResult<u8> {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u32(&mut self) -> IoResult<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_f64(&mut self) -> IoResult<f64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }
}

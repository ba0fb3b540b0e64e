// crates/mt_io/src/result_writer.rs

//! 结果流
//!
//! 无文件头的定长记录流，所有数值为大端 `f32`：
//!
//! ```text
//! record := time: f32 BE, value[0]: f32 BE, ..., value[n-1]: f32 BE
//! ```
//!
//! 记录长度由节点数决定，读取端必须事先知道节点数。

use crate::error::{IoError, IoResult};
use mt_foundation::{MtError, MtResult};
use mt_physics::ResultSink;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// 单个数值的字节数
const VALUE_BYTES: usize = 4;

/// 一条记录的字节数
pub fn record_size(n_dofs: usize) -> usize {
    VALUE_BYTES * (n_dofs + 1)
}

// ============================================================
// 写出
// ============================================================

/// 结果流写出器
pub struct ResultWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    n_dofs: usize,
    records: usize,
    buffer: Vec<u8>,
}

impl ResultWriter {
    /// 创建结果文件
    ///
    /// 文件无法创建时返回资源错误。
    pub fn create(path: impl AsRef<Path>, n_dofs: usize) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| IoError::access(&path, e))?;
        log::debug!("结果流: {} ({} 节点/记录)", path.display(), n_dofs);
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            n_dofs,
            records: 0,
            buffer: Vec::with_capacity(record_size(n_dofs)),
        })
    }

    /// 写出一条记录
    pub fn write(&mut self, time: f64, values: &[f64]) -> IoResult<()> {
        if values.len() != self.n_dofs {
            return Err(IoError::NodeCountMismatch {
                expected: self.n_dofs,
                found: values.len(),
            });
        }

        self.buffer.clear();
        self.buffer.extend_from_slice(&(time as f32).to_be_bytes());
        for &v in values {
            self.buffer.extend_from_slice(&(v as f32).to_be_bytes());
        }
        self.writer
            .write_all(&self.buffer)
            .map_err(|e| IoError::access(&self.path, e))?;
        self.records += 1;
        Ok(())
    }

    /// 已写记录数
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// 每条记录的节点数
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 刷新缓冲区
    pub fn flush(&mut self) -> IoResult<()> {
        self.writer.flush().map_err(|e| IoError::access(&self.path, e))
    }

    /// 刷新并关闭，返回记录数
    pub fn finish(mut self) -> IoResult<usize> {
        self.flush()?;
        Ok(self.records)
    }
}

impl ResultSink for ResultWriter {
    fn write_record(&mut self, time: f64, values: &[f64]) -> MtResult<()> {
        self.write(time, values).map_err(MtError::from)
    }
}

// ============================================================
// 读取
// ============================================================

/// 一条结果记录
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    /// 时刻
    pub time: f32,
    /// 节点值
    pub values: Vec<f32>,
}

/// 结果流读取器
pub struct ResultReader {
    path: PathBuf,
    reader: BufReader<File>,
    n_dofs: usize,
    buffer: Vec<u8>,
}

impl ResultReader {
    /// 打开结果文件
    pub fn open(path: impl AsRef<Path>, n_dofs: usize) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| IoError::access(&path, e))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            n_dofs,
            buffer: vec![0u8; record_size(n_dofs)],
        })
    }

    /// 按文件长度推算记录数
    ///
    /// 长度不是记录长度整数倍时报格式错误。
    pub fn count_records(path: impl AsRef<Path>, n_dofs: usize) -> IoResult<usize> {
        let path = path.as_ref();
        let len = std::fs::metadata(path)
            .map_err(|e| IoError::access(path, e))?
            .len() as usize;
        let size = record_size(n_dofs);
        if len % size != 0 {
            return Err(IoError::format(
                path.display().to_string(),
                format!("长度 {} 字节不是记录长度 {} 的整数倍", len, size),
            ));
        }
        Ok(len / size)
    }

    /// 读取下一条记录，文件结束时返回 `None`
    pub fn next_record(&mut self) -> IoResult<Option<ResultRecord>> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(IoError::access(&self.path, e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.buffer.len() {
            return Err(IoError::format(
                self.path.display().to_string(),
                format!("末尾记录不完整: {} / {} 字节", filled, self.buffer.len()),
            ));
        }

        let mut chunks = self.buffer.chunks_exact(VALUE_BYTES).map(|c| {
            f32::from_be_bytes([c[0], c[1], c[2], c[3]])
        });
        let time = chunks.next().unwrap_or(f32::NAN);
        let values: Vec<f32> = chunks.collect();
        Ok(Some(ResultRecord { time, values }))
    }

    /// 读取全部剩余记录
    pub fn read_all(&mut self) -> IoResult<Vec<ResultRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// 每条记录的节点数
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }
}

impl Iterator for ResultReader {
    type Item = IoResult<ResultRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

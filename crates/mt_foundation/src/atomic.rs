// crates/mt_foundation/src/atomic.rs

//! f64 原子累加
//!
//! 标准库没有 `AtomicF64`，这里以 `AtomicU64` 存储位模式，
//! 用 compare-exchange 循环实现浮点加法。多个单元并行向同一节点
//! 散射残差时，每个节点一个原子量即可保证逐节点串行化。

use std::sync::atomic::{AtomicU64, Ordering};

/// 原子 f64
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// 创建原子量
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// 读取当前值
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// 写入新值
    #[inline]
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// 原子加法，返回加之前的值
    #[inline]
    pub fn fetch_add(&self, val: f64) -> f64 {
        let mut old = self.bits.load(Ordering::Relaxed);
        loop {
            let old_f = f64::from_bits(old);
            let new_f = old_f + val;
            match self.bits.compare_exchange_weak(
                old,
                new_f.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return old_f,
                Err(x) => old = x,
            }
        }
    }

    /// 独占访问时直接取值
    #[inline]
    pub fn get_mut(&mut self) -> f64 {
        f64::from_bits(*self.bits.get_mut())
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

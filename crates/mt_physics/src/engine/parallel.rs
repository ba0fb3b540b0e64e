// crates/mt_physics/src/engine/parallel.rs

//! 工作线程池
//!
//! 每个输运模型持有独立的 rayon 线程池，各阶段的并行迭代都在其中执行，
//! 不占用全局线程池。

use mt_foundation::{MtError, MtResult};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// 创建线程池，`num_threads == 0` 时使用 rayon 默认线程数
pub fn build_thread_pool(num_threads: usize) -> MtResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("mt-worker-{}", i))
        .build()
        .map_err(|e| MtError::internal(format!("线程池创建失败: {}", e)))
}

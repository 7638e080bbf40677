// Split of a fixed workload over threads
// 固定工作量在线程间的划分

use crate::{Error, Result};

/// Per-thread share of `total_actions`, remainder dropped
/// `total_actions` 的每线程份额，余数丢弃
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
  pub threads: usize,
  pub per_thread: u64,
}

impl Split {
  pub fn new(total_actions: u64, threads: usize) -> Result<Self> {
    if threads == 0 {
      return Err(Error::conf("threads_count must be > 0"));
    }
    Ok(Self {
      threads,
      per_thread: total_actions / threads as u64,
    })
  }

  /// Actions actually executed / 实际执行的操作数
  #[inline]
  pub fn total(&self) -> u64 {
    self.per_thread * self.threads as u64
  }
}

// Workload drivers
// 负载驱动

use std::time::Duration;

use bench_record::Attrs;

use crate::{Result, Split};

pub mod binary;
pub mod sql;

/// Elapsed time of one sweep point / 单个扫描点的耗时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
  pub elapsed: Duration,
}

impl Measure {
  pub fn duration_ms(&self) -> f64 {
    self.elapsed.as_secs_f64() * 1000.0
  }

  /// Actions per second, 0 for a zero duration / 每秒操作数，耗时为 0 时返回 0
  pub fn per_second(&self, actions: u64) -> f64 {
    let secs = self.elapsed.as_secs_f64();
    if secs > 0.0 { actions as f64 / secs } else { 0.0 }
  }
}

/// Backend that runs a fixed insert workload and reports its duration
/// 执行固定插入负载并返回耗时的后端
///
/// One call per sweep point, calls never overlap.
/// 每个扫描点调用一次，调用互不重叠。
pub trait Driver {
  /// Stored as the `target` attribute / 记录为 `target` 属性
  fn name(&self) -> &str;

  /// Backend configuration that tells sweep points apart
  /// 用于区分扫描点的后端配置
  fn attrs(&self) -> Attrs {
    Attrs::new()
  }

  fn run(&mut self, split: Split) -> Result<Measure>;
}

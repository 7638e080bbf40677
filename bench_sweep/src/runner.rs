// Sequential sweep over concurrency levels and drivers
// 按并发度与驱动顺序扫描

use std::path::{Path, PathBuf};

use bench_record::{Attrs, BenchmarkRecord, Ctx, Store};
use chrono::Local;
use log::{info, warn};

use crate::{Driver, Error, Measure, Result, Split};

/// Sweep configuration / 扫描配置
#[derive(Debug, Clone)]
pub struct SweepConf {
  /// Fixed across all points / 所有扫描点保持一致
  pub total_actions: u64,
  pub threads: Vec<usize>,
  pub out_dir: PathBuf,
  pub disk: String,
}

impl Default for SweepConf {
  fn default() -> Self {
    Self {
      total_actions: 1_000_000,
      threads: std::iter::once(1).chain((1..12).map(|i| i * 10)).collect(),
      out_dir: PathBuf::from("docs/record"),
      disk: "hdd".into(),
    }
  }
}

impl SweepConf {
  pub fn total_actions(mut self, n: u64) -> Self {
    self.total_actions = n;
    self
  }

  pub fn threads(mut self, threads: Vec<usize>) -> Self {
    self.threads = threads;
    self
  }

  pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.out_dir = dir.into();
    self
  }

  pub fn disk(mut self, disk: impl Into<String>) -> Self {
    self.disk = disk.into();
    self
  }

  /// Workload split of every concurrency level / 每个并发度的负载划分
  pub fn splits(&self) -> Result<Vec<Split>> {
    if self.threads.is_empty() {
      return Err(Error::conf("empty thread count list"));
    }
    self
      .threads
      .iter()
      .map(|&t| Split::new(self.total_actions, t))
      .collect()
  }
}

/// Wrap one measurement into a record / 将一次测量包装为记录
pub fn record_for(ctx: &Ctx, driver: &dyn Driver, split: Split, m: Measure) -> BenchmarkRecord {
  let total = split.total();
  let mut attrs: Attrs = driver.attrs();
  attrs.insert("target".into(), driver.name().into());
  attrs.insert("total_actions".into(), total.into());
  attrs.insert("threads_count".into(), split.threads.into());
  attrs.insert("action_per_thread".into(), split.per_thread.into());

  let mut result = Attrs::new();
  result.insert("duration_ms".into(), m.duration_ms().into());
  result.insert("insert_per_second".into(), m.per_second(total).into());
  ctx.record(attrs, result)
}

/// Sweep runner / 扫描运行器
pub struct Runner {
  conf: SweepConf,
  ctx: Ctx,
}

impl Runner {
  pub fn new(conf: SweepConf, ctx: Ctx) -> Self {
    Self { conf, ctx }
  }

  /// Context read from the git repository at `repo`
  /// 从 `repo` 处 git 仓库读取上下文
  pub fn detect(conf: SweepConf, repo: &Path) -> Self {
    let ctx = Ctx::detect(repo, conf.disk.as_str());
    Self::new(conf, ctx)
  }

  pub fn conf(&self) -> &SweepConf {
    &self.conf
  }

  /// One driver call per (threads, driver) point, first error aborts
  /// 每个（线程数，驱动）点调用一次驱动，遇错即止
  pub fn run(&self, drivers: &mut [Box<dyn Driver>]) -> Result<Vec<BenchmarkRecord>> {
    let splits = self.conf.splits()?;
    let mut records = Vec::with_capacity(splits.len() * drivers.len());
    for split in splits {
      if split.per_thread == 0 {
        warn!(
          "{} actions over {} threads leaves no work",
          self.conf.total_actions,
          split.threads
        );
      }
      for d in drivers.iter_mut() {
        info!("{} threads={} actions={}", d.name(), split.threads, split.total());
        let m = d.run(split)?;
        let r = record_for(&self.ctx, &**d, split, m);
        info!(
          "{} threads={} {:.2?} {:.0} insert/s",
          d.name(),
          split.threads,
          m.elapsed,
          m.per_second(split.total())
        );
        records.push(r);
      }
    }
    Ok(records)
  }

  /// Run the sweep, then write all records in one file
  /// 执行扫描，然后将全部记录写入一个文件
  pub fn sweep(&self, drivers: &mut [Box<dyn Driver>]) -> Result<PathBuf> {
    let start = Local::now();
    let records = self.run(drivers)?;
    let store = Store::new(&self.conf.out_dir);
    Ok(store.dump(&records, &start)?)
  }
}

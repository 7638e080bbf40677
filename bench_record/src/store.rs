//! Result files / 结果文件
//!
//! One file per sweep, named after the sweep start time, e.g.
//! `benchmark_20240527_220536.json`. Sweeps started within the same second get
//! `_1`, `_2`, ... after the stamp. A file is written once and never touched
//! again.
//! 每次扫描一个文件，以扫描开始时间命名。同一秒内开始的扫描在时间戳后追加
//! `_1`、`_2` 等序号。文件只写一次，之后不再修改。

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use log::info;

use crate::{BenchmarkRecord, Error, Result};

pub const FILE_PREFIX: &str = "benchmark_";
/// Timestamp format embedded in file names / 文件名中的时间戳格式
pub const TIME_FMT: &str = "%Y%m%d_%H%M%S";

/// Upper bound of `_<seq>` suffixes tried for one second / 同一秒内尝试的序号上限
pub const MAX_SEQ: u32 = 1024;

/// File name for a sweep started at `start` / 扫描结果文件名
pub fn file_name(start: &DateTime<Local>) -> String {
  seq_name(start, 0)
}

/// `seq` 0 is the plain name / `seq` 为 0 时即为无序号名称
pub fn seq_name(start: &DateTime<Local>, seq: u32) -> String {
  let stamp = start.format(TIME_FMT);
  if seq == 0 {
    format!("{FILE_PREFIX}{stamp}.json")
  } else {
    format!("{FILE_PREFIX}{stamp}_{seq}.json")
  }
}

/// Directory of result files / 结果文件目录
#[derive(Debug, Clone)]
pub struct Store {
  dir: PathBuf,
}

impl Store {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Write all records of a sweep in one new file, existing files are never
  /// touched
  /// 将一次扫描的全部记录写入一个新文件，已有文件不会被改动
  pub fn dump(&self, records: &[BenchmarkRecord], start: &DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(&self.dir)?;
    let json = sonic_rs::to_string_pretty(records)?;
    let tmp = self
      .dir
      .join(format!("{}.{}.tmp", file_name(start), std::process::id()));
    fs::write(&tmp, json)?;

    let linked = self.link(&tmp, start);
    let _ = fs::remove_file(&tmp);
    let dst = linked?;

    info!("{} records saved: {}", records.len(), dst.display());
    Ok(dst)
  }

  /// hard_link fails if the name is taken, then the next seq is tried
  /// 名称已占用时 hard_link 失败，继续尝试下一个序号
  fn link(&self, tmp: &Path, start: &DateTime<Local>) -> Result<PathBuf> {
    for seq in 0..MAX_SEQ {
      let dst = self.dir.join(seq_name(start, seq));
      match fs::hard_link(tmp, &dst) {
        Ok(()) => return Ok(dst),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
        Err(e) => return Err(e.into()),
      }
    }
    Err(Error::Exists(self.dir.join(file_name(start))))
  }
}

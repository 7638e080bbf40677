// Locate and decode the latest result file
// 定位并解码最新结果文件

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::NaiveDateTime;

use crate::{BenchmarkRecord, Error, Result, SCHEMA, TIME_FMT};

/// `YYYYmmdd_HHMMSS`
const STAMP_LEN: usize = 15;

fn is_stamp(b: &[u8]) -> bool {
  b.iter().enumerate().all(|(i, c)| {
    if i == 8 {
      *c == b'_'
    } else {
      c.is_ascii_digit()
    }
  })
}

fn stamp(name: &str) -> Option<(usize, NaiveDateTime)> {
  let b = name.as_bytes();
  if b.len() < STAMP_LEN {
    return None;
  }
  (0..=b.len() - STAMP_LEN)
    .filter(|&i| is_stamp(&b[i..i + STAMP_LEN]))
    // ascii window, slicing is on char boundary / ascii 窗口，切片位于字符边界
    .find_map(|i| {
      NaiveDateTime::parse_from_str(&name[i..i + STAMP_LEN], TIME_FMT)
        .ok()
        .map(|tm| (i + STAMP_LEN, tm))
    })
}

/// First valid timestamp embedded in a file name
/// 文件名中的第一个有效时间戳
pub fn file_time(name: &str) -> Option<NaiveDateTime> {
  stamp(name).map(|(_, tm)| tm)
}

/// Ordering key: stamp, then the `_<seq>` right after it (0 if absent)
/// 排序键：时间戳，其次是紧随其后的 `_<seq>`（缺省为 0）
fn file_key(name: &str) -> Option<(NaiveDateTime, u32)> {
  let (end, tm) = stamp(name)?;
  let seq = name[end..]
    .strip_prefix('_')
    .and_then(|rest| rest.split('.').next())
    .and_then(|n| n.parse().ok())
    .unwrap_or(0);
  Some((tm, seq))
}

/// Latest `.json` result file in `dir`, ordered by file name only
/// `dir` 中最新的 `.json` 结果文件，仅按文件名排序
pub fn latest(dir: &Path) -> Result<PathBuf> {
  let mut best: Option<((NaiveDateTime, u32), PathBuf)> = None;
  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let name = entry.file_name();
    let Some(key) = name
      .to_str()
      .filter(|n| n.ends_with(".json"))
      .and_then(file_key)
    else {
      continue;
    };
    if best.as_ref().is_none_or(|(b, _)| key > *b) {
      best = Some((key, entry.path()));
    }
  }
  best
    .map(|(_, p)| p)
    .ok_or_else(|| Error::NoReport(dir.to_path_buf()))
}

/// Decode records, rejecting unknown schema versions
/// 解码记录，拒绝未知模式版本
pub fn load(path: &Path) -> Result<Vec<BenchmarkRecord>> {
  let json = fs::read_to_string(path)?;
  let records: Vec<BenchmarkRecord> = sonic_rs::from_str(&json)?;
  if let Some(r) = records.iter().find(|r| r.schema != SCHEMA) {
    return Err(Error::Schema {
      path: path.to_path_buf(),
      found: r.schema,
      expect: SCHEMA,
    });
  }
  Ok(records)
}

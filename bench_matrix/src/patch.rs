//! Marked-region patcher
//! 标记区域改写
//!
//! Replace lines between a start marker line and an end marker line, keep
//! everything outside the pair byte for byte. Marker lines are matched after
//! trimming surrounding whitespace.
//! 替换起止标记行之间的内容，标记外的内容逐字节保留。标记行按去除首尾空白后匹配。

use std::{fs, path::Path};

use log::warn;

use crate::{Error, Result};

/// Outcome of a patch / 改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patched {
  /// Region replaced, new text / 区域已替换，新文本
  Updated(String),
  /// Region already holds the content / 区域内容已一致
  Unchanged,
  /// Markers absent or out of order, nothing done / 标记缺失或顺序错误，未改动
  Missing,
}

fn find(lines: &[&str], marker: &str) -> Result<Option<usize>> {
  let mut found = None;
  for (i, line) in lines.iter().enumerate() {
    if line.trim() == marker {
      if found.is_some() {
        return Err(Error::DupMarker(marker.into()));
      }
      found = Some(i);
    }
  }
  Ok(found)
}

/// Patch text in memory / 在内存中改写文本
pub fn patch_str(text: &str, start: &str, end: &str, content: &str) -> Result<Patched> {
  let lines: Vec<&str> = text.split_inclusive('\n').collect();
  let (Some(s), Some(e)) = (find(&lines, start)?, find(&lines, end)?) else {
    return Ok(Patched::Missing);
  };
  if e <= s {
    return Ok(Patched::Missing);
  }

  let mut out = String::with_capacity(text.len() + content.len());
  for line in &lines[..=s] {
    out.push_str(line);
  }
  if !out.ends_with('\n') {
    out.push('\n');
  }
  out.push_str(content);
  if !content.is_empty() && !content.ends_with('\n') {
    out.push('\n');
  }
  for line in &lines[e..] {
    out.push_str(line);
  }

  if out == text {
    Ok(Patched::Unchanged)
  } else {
    Ok(Patched::Updated(out))
  }
}

/// Patch file in place, written only when the region changes
/// 原地改写文件，仅在区域变化时写入
pub fn patch_file(
  path: impl AsRef<Path>,
  start: &str,
  end: &str,
  content: &str,
) -> Result<Patched> {
  let path = path.as_ref();
  let text = fs::read_to_string(path)?;
  let r = patch_str(&text, start, end, content)?;
  match &r {
    Patched::Updated(new) => fs::write(path, new)?,
    Patched::Missing => warn!("markers not found in {}, skip", path.display()),
    Patched::Unchanged => {}
  }
  Ok(r)
}

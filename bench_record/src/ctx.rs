// Host and source context attached to every record
// 附加到每条记录的主机与源码上下文

use std::{path::Path, process::Command};

use chrono::Local;
use log::warn;

use crate::{Attrs, BenchmarkRecord, SCHEMA};

/// Placeholder when commit id cannot be read / 无法读取提交号时的占位符
pub const UNKNOWN: &str = "unknown";

/// Run context / 运行上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctx {
  pub commit_id: String,
  pub os: String,
  /// Disk label such as `hdd`, `ssd` / 磁盘标签
  pub disk: String,
}

impl Ctx {
  pub fn new(commit_id: impl Into<String>, disk: impl Into<String>) -> Self {
    Self {
      commit_id: commit_id.into(),
      os: std::env::consts::OS.into(),
      disk: disk.into(),
    }
  }

  /// Read commit id of the git repository at `repo`
  /// 读取 `repo` 处 git 仓库的提交号
  pub fn detect(repo: &Path, disk: impl Into<String>) -> Self {
    Self::new(commit_id(repo), disk)
  }

  /// Wrap a result into a record stamped now / 将结果包装为以当前时间标记的记录
  pub fn record(&self, mut target_attributes: Attrs, test_result: Attrs) -> BenchmarkRecord {
    target_attributes.insert("os".into(), self.os.as_str().into());
    target_attributes.insert("disk".into(), self.disk.as_str().into());
    BenchmarkRecord {
      schema: SCHEMA,
      commit_id: self.commit_id.clone(),
      start_time: Local::now(),
      target_attributes,
      test_result,
    }
  }
}

fn commit_id(repo: &Path) -> String {
  match Command::new("git")
    .arg("-C")
    .arg(repo)
    .args(["rev-parse", "HEAD"])
    .output()
  {
    Ok(out) if out.status.success() => {
      let id = String::from_utf8_lossy(&out.stdout).trim().to_owned();
      if id.is_empty() { UNKNOWN.into() } else { id }
    }
    Ok(out) => {
      warn!(
        "git rev-parse failed: {}",
        String::from_utf8_lossy(&out.stderr).trim()
      );
      UNKNOWN.into()
    }
    Err(e) => {
      warn!("git not runnable: {e}");
      UNKNOWN.into()
    }
  }
}

//! Compilation option groups / 编译选项组
//!
//! Options file layout / 选项文件格式:
//!
//! ```yaml
//! compilation_options:
//!   - latch_strategy: [tree_latch, page_latch]
//!   - aries_steal: [aries_steal, aries_no_steal]
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{Error, Result};

/// Default options file name / 默认选项文件名
pub const OPTIONS_FILE: &str = "compilation-options.yaml";

/// Record attribute keys written by the sweep itself, unusable as group names
/// 扫描自身写入的记录属性键，不可用作组名
pub const RESERVED: &[&str] = &[
  "target",
  "total_actions",
  "threads_count",
  "action_per_thread",
  "os",
  "disk",
  "features",
  "table",
];

/// Named, ordered set of mutually exclusive labels
/// 命名的、有序的互斥标签集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
  pub name: String,
  pub labels: Vec<String>,
}

impl OptionGroup {
  /// Build and validate a group / 构建并校验选项组
  pub fn new(
    name: impl Into<String>,
    labels: impl IntoIterator<Item = impl Into<String>>,
  ) -> Result<Self> {
    let name = name.into();
    if RESERVED.contains(&name.as_str()) {
      return Err(Error::Reserved(name));
    }
    let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    if labels.is_empty() {
      return Err(Error::EmptyGroup(name));
    }
    for (i, label) in labels.iter().enumerate() {
      if labels[..i].contains(label) {
        return Err(Error::DupLabel {
          group: name,
          label: label.clone(),
        });
      }
    }
    Ok(Self { name, labels })
  }
}

#[derive(Deserialize)]
struct OptionsFile {
  compilation_options: Vec<BTreeMap<String, Vec<String>>>,
}

/// Parse option groups from yaml text, keeping file order
/// 从 yaml 文本解析选项组，保持文件顺序
pub fn parse(yaml: &str) -> Result<Vec<OptionGroup>> {
  let file: OptionsFile = serde_yaml::from_str(yaml)?;
  let mut groups = Vec::with_capacity(file.compilation_options.len());
  for entry in file.compilation_options {
    if entry.len() != 1 {
      return Err(Error::GroupName(entry.len()));
    }
    // len checked above
    if let Some((name, labels)) = entry.into_iter().next() {
      groups.push(OptionGroup::new(name, labels)?);
    }
  }
  Ok(groups)
}

/// Load option groups from file / 从文件加载选项组
pub fn load(path: impl AsRef<Path>) -> Result<Vec<OptionGroup>> {
  let yaml = fs::read_to_string(path)?;
  parse(&yaml)
}

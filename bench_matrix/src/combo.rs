// Cartesian expansion of option groups
// 选项组的笛卡尔积展开

use std::collections::HashSet;

use crate::{Error, OptionGroup, Result};

/// Separator of labels in a target name / 目标名中的标签分隔符
pub const NAME_SEP: &str = "_";
/// Separator of labels in a cargo `--features` argument / `--features` 参数中的分隔符
pub const FLAG_SEP: &str = ", ";

/// One label picked from each group, in group order
/// 每组选一个标签，按组顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combo {
  /// (group name, label) / （组名，标签）
  pub picks: Vec<(String, String)>,
}

impl Combo {
  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.picks.iter().map(|(_, label)| label.as_str())
  }

  /// Target name, e.g. `tree_latch_aries_steal` / 目标名
  pub fn name(&self) -> String {
    self.labels().collect::<Vec<_>>().join(NAME_SEP)
  }

  /// Feature argument for `cargo --features` / cargo 特性参数
  pub fn flags(&self) -> String {
    self.labels().collect::<Vec<_>>().join(FLAG_SEP)
  }

  /// Human readable name, e.g. `test (a, x)` / 可读名称
  pub fn human_name(&self) -> String {
    format!("test ({})", self.flags())
  }
}

/// Expand groups into every combination, rightmost group varying fastest
/// 展开为全部组合，最右侧组变化最快
///
/// No group yields one empty combination, a group without labels yields none.
/// Target names are checked to be distinct.
/// 没有选项组时返回一个空组合，存在无标签的组时返回空列表；目标名保证互不相同。
pub fn expand(groups: &[OptionGroup]) -> Result<Vec<Combo>> {
  if groups.iter().any(|g| g.labels.is_empty()) {
    return Ok(Vec::new());
  }
  if groups.is_empty() {
    return Ok(vec![Combo { picks: Vec::new() }]);
  }

  let total: usize = groups.iter().map(|g| g.labels.len()).product();
  let mut li = Vec::with_capacity(total);
  // Odometer over label indices / 标签下标里程计
  let mut idx = vec![0usize; groups.len()];

  loop {
    let picks = groups
      .iter()
      .zip(&idx)
      .map(|(g, &i)| (g.name.clone(), g.labels[i].clone()))
      .collect();
    li.push(Combo { picks });

    let mut pos = groups.len();
    loop {
      if pos == 0 {
        return check_unique(li);
      }
      pos -= 1;
      idx[pos] += 1;
      if idx[pos] < groups[pos].labels.len() {
        break;
      }
      idx[pos] = 0;
    }
  }
}

fn check_unique(li: Vec<Combo>) -> Result<Vec<Combo>> {
  let mut seen = HashSet::with_capacity(li.len());
  for combo in &li {
    let name = combo.name();
    if !seen.insert(name.clone()) {
      return Err(Error::DupTarget(name));
    }
  }
  Ok(li)
}

// Benchmark record model
// 基准记录模型

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Record schema version written into every record
/// 写入每条记录的模式版本
pub const SCHEMA: u32 = 1;

/// Scalar value of an attribute or a result / 属性或结果的标量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
}

impl Scalar {
  /// Numeric view, `None` for strings and bools / 数值视图
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Int(v) => Some(*v as f64),
      Self::Float(v) => Some(*v),
      Self::Bool(_) | Self::Str(_) => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(v) => write!(f, "{v}"),
      Self::Int(v) => write!(f, "{v}"),
      Self::Float(v) => write!(f, "{v:.2}"),
      Self::Str(v) => f.write_str(v),
    }
  }
}

macro_rules! from_int {
  ($($t:ty),*) => {
    $(
      impl From<$t> for Scalar {
        fn from(v: $t) -> Self {
          Self::Int(v as i64)
        }
      }
    )*
  };
}

from_int!(i32, i64, u32, u64, usize);

impl From<f64> for Scalar {
  fn from(v: f64) -> Self {
    Self::Float(v)
  }
}

impl From<bool> for Scalar {
  fn from(v: bool) -> Self {
    Self::Bool(v)
  }
}

impl From<&str> for Scalar {
  fn from(v: &str) -> Self {
    Self::Str(v.into())
  }
}

impl From<String> for Scalar {
  fn from(v: String) -> Self {
    Self::Str(v)
  }
}

/// Ordered scalar map / 有序标量映射
pub type Attrs = BTreeMap<String, Scalar>;

/// Measured result of one sweep point
/// 单个扫描点的测量结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
  /// Missing in foreign files, decoded as 0 and rejected on load
  /// 外来文件中缺失时解码为 0，加载时拒绝
  #[serde(default)]
  pub schema: u32,
  pub commit_id: String,
  pub start_time: DateTime<Local>,
  /// Sweep coordinate plus host context / 扫描坐标与主机上下文
  pub target_attributes: Attrs,
  /// `duration_ms`, `insert_per_second`, ...
  pub test_result: Attrs,
}

impl BenchmarkRecord {
  pub fn attr(&self, key: &str) -> Option<&Scalar> {
    self.target_attributes.get(key)
  }

  pub fn result(&self, key: &str) -> Option<&Scalar> {
    self.test_result.get(key)
  }
}

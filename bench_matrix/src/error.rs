// Error types for bench_matrix
// bench_matrix 错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("yaml: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("option group must hold exactly one name, got {0}")]
  GroupName(usize),

  #[error("option group name `{0}` is a reserved record attribute")]
  Reserved(String),

  #[error("option group `{0}` has no label")]
  EmptyGroup(String),

  #[error("option group `{group}` repeats label `{label}`")]
  DupLabel { group: String, label: String },

  #[error("target name `{0}` produced twice")]
  DupTarget(String),

  #[error("marker `{0}` appears more than once")]
  DupMarker(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

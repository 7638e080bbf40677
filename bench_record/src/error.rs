// Error types for bench_record
// bench_record 错误类型

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("json: {0}")]
  Json(#[from] sonic_rs::Error),

  #[error("result file already exists: {}", .0.display())]
  Exists(PathBuf),

  #[error("no timestamped report in {}", .0.display())]
  NoReport(PathBuf),

  #[error("{}: record schema {found}, expect {expect}", .path.display())]
  Schema {
    path: PathBuf,
    found: u32,
    expect: u32,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// Error types for bench_sweep
// bench_sweep 错误类型

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("sql: {0}")]
  Sql(#[from] sqlx::Error),

  #[error("record: {0}")]
  Record(#[from] bench_record::Error),

  #[error("matrix: {0}")]
  Matrix(#[from] bench_matrix::Error),

  #[error("{what} unavailable after {waited:?}: {last}")]
  Unavailable {
    what: String,
    waited: Duration,
    last: String,
  },

  #[error("row count {actual}, expect {expect}")]
  RowCount { expect: u64, actual: u64 },

  #[error("process exit {code:?}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
  Exit {
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  #[error("no `ms:<integer>` in output\n{output}")]
  NoTiming { output: String },

  #[error("worker {0} panicked")]
  WorkerPanic(usize),

  #[error("conf: {0}")]
  Conf(Box<str>),
}

impl Error {
  #[inline]
  pub fn conf(msg: impl Into<Box<str>>) -> Self {
    Self::Conf(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

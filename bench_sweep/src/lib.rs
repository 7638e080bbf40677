// Throughput sweep over storage backends
// 存储后端吞吐扫描

#![cfg_attr(docsrs, feature(doc_cfg))]

mod driver;
mod error;
mod retry;
mod runner;
mod split;

pub use driver::{
  Driver, Measure,
  binary::{
    BinaryConf, BinaryDriver, Captured, RESULT_FILE_ENV, debug_command, parse_ms, run_cmd,
  },
  sql::{SqlConf, SqlDriver, valid_ident},
};
pub use error::{Error, Result};
pub use retry::Retry;
pub use runner::{Runner, SweepConf, record_for};
pub use split::Split;

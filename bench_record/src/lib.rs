// Benchmark records and result files
// 基准记录与结果文件

#![cfg_attr(docsrs, feature(doc_cfg))]

mod ctx;
mod error;
mod reader;
mod record;
mod store;
mod summary;

pub use ctx::{Ctx, UNKNOWN};
pub use error::{Error, Result};
pub use reader::{file_time, latest, load};
pub use record::{Attrs, BenchmarkRecord, SCHEMA, Scalar};
pub use store::{FILE_PREFIX, MAX_SEQ, Store, TIME_FMT, file_name, seq_name};
pub use summary::summary;

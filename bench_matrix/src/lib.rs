// Compilation option matrix and build-file generators
// 编译选项矩阵与构建文件生成

#![cfg_attr(docsrs, feature(doc_cfg))]

mod combo;
mod error;
mod gen_file;
mod group;
mod patch;

pub use combo::{Combo, FLAG_SEP, NAME_SEP, expand};
pub use error::{Error, Result};
pub use gen_file::{
  CARGO_TOML, END_LINE, MAKEFILE, START_LINE, cargo_features, make_test, write_build_files,
};
pub use group::{OPTIONS_FILE, OptionGroup, RESERVED, load, parse};
pub use patch::{Patched, patch_file, patch_str};

// Cargo features block and Makefile targets generated from option groups
// 由选项组生成 Cargo 特性块与 Makefile 目标

use std::{fmt::Write, path::Path};

use log::info;

use crate::{Combo, OptionGroup, Patched, Result, expand, patch_file};

pub const START_LINE: &str = "# ===[COMPILATION OPTIONS START]===";
pub const END_LINE: &str = "# ===[COMPILATION OPTIONS END]===";

pub const CARGO_TOML: &str = "Cargo.toml";
pub const MAKEFILE: &str = "Makefile";

/// Feature declarations, one comment line per group
/// 特性声明，每组一行注释
pub fn cargo_features(groups: &[OptionGroup]) -> String {
  let mut s = String::new();
  for g in groups {
    let _ = writeln!(s, "# {}", g.name);
    for label in &g.labels {
      let _ = writeln!(s, "{label} = []");
    }
    s.push('\n');
  }
  s
}

/// `test` aggregate target plus one `test_<name>` target per combination,
/// the empty combination gets no target
/// 汇总 `test` 目标以及每个组合的 `test_<name>` 目标，空组合不生成目标
pub fn make_test(combos: &[Combo]) -> String {
  let combos: Vec<&Combo> = combos.iter().filter(|c| !c.picks.is_empty()).collect();
  let targets: Vec<String> = combos.iter().map(|c| format!("test_{}", c.name())).collect();

  let mut s = String::new();
  let _ = writeln!(s, "test: {}", targets.join(" "));
  s.push('\n');

  for (target, combo) in targets.iter().zip(&combos) {
    let flags = combo.flags();
    let log = format!("{target}.log");
    let _ = writeln!(s, "{target}:");
    let _ = writeln!(s, "\techo \"\" > {log}");
    let _ = writeln!(
      s,
      "\techo \"Running tests with features: {flags}\" | tee -a {log}"
    );
    let _ = writeln!(
      s,
      "\tRUST_LOG=info cargo test --features \"{flags}\" -- --test-threads=1 2>&1 | tee -a {log}"
    );
    s.push('\n');
  }
  s
}

/// Patch `Cargo.toml` and `Makefile` under `root`
/// 改写 `root` 下的 `Cargo.toml` 与 `Makefile`
pub fn write_build_files(root: &Path, groups: &[OptionGroup]) -> Result<[Patched; 2]> {
  let combos = expand(groups)?;
  let cargo = patch_file(
    root.join(CARGO_TOML),
    START_LINE,
    END_LINE,
    &cargo_features(groups),
  )?;
  let make = patch_file(root.join(MAKEFILE), START_LINE, END_LINE, &make_test(&combos))?;
  info!("{} combinations written to {}", combos.len(), root.display());
  Ok([cargo, make])
}

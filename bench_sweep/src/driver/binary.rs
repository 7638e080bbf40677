//! Compiled test binary driver / 编译测试程序驱动
//!
//! Runs `cargo test --features <flags> -- --test-threads=1 --nocapture <test>`
//! with the workload passed through the child's environment. The elapsed time
//! comes from a structured result file when the test writes one, otherwise
//! from the first `ms:<integer>` in its output.
//! 通过子进程环境变量传递负载参数执行 `cargo test`。耗时优先读取结构化结果文件，
//! 否则取输出中第一个 `ms:<integer>`。

use std::{
  fs::{self, OpenOptions},
  io::{BufRead, BufReader, ErrorKind, Read, Write},
  path::PathBuf,
  process::{Command, Stdio},
  thread,
  time::Duration,
};

use bench_matrix::{Combo, FLAG_SEP};
use bench_record::Attrs;
use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;

use crate::{Driver, Error, Measure, Result, Split};

/// Env var holding the structured result file path
/// 存放结构化结果文件路径的环境变量
pub const RESULT_FILE_ENV: &str = "BENCH_RESULT_FILE";

const LOG_ENV: &str = "RUST_LOG";

#[static_init::dynamic]
static MS: Regex = Regex::new(r"ms:(\d+)").expect("ms pattern");

/// First `ms:<integer>` in text / 文本中第一个 `ms:<integer>`
pub fn parse_ms(text: &str) -> Option<u64> {
  MS.captures(text)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse().ok())
}

#[derive(Deserialize)]
struct ResultFile {
  duration_ms: u64,
}

/// Compiled test backend configuration / 编译测试后端配置
#[derive(Debug, Clone)]
pub struct BinaryConf {
  pub program: String,
  /// Crate directory the command runs in / 命令运行目录
  pub dir: PathBuf,
  pub test: String,
  pub features: Vec<String>,
  /// Thread count variable, the name the consumed test reads
  /// 线程数变量名，需与被测程序读取的名称一致
  pub thread_env: String,
  pub action_env: String,
  pub log_level: String,
  pub result_file: Option<PathBuf>,
  /// Append combined output here / 合并输出追加到此文件
  pub log_path: Option<PathBuf>,
}

impl Default for BinaryConf {
  fn default() -> Self {
    Self {
      program: "cargo".into(),
      dir: PathBuf::from("."),
      test: "test_insert_parallel".into(),
      features: vec!["benchmark".into()],
      thread_env: "THREAD_COUNT".into(),
      action_env: "ACTION_PER_THREAD".into(),
      log_level: "info".into(),
      result_file: None,
      log_path: None,
    }
  }
}

impl BinaryConf {
  pub fn program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.dir = dir.into();
    self
  }

  pub fn test(mut self, test: impl Into<String>) -> Self {
    self.test = test.into();
    self
  }

  pub fn features(mut self, features: Vec<String>) -> Self {
    self.features = features;
    self
  }

  pub fn thread_env(mut self, name: impl Into<String>) -> Self {
    self.thread_env = name.into();
    self
  }

  pub fn result_file(mut self, path: Option<PathBuf>) -> Self {
    self.result_file = path;
    self
  }

  pub fn log_path(mut self, path: Option<PathBuf>) -> Self {
    self.log_path = path;
    self
  }
}

/// Captured child output / 捕获的子进程输出
#[derive(Debug, Clone, Default)]
pub struct Captured {
  pub stdout: String,
  pub stderr: String,
}

fn read_lossy(mut r: impl Read) -> std::io::Result<String> {
  let mut buf = Vec::new();
  r.read_to_end(&mut buf)?;
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run a command to completion, stderr streamed line by line
/// 运行命令直到结束，stderr 逐行读取
///
/// Non-zero exit is an error carrying both streams.
/// 非零退出码返回携带两路输出的错误。
pub fn run_cmd(mut cmd: Command) -> Result<Captured> {
  let mut child = cmd
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()?;

  // Drained concurrently so neither pipe fills up / 并发读取，避免管道写满
  let out = child.stdout.take().map(|o| thread::spawn(move || read_lossy(o)));

  let mut stderr = String::new();
  let mut reader = child.stderr.take().map(BufReader::new);
  if let Some(r) = reader.as_mut() {
    let mut line = Vec::new();
    loop {
      line.clear();
      if r.read_until(b'\n', &mut line)? == 0 {
        break;
      }
      let s = String::from_utf8_lossy(&line);
      debug!("{}", s.trim_end());
      stderr.push_str(&s);
    }
  }

  let status = child.wait()?;

  // Trailing output after exit / 退出后的剩余输出
  if let Some(r) = reader {
    stderr.push_str(&read_lossy(r)?);
  }
  let stdout = match out {
    Some(h) => h
      .join()
      .map_err(|_| std::io::Error::other("stdout reader panicked"))??,
    None => String::new(),
  };

  if !status.success() {
    return Err(Error::Exit {
      code: status.code(),
      stdout,
      stderr,
    });
  }
  Ok(Captured { stdout, stderr })
}

/// Shell line reproducing the command, env prefix included
/// 可复现命令的 shell 行，包含环境变量前缀
pub fn debug_command(cmd: &Command) -> String {
  let mut s = String::new();
  for (k, v) in cmd.get_envs() {
    if let Some(v) = v {
      s.push_str(&format!("{}={} ", k.to_string_lossy(), v.to_string_lossy()));
    }
  }
  s.push_str(&cmd.get_program().to_string_lossy());
  for a in cmd.get_args() {
    let a = a.to_string_lossy();
    if a.contains(' ') || a.contains(',') {
      s.push_str(&format!(" \"{a}\""));
    } else {
      s.push(' ');
      s.push_str(&a);
    }
  }
  s
}

/// Out of process engine benchmark / 进程外引擎基准
pub struct BinaryDriver {
  name: String,
  conf: BinaryConf,
  combo: Option<Combo>,
}

impl BinaryDriver {
  pub fn new(conf: BinaryConf) -> Self {
    Self {
      name: "smalldb-raw".into(),
      conf,
      combo: None,
    }
  }

  /// Build under one feature combination / 在某个特性组合下构建
  pub fn with_combo(conf: BinaryConf, combo: Combo) -> Self {
    Self {
      combo: Some(combo),
      ..Self::new(conf)
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Feature argument: configured features then combination labels
  /// 特性参数：配置特性在前，组合标签在后
  pub fn flags(&self) -> String {
    let mut li: Vec<&str> = self.conf.features.iter().map(String::as_str).collect();
    if let Some(c) = &self.combo {
      li.extend(c.labels());
    }
    li.join(FLAG_SEP)
  }

  /// Command for one sweep point, parameters set on the child only
  /// 单个扫描点的命令，参数只设置在子进程上
  pub fn command(&self, split: Split) -> Command {
    let c = &self.conf;
    let mut cmd = Command::new(&c.program);
    cmd
      .current_dir(&c.dir)
      .env(&c.thread_env, split.threads.to_string())
      .env(&c.action_env, split.per_thread.to_string())
      .env(LOG_ENV, &c.log_level);
    if let Some(p) = &c.result_file {
      cmd.env(RESULT_FILE_ENV, p);
    }
    cmd
      .arg("test")
      .arg("--features")
      .arg(self.flags())
      .args(["--", "--test-threads=1", "--nocapture"])
      .arg(&c.test);
    cmd
  }

  fn append_log(&self, line: &str, out: &Captured) -> Result<()> {
    let Some(p) = &self.conf.log_path else {
      return Ok(());
    };
    let mut f = OpenOptions::new().create(true).append(true).open(p)?;
    writeln!(f, "$ {line}")?;
    f.write_all(out.stdout.as_bytes())?;
    f.write_all(out.stderr.as_bytes())?;
    Ok(())
  }

  fn read_result_file(&self) -> Option<u64> {
    let p = self.conf.result_file.as_ref()?;
    let json = fs::read_to_string(p).ok()?;
    match sonic_rs::from_str::<ResultFile>(&json) {
      Ok(r) => Some(r.duration_ms),
      Err(e) => {
        warn!("{}: {e}, fall back to output", p.display());
        None
      }
    }
  }
}

impl Driver for BinaryDriver {
  fn name(&self) -> &str {
    &self.name
  }

  fn attrs(&self) -> Attrs {
    let mut a = Attrs::new();
    if let Some(c) = self.combo.as_ref().filter(|c| !c.picks.is_empty()) {
      a.insert("features".into(), c.flags().into());
      for (group, label) in &c.picks {
        a.insert(group.clone(), label.as_str().into());
      }
    }
    a
  }

  fn run(&mut self, split: Split) -> Result<Measure> {
    if let Some(p) = &self.conf.result_file {
      // Stale file from an earlier point / 之前扫描点遗留的文件
      match fs::remove_file(p) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
      }
    }

    let cmd = self.command(split);
    let line = debug_command(&cmd);
    info!("{line}");

    let out = match run_cmd(cmd) {
      Ok(out) => out,
      Err(e) => {
        if let Error::Exit { stdout, stderr, .. } = &e {
          self.append_log(
            &line,
            &Captured {
              stdout: stdout.clone(),
              stderr: stderr.clone(),
            },
          )?;
        }
        return Err(e);
      }
    };
    self.append_log(&line, &out)?;

    let ms = match self.read_result_file() {
      Some(ms) => ms,
      None => parse_ms(&out.stdout)
        .or_else(|| parse_ms(&out.stderr))
        .ok_or_else(|| Error::NoTiming {
          output: format!("{}{}", out.stdout, out.stderr),
        })?,
    };
    Ok(Measure {
      elapsed: Duration::from_millis(ms),
    })
  }
}

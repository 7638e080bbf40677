use std::{fs, process::Command};

use aok::{OK, Void};
use bench_matrix::{OptionGroup, RESERVED, expand};
use bench_sweep::{
  BinaryConf, BinaryDriver, Driver, Error, RESULT_FILE_ENV, Split, debug_command, parse_ms,
  run_cmd,
};
use bench_record::Scalar;
use tempfile::tempdir;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

fn sh(script: &str) -> Command {
  let mut cmd = Command::new("sh");
  cmd.arg("-c").arg(script);
  cmd
}

fn env_of(cmd: &Command, key: &str) -> Option<String> {
  cmd
    .get_envs()
    .find(|(k, _)| *k == key)
    .and_then(|(_, v)| v)
    .map(|v| v.to_string_lossy().into_owned())
}

#[test]
fn test_parse_ms() {
  assert_eq!(parse_ms("...ms:4521 done"), Some(4521));
  assert_eq!(parse_ms("INFO took: 12s\nINFO ms:7\nINFO ms:9"), Some(7));
  assert_eq!(parse_ms("no timing here"), None);
  assert_eq!(parse_ms("ms:"), None);
}

#[test]
fn test_command() -> Void {
  let conf = BinaryConf::default().dir("/tmp");
  let d = BinaryDriver::new(conf);
  let cmd = d.command(Split::new(1000, 3)?);

  assert_eq!(cmd.get_program(), "cargo");
  let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
  assert_eq!(
    args,
    [
      "test",
      "--features",
      "benchmark",
      "--",
      "--test-threads=1",
      "--nocapture",
      "test_insert_parallel"
    ]
  );
  assert_eq!(env_of(&cmd, "THREAD_COUNT").as_deref(), Some("3"));
  assert_eq!(env_of(&cmd, "ACTION_PER_THREAD").as_deref(), Some("333"));
  assert_eq!(env_of(&cmd, "RUST_LOG").as_deref(), Some("info"));
  assert_eq!(env_of(&cmd, RESULT_FILE_ENV), None);
  // Harness environment untouched / 测试框架自身环境不受影响
  assert!(std::env::var("ACTION_PER_THREAD").is_err());

  let line = debug_command(&cmd);
  for kv in ["ACTION_PER_THREAD=333 ", "RUST_LOG=info ", "THREAD_COUNT=3 "] {
    assert!(line.contains(kv), "{line}");
  }
  assert!(line.ends_with(
    "cargo test --features benchmark -- --test-threads=1 --nocapture test_insert_parallel"
  ));

  let combo = BinaryConf::default().features(vec!["benchmark".into(), "tree_latch".into()]);
  let line = debug_command(&BinaryDriver::new(combo).command(Split::new(1, 1)?));
  assert!(line.contains("--features \"benchmark, tree_latch\" --"), "{line}");
  OK
}

#[test]
fn test_command_combo() -> Void {
  let g = vec![
    OptionGroup::new("latch_strategy", ["tree_latch", "page_latch"])?,
    OptionGroup::new("steal", ["aries_steal", "aries_no_steal"])?,
  ];
  let combo = expand(&g)?.remove(1);
  let conf = BinaryConf::default().thread_env("THREADS_COUNT");
  let d = BinaryDriver::with_combo(conf, combo);

  assert_eq!(d.flags(), "benchmark, tree_latch, aries_no_steal");
  let cmd = d.command(Split::new(10, 10)?);
  assert_eq!(env_of(&cmd, "THREADS_COUNT").as_deref(), Some("10"));
  assert_eq!(env_of(&cmd, "THREAD_COUNT"), None);

  let a = d.attrs();
  assert_eq!(a.get("latch_strategy"), Some(&Scalar::from("tree_latch")));
  assert_eq!(a.get("steal"), Some(&Scalar::from("aries_no_steal")));
  assert_eq!(
    a.get("features"),
    Some(&Scalar::from("tree_latch, aries_no_steal"))
  );
  assert_eq!(d.name(), "smalldb-raw");
  for k in a.keys().filter(|k| !g.iter().any(|g| &g.name == *k)) {
    assert!(RESERVED.contains(&k.as_str()), "{k}");
  }
  OK
}

#[test]
fn test_command_empty_combo() -> Void {
  // Options file without groups still runs the engine once per point
  // 没有选项组的选项文件仍对每个扫描点运行一次引擎
  let li = expand(&[])?;
  assert_eq!(li.len(), 1);
  let d = BinaryDriver::with_combo(BinaryConf::default(), li[0].clone());
  assert_eq!(d.flags(), "benchmark");
  assert!(d.attrs().is_empty());
  OK
}

#[test]
fn test_run_cmd_capture() -> Void {
  let out = run_cmd(sh("echo out; echo 'INFO ms:4521 done' >&2"))?;
  assert_eq!(out.stdout, "out\n");
  assert_eq!(out.stderr, "INFO ms:4521 done\n");
  OK
}

#[test]
fn test_run_cmd_exit() {
  let r = run_cmd(sh("echo partial; echo boom >&2; exit 3"));
  match r {
    Err(Error::Exit {
      code,
      stdout,
      stderr,
    }) => {
      assert_eq!(code, Some(3));
      assert_eq!(stdout, "partial\n");
      assert_eq!(stderr, "boom\n");
    }
    other => panic!("unexpected {other:?}"),
  }
}

#[test]
fn test_run_cmd_large_output() -> Void {
  // Both pipes well past their buffer size / 两路输出都远超管道缓冲
  let script = "i=0; while [ $i -lt 20000 ]; do echo err-line-$i >&2; echo out-line-$i; \
                i=$((i+1)); done; echo ms:77 >&2";
  let out = run_cmd(sh(script))?;
  assert_eq!(out.stderr.lines().count(), 20001);
  assert_eq!(out.stdout.lines().count(), 20000);
  assert_eq!(parse_ms(&out.stderr), Some(77));
  OK
}

#[test]
fn test_driver_scrapes_ms() -> Void {
  let dir = tempdir()?;
  // `sh test ...` runs the script named `test` in the crate dir
  // `sh test ...` 执行 crate 目录下名为 `test` 的脚本
  fs::write(
    dir.path().join("test"),
    "echo \"threads=$THREAD_COUNT per=$ACTION_PER_THREAD\" >&2\necho \"ms:$((THREAD_COUNT * 1000))\"\n",
  )?;
  let conf = BinaryConf::default()
    .program("sh")
    .dir(dir.path())
    .log_path(Some(dir.path().join("out")));
  let mut d = BinaryDriver::new(conf);
  let m = d.run(Split::new(1000, 3)?)?;
  assert_eq!(m.elapsed.as_millis(), 3000);

  let log = fs::read_to_string(dir.path().join("out"))?;
  assert!(log.contains("threads=3 per=333"));
  assert!(log.contains("ms:3000"));
  OK
}

#[test]
fn test_driver_result_file() -> Void {
  let dir = tempdir()?;
  let result = dir.path().join("result.json");
  fs::write(&result, "{\"duration_ms\": 1}")?;
  fs::write(
    dir.path().join("test"),
    format!(
      "echo ms:999\nprintf '{{\"duration_ms\": 4521}}' > \"${RESULT_FILE_ENV}\"\n"
    ),
  )?;
  let conf = BinaryConf::default()
    .program("sh")
    .dir(dir.path())
    .result_file(Some(result.clone()));
  let mut d = BinaryDriver::new(conf);
  let m = d.run(Split::new(1000, 1)?)?;
  assert_eq!(m.elapsed.as_millis(), 4521);
  OK
}

#[test]
fn test_driver_no_timing() -> Void {
  let dir = tempdir()?;
  fs::write(dir.path().join("test"), "echo finished\n")?;
  let conf = BinaryConf::default().program("sh").dir(dir.path());
  let mut d = BinaryDriver::new(conf);
  let r = d.run(Split::new(10, 1)?);
  assert!(matches!(r, Err(Error::NoTiming { output }) if output.contains("finished")));
  OK
}

#[test]
fn test_driver_exit_aborts() -> Void {
  let dir = tempdir()?;
  fs::write(dir.path().join("test"), "echo ms:5\necho panicked >&2\nexit 101\n")?;
  let conf = BinaryConf::default().program("sh").dir(dir.path());
  let mut d = BinaryDriver::new(conf);
  let r = d.run(Split::new(10, 1)?);
  assert!(matches!(r, Err(Error::Exit { code: Some(101), ref stderr, .. }) if stderr.contains("panicked")));
  OK
}

#[test]
fn test_driver_result_file_absent() -> Void {
  let dir = tempdir()?;
  fs::write(dir.path().join("test"), "echo ms:42\n")?;
  let conf = BinaryConf::default()
    .program("sh")
    .dir(dir.path())
    .result_file(Some(dir.path().join("never_written.json")));
  let mut d = BinaryDriver::new(conf);
  let m = d.run(Split::new(10, 1)?)?;
  assert_eq!(m.elapsed.as_millis(), 42);
  OK
}

#[test]
fn test_driver_stale_result_undeletable() -> Void {
  let dir = tempdir()?;
  fs::write(dir.path().join("test"), "echo ms:42\n")?;
  // A directory cannot be removed as a file / 目录无法按文件删除
  let stale = dir.path().join("result.json");
  fs::create_dir(&stale)?;
  let conf = BinaryConf::default()
    .program("sh")
    .dir(dir.path())
    .result_file(Some(stale));
  let mut d = BinaryDriver::new(conf);
  assert!(matches!(d.run(Split::new(10, 1)?), Err(Error::Io(_))));
  OK
}

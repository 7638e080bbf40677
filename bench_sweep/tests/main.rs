use std::{
  fs,
  time::{Duration, Instant},
};

use aok::{OK, Void};
use bench_matrix::RESERVED;
use bench_record::{Attrs, Ctx, Scalar, latest, load};
use bench_sweep::{Driver, Error, Measure, Result, Retry, Runner, Split, SweepConf, record_for};
use proptest::prelude::*;
use tempfile::tempdir;

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

/// Driver that reports a fixed duration / 返回固定耗时的驱动
struct Fake {
  name: &'static str,
  ms: u64,
  fail_at: Option<usize>,
}

impl Fake {
  fn new(name: &'static str, ms: u64) -> Self {
    Self {
      name,
      ms,
      fail_at: None,
    }
  }
}

impl Driver for Fake {
  fn name(&self) -> &str {
    self.name
  }

  fn attrs(&self) -> Attrs {
    let mut a = Attrs::new();
    a.insert("latch".into(), "tree_latch".into());
    a
  }

  fn run(&mut self, split: Split) -> Result<Measure> {
    if self.fail_at == Some(split.threads) {
      return Err(Error::RowCount {
        expect: split.total(),
        actual: 0,
      });
    }
    Ok(Measure {
      elapsed: Duration::from_millis(self.ms),
    })
  }
}

#[test]
fn test_split_scenarios() -> Void {
  let a = Split::new(1000, 1)?;
  assert_eq!((a.per_thread, a.total()), (1000, 1000));
  let b = Split::new(1000, 3)?;
  assert_eq!((b.per_thread, b.total()), (333, 999));
  assert!(matches!(Split::new(1000, 0), Err(Error::Conf(_))));
  assert_eq!(Split::new(2, 3)?.total(), 0);
  OK
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(256))]

  #[test]
  fn prop_split(total in 1u64..10_000_000, threads in 1usize..2_000) {
    let s = Split::new(total, threads).unwrap();
    prop_assert!(s.total() <= total);
    prop_assert_eq!(s.total() % threads as u64, 0);
    prop_assert_eq!(s.total(), (total / threads as u64) * threads as u64);
    prop_assert!(total - s.total() < threads as u64);
  }
}

#[test]
fn test_measure() {
  let m = Measure {
    elapsed: Duration::from_millis(4521),
  };
  assert!((m.duration_ms() - 4521.0).abs() < 1e-6);
  assert!((m.per_second(1000) - 1000.0 / 4.521).abs() < 1e-6);
  let zero = Measure {
    elapsed: Duration::ZERO,
  };
  assert_eq!(zero.per_second(1000), 0.0);
}

#[test]
fn test_retry_delay() {
  let r = Retry {
    initial: Duration::from_millis(100),
    max: Duration::from_secs(1),
    factor: 2.0,
    deadline: Duration::from_secs(10),
  };
  assert_eq!(r.delay(0), Duration::from_millis(100));
  assert_eq!(r.delay(1), Duration::from_millis(200));
  assert_eq!(r.delay(3), Duration::from_millis(800));
  assert_eq!(r.delay(4), Duration::from_secs(1));
  assert_eq!(r.delay(u32::MAX), Duration::from_secs(1));
}

#[test]
fn test_retry_succeeds() -> Void {
  let r = Retry::default().initial(Duration::from_millis(1));
  let mut n = 0;
  let v = r.run("flaky", || {
    n += 1;
    if n < 3 { Err("not yet") } else { Ok(n) }
  })?;
  assert_eq!(v, 3);
  OK
}

#[test]
fn test_retry_deadline() {
  let r = Retry::default()
    .initial(Duration::from_millis(5))
    .deadline(Duration::from_millis(50));
  let begin = Instant::now();
  let e = r.run("down", || Err::<(), _>("refused")).unwrap_err();
  assert!(begin.elapsed() < Duration::from_secs(5));
  match e {
    Error::Unavailable { what, last, waited } => {
      assert_eq!(what, "down");
      assert_eq!(last, "refused");
      assert!(waited < Duration::from_secs(1));
    }
    e => panic!("unexpected {e}"),
  }
}

#[test]
fn test_record_for() {
  let ctx = Ctx::new("c0ffee", "ssd");
  let d = Fake::new("smalldb-raw", 4521);
  let split = Split::new(1000, 3).unwrap();
  let m = Measure {
    elapsed: Duration::from_millis(4521),
  };
  let r = record_for(&ctx, &d, split, m);
  assert_eq!(r.attr("target"), Some(&Scalar::from("smalldb-raw")));
  assert_eq!(r.attr("total_actions"), Some(&Scalar::Int(999)));
  assert_eq!(r.attr("threads_count"), Some(&Scalar::Int(3)));
  assert_eq!(r.attr("action_per_thread"), Some(&Scalar::Int(333)));
  assert_eq!(r.attr("latch"), Some(&Scalar::from("tree_latch")));
  assert_eq!(r.attr("disk"), Some(&Scalar::from("ssd")));
  let ips = r.result("insert_per_second").and_then(Scalar::as_f64).unwrap();
  assert!((ips - 999.0 / 4.521).abs() < 1e-6);

  // Every coordinate key is closed to option groups / 坐标键均不可作为选项组名
  for k in r.target_attributes.keys().filter(|k| *k != "latch") {
    assert!(RESERVED.contains(&k.as_str()), "{k}");
  }
}

#[test]
fn test_sweep_order_and_file() -> Void {
  let dir = tempdir()?;
  let conf = SweepConf::default()
    .total_actions(1000)
    .threads(vec![1, 3])
    .out_dir(dir.path());
  let runner = Runner::new(conf, Ctx::new("c0ffee", "hdd"));

  let mut li: Vec<Box<dyn Driver>> = vec![
    Box::new(Fake::new("postgres", 10)),
    Box::new(Fake::new("smalldb-raw", 20)),
  ];
  let path = runner.sweep(&mut li)?;
  assert_eq!(latest(dir.path())?, path);

  let records = load(&path)?;
  let points: Vec<(String, i64)> = records
    .iter()
    .map(|r| {
      (
        r.attr("target").and_then(Scalar::as_str).unwrap().to_owned(),
        r.attr("threads_count").and_then(Scalar::as_i64).unwrap(),
      )
    })
    .collect();
  assert_eq!(
    points,
    [
      ("postgres".to_owned(), 1),
      ("smalldb-raw".to_owned(), 1),
      ("postgres".to_owned(), 3),
      ("smalldb-raw".to_owned(), 3),
    ]
  );
  assert!(records.iter().all(|r| r.commit_id == "c0ffee"));
  OK
}

#[test]
fn test_sweep_twice_keeps_both() -> Void {
  let dir = tempdir()?;
  let conf = SweepConf::default()
    .total_actions(10)
    .threads(vec![1])
    .out_dir(dir.path());
  let runner = Runner::new(conf, Ctx::new("c0ffee", "hdd"));
  let mut li: Vec<Box<dyn Driver>> = vec![Box::new(Fake::new("postgres", 10))];

  let first = runner.sweep(&mut li)?;
  let before = fs::read(&first)?;
  let second = runner.sweep(&mut li)?;

  assert_ne!(first, second);
  assert_eq!(fs::read(&first)?, before);
  assert_eq!(load(&first)?.len(), 1);
  assert_eq!(load(&second)?.len(), 1);
  assert_eq!(latest(dir.path())?, second);
  OK
}

#[test]
fn test_sweep_fail_fast() -> Void {
  let dir = tempdir()?;
  let out = dir.path().join("record");
  let conf = SweepConf::default()
    .total_actions(100)
    .threads(vec![1, 2, 4])
    .out_dir(&out);
  let runner = Runner::new(conf, Ctx::new("x", "hdd"));

  let mut bad = Fake::new("postgres", 1);
  bad.fail_at = Some(2);
  let mut li: Vec<Box<dyn Driver>> = vec![Box::new(bad)];
  let r = runner.sweep(&mut li);
  assert!(matches!(r, Err(Error::RowCount { expect: 100, actual: 0 })));
  // Nothing persisted / 未持久化任何内容
  assert!(!out.exists() || fs::read_dir(&out)?.next().is_none());
  OK
}

#[test]
fn test_sweep_conf_default() -> Void {
  let conf = SweepConf::default();
  assert_eq!(conf.threads, [1, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110]);
  assert_eq!(conf.total_actions, 1_000_000);
  assert!(matches!(
    conf.threads(Vec::new()).splits(),
    Err(Error::Conf(_))
  ));
  OK
}

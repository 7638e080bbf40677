// Bounded exponential backoff
// 有界指数退避

use std::{
  fmt::Display,
  thread,
  time::{Duration, Instant},
};

use log::info;

use crate::{Error, Result};

/// Retry policy with a deadline / 带截止时间的重试策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retry {
  pub initial: Duration,
  pub max: Duration,
  pub factor: f64,
  /// Give up once this much time has passed / 超过该时长后放弃
  pub deadline: Duration,
}

impl Default for Retry {
  fn default() -> Self {
    Self {
      initial: Duration::from_millis(100),
      max: Duration::from_secs(5),
      factor: 2.0,
      deadline: Duration::from_secs(60),
    }
  }
}

impl Retry {
  pub fn deadline(mut self, deadline: Duration) -> Self {
    self.deadline = deadline;
    self
  }

  pub fn initial(mut self, initial: Duration) -> Self {
    self.initial = initial;
    self
  }

  /// Delay before retry `attempt` (0-based), capped at `max`
  /// 第 `attempt` 次重试前的等待（从 0 开始），上限为 `max`
  pub fn delay(&self, attempt: u32) -> Duration {
    let d = self.initial.as_secs_f64() * self.factor.powi(attempt.min(64) as i32);
    if d.is_finite() && d < self.max.as_secs_f64() {
      Duration::from_secs_f64(d)
    } else {
      self.max
    }
  }

  /// Call `f` until it succeeds or the deadline passes
  /// 反复调用 `f` 直到成功或超过截止时间
  pub fn run<T, E: Display>(&self, what: &str, mut f: impl FnMut() -> Result<T, E>) -> Result<T> {
    let begin = Instant::now();
    let mut attempt = 0;
    loop {
      let e = match f() {
        Ok(v) => return Ok(v),
        Err(e) => e,
      };
      let waited = begin.elapsed();
      let delay = self.delay(attempt);
      if waited + delay > self.deadline {
        return Err(Error::Unavailable {
          what: what.into(),
          waited,
          last: e.to_string(),
        });
      }
      info!("{what} not ready ({e}), retry in {delay:?}");
      thread::sleep(delay);
      attempt += 1;
    }
  }
}

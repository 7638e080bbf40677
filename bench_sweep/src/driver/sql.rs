//! Threaded SQL driver / 多线程 SQL 驱动
//!
//! Each worker is one OS thread owning one server connection. Inserts run in
//! autocommit mode, so a failed insert (key collision) does not poison the
//! rest of the worker's inserts.
//! 每个工作者是一个独占一条服务端连接的系统线程。插入以自动提交模式执行，
//! 单条插入失败（键冲突）不影响该工作者后续插入。

use std::{sync::Arc, thread, time::Instant};

use bench_record::Attrs;
use log::{error, info, warn};
use sqlx::{Connection, PgConnection};
use tokio::runtime::{Builder, Runtime};

use crate::{Driver, Error, Measure, Result, Retry, Split};

const NAME: &str = "postgres";

/// Table names are spliced into statements, so only plain identifiers pass
/// 表名会拼入语句，因此只接受普通标识符
pub fn valid_ident(s: &str) -> bool {
  let mut c = s.chars();
  c.next().is_some_and(|f| f.is_ascii_alphabetic() || f == '_')
    && c.all(|x| x.is_ascii_alphanumeric() || x == '_')
}

/// SQL backend configuration / SQL 后端配置
#[derive(Debug, Clone)]
pub struct SqlConf {
  pub url: String,
  pub table: String,
  /// Readiness wait / 就绪等待
  pub retry: Retry,
}

impl Default for SqlConf {
  fn default() -> Self {
    Self {
      url: "postgres://postgres@localhost:5432/db".into(),
      table: "foo".into(),
      retry: Retry::default(),
    }
  }
}

impl SqlConf {
  pub fn url(mut self, url: impl Into<String>) -> Self {
    self.url = url.into();
    self
  }

  pub fn table(mut self, table: impl Into<String>) -> Self {
    self.table = table.into();
    self
  }

  pub fn retry(mut self, retry: Retry) -> Self {
    self.retry = retry;
    self
  }

  pub fn drop_sql(&self) -> String {
    format!("DROP TABLE IF EXISTS {}", self.table)
  }

  pub fn create_sql(&self) -> String {
    format!(
      "CREATE TABLE {} (column1 bigint primary key, column2 bigint)",
      self.table
    )
  }

  pub fn insert_sql(&self) -> String {
    format!(
      "INSERT INTO {} (column1, column2) VALUES ($1, $2)",
      self.table
    )
  }

  pub fn count_sql(&self) -> String {
    format!("SELECT COUNT(*) FROM {}", self.table)
  }
}

fn runtime() -> Result<Runtime> {
  Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Concurrent single-row inserts against a live server
/// 针对在线服务的并发单行插入
pub struct SqlDriver {
  conf: SqlConf,
  rt: Runtime,
}

impl SqlDriver {
  pub fn new(conf: SqlConf) -> Result<Self> {
    if !valid_ident(&conf.table) {
      return Err(Error::conf(format!("bad table name `{}`", conf.table)));
    }
    Ok(Self {
      conf,
      rt: runtime()?,
    })
  }

  pub fn conf(&self) -> &SqlConf {
    &self.conf
  }

  /// Block until the server accepts a connection or the deadline passes
  /// 阻塞直到服务接受连接或超过截止时间
  pub fn wait_ready(&self) -> Result<()> {
    let url = &self.conf.url;
    self.conf.retry.run(NAME, || {
      self.rt.block_on(async {
        let conn = PgConnection::connect(url).await?;
        conn.close().await
      })
    })?;
    info!("{NAME} ready");
    Ok(())
  }

  /// Drop and recreate the table on one connection
  /// 在单条连接上删除并重建表
  fn setup(&self) -> Result<()> {
    let conf = &self.conf;
    self.rt.block_on(async {
      let mut conn = PgConnection::connect(&conf.url).await?;
      sqlx::query(&conf.drop_sql()).execute(&mut conn).await?;
      sqlx::query(&conf.create_sql()).execute(&mut conn).await?;
      conn.close().await?;
      Ok(())
    })
  }

  fn count(&self) -> Result<u64> {
    let conf = &self.conf;
    let n: i64 = self.rt.block_on(async {
      let mut conn = PgConnection::connect(&conf.url).await?;
      let n = sqlx::query_scalar::<_, i64>(&conf.count_sql())
        .fetch_one(&mut conn)
        .await?;
      conn.close().await?;
      Ok::<_, Error>(n)
    })?;
    Ok(n.max(0) as u64)
  }
}

/// Returns the number of failed inserts / 返回插入失败的数量
fn worker(id: usize, url: &str, insert: &str, n: u64) -> Result<u64> {
  runtime()?.block_on(async {
    let mut conn = PgConnection::connect(url).await?;
    let mut rng = fastrand::Rng::new();
    let mut failed = 0;
    for _ in 0..n {
      let (k, v) = (rng.i64(..), rng.i64(..));
      if let Err(e) = sqlx::query(insert).bind(k).bind(v).execute(&mut conn).await {
        failed += 1;
        warn!("worker {id}: insert ({k}, {v}): {e}");
      }
    }
    conn.close().await?;
    Ok(failed)
  })
}

impl Driver for SqlDriver {
  fn name(&self) -> &str {
    NAME
  }

  fn attrs(&self) -> Attrs {
    let mut a = Attrs::new();
    a.insert("table".into(), self.conf.table.as_str().into());
    a
  }

  fn run(&mut self, split: Split) -> Result<Measure> {
    self.setup()?;

    let url: Arc<str> = self.conf.url.as_str().into();
    let insert: Arc<str> = self.conf.insert_sql().into();

    let start = Instant::now();
    let handles: Vec<_> = (0..split.threads)
      .map(|id| {
        let url = url.clone();
        let insert = insert.clone();
        thread::spawn(move || worker(id, &url, &insert, split.per_thread))
      })
      .collect();

    let mut failed = 0;
    let mut panicked = None;
    for (id, h) in handles.into_iter().enumerate() {
      match h.join() {
        Ok(Ok(n)) => failed += n,
        // Logged and left to the row count check / 记录日志，交由行数校验处理
        Ok(Err(e)) => error!("worker {id}: {e}"),
        Err(_) => {
          panicked.get_or_insert(id);
        }
      }
    }
    let elapsed = start.elapsed();

    if let Some(id) = panicked {
      return Err(Error::WorkerPanic(id));
    }

    if failed > 0 {
      warn!("{failed} inserts failed");
    }

    let expect = split.total();
    let actual = self.count()?;
    if actual != expect {
      return Err(Error::RowCount { expect, actual });
    }
    Ok(Measure { elapsed })
  }
}

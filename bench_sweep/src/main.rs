// Throughput sweep command line
// 吞吐扫描命令行

use std::{path::PathBuf, process::ExitCode, time::Duration};

use bench_matrix::{OPTIONS_FILE, Patched};
use bench_sweep::{
  BinaryConf, BinaryDriver, Driver, Result, Retry, Runner, SqlConf, SqlDriver, SweepConf,
};
use clap::{Args, Parser, Subcommand};
use log::{error, info};

#[derive(Parser)]
#[command(name = "bench_sweep")]
#[command(about = "Concurrent insert throughput sweep / 并发插入吞吐扫描")]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
  /// Run the sweep and save a timestamped report / 执行扫描并保存报告
  Run(RunArgs),

  /// Patch Cargo.toml and Makefile from the options file / 由选项文件改写构建文件
  Gen {
    #[arg(long, default_value = OPTIONS_FILE)]
    options: PathBuf,
    /// Directory holding Cargo.toml and Makefile
    #[arg(long, default_value = ".")]
    root: PathBuf,
  },

  /// Print the latest report as a table / 以表格打印最新报告
  Report {
    #[arg(long, default_value = "docs/record")]
    dir: PathBuf,
  },
}

#[derive(Args)]
struct RunArgs {
  #[arg(long, default_value_t = 1_000_000)]
  total_actions: u64,

  /// Comma separated, default 1,10,20,...,110
  #[arg(long, value_delimiter = ',')]
  threads: Vec<usize>,

  #[arg(long, default_value = "docs/record")]
  out_dir: PathBuf,

  #[arg(long, default_value = "hdd")]
  disk: String,

  #[arg(
    long,
    env = "DATABASE_URL",
    default_value = "postgres://postgres@localhost:5432/db"
  )]
  database_url: String,

  #[arg(long, default_value = "foo")]
  table: String,

  /// Seconds to wait for the server / 等待服务就绪的秒数
  #[arg(long, default_value_t = 60)]
  wait_secs: u64,

  #[arg(long)]
  skip_sql: bool,

  #[arg(long)]
  skip_binary: bool,

  /// Engine crate directory / 引擎 crate 目录
  #[arg(long, default_value = ".")]
  manifest_dir: PathBuf,

  #[arg(long, default_value = "test_insert_parallel")]
  test: String,

  #[arg(long, value_delimiter = ',', default_value = "benchmark")]
  features: Vec<String>,

  /// Cross the engine backend with every combination of this options file
  /// 将引擎后端与该选项文件的全部组合交叉
  #[arg(long)]
  matrix: Option<PathBuf>,

  #[arg(long, default_value = "THREAD_COUNT")]
  thread_env: String,

  #[arg(long)]
  result_file: Option<PathBuf>,

  /// Append engine test output to this file / 将引擎测试输出追加到此文件
  #[arg(long)]
  log: Option<PathBuf>,
}

fn drivers(a: &RunArgs) -> Result<Vec<Box<dyn Driver>>> {
  let mut li: Vec<Box<dyn Driver>> = Vec::new();

  if !a.skip_sql {
    let conf = SqlConf::default()
      .url(a.database_url.as_str())
      .table(a.table.as_str())
      .retry(Retry::default().deadline(Duration::from_secs(a.wait_secs)));
    let sql = SqlDriver::new(conf)?;
    sql.wait_ready()?;
    li.push(Box::new(sql));
  }

  if !a.skip_binary {
    let conf = BinaryConf::default()
      .dir(&a.manifest_dir)
      .test(a.test.as_str())
      .features(a.features.clone())
      .thread_env(a.thread_env.as_str())
      .result_file(a.result_file.clone())
      .log_path(a.log.clone());
    match &a.matrix {
      Some(path) => {
        let groups = bench_matrix::load(path)?;
        for combo in bench_matrix::expand(&groups)? {
          li.push(Box::new(BinaryDriver::with_combo(conf.clone(), combo)));
        }
      }
      None => li.push(Box::new(BinaryDriver::new(conf))),
    }
  }
  Ok(li)
}

fn run(a: RunArgs) -> Result<()> {
  let mut conf = SweepConf::default()
    .total_actions(a.total_actions)
    .out_dir(&a.out_dir)
    .disk(a.disk.as_str());
  if !a.threads.is_empty() {
    conf = conf.threads(a.threads.clone());
  }

  let mut li = drivers(&a)?;
  let runner = Runner::detect(conf, &a.manifest_dir);
  let path = runner.sweep(&mut li)?;
  println!("{}", path.display());
  Ok(())
}

fn exec(cli: Cli) -> Result<()> {
  match cli.command {
    Cmd::Run(a) => run(a),
    Cmd::Gen { options, root } => {
      let groups = bench_matrix::load(&options)?;
      let patched = bench_matrix::write_build_files(&root, &groups)?;
      for (file, p) in [bench_matrix::CARGO_TOML, bench_matrix::MAKEFILE]
        .iter()
        .zip(patched)
      {
        let state = match p {
          Patched::Updated(_) => "updated",
          Patched::Unchanged => "unchanged",
          Patched::Missing => "markers missing",
        };
        info!("{file}: {state}");
      }
      Ok(())
    }
    Cmd::Report { dir } => {
      let path = bench_record::latest(&dir)?;
      let records = bench_record::load(&path)?;
      println!("{}\n", path.display());
      println!("{}", bench_record::summary(&records));
      Ok(())
    }
  }
}

fn main() -> ExitCode {
  log_init::init();
  match exec(Cli::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}

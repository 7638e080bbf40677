// Console table of a report
// 报告的控制台表格

use tabled::{Table, Tabled, settings::Style};

use crate::{BenchmarkRecord, Scalar};

#[derive(Tabled)]
struct Row {
  #[tabled(rename = "Target")]
  target: String,
  #[tabled(rename = "Features")]
  features: String,
  #[tabled(rename = "Threads")]
  threads: i64,
  #[tabled(rename = "Actions")]
  actions: String,
  #[tabled(rename = "Duration (ms)")]
  duration: String,
  #[tabled(rename = "Insert/s")]
  insert: String,
}

fn text(v: Option<&Scalar>) -> String {
  v.map(ToString::to_string).unwrap_or_else(|| "-".into())
}

/// Render records sorted by target then thread count
/// 按目标、线程数排序渲染记录
pub fn summary(records: &[BenchmarkRecord]) -> String {
  let mut rows: Vec<Row> = records
    .iter()
    .map(|r| Row {
      target: text(r.attr("target")),
      features: text(r.attr("features")),
      threads: r.attr("threads_count").and_then(Scalar::as_i64).unwrap_or(0),
      actions: text(r.attr("total_actions")),
      duration: text(r.result("duration_ms")),
      insert: r
        .result("insert_per_second")
        .and_then(Scalar::as_f64)
        .map(|v| format!("{v:.0}"))
        .unwrap_or_else(|| "-".into()),
    })
    .collect();
  rows.sort_by(|a, b| {
    (&a.target, &a.features, a.threads).cmp(&(&b.target, &b.features, b.threads))
  });
  Table::new(rows).with(Style::ascii()).to_string()
}

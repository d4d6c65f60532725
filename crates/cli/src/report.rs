//! Result printer: the downstream consumer of a pipeline run.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use payroll_compute::{AnomalyResult, RunMetrics};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub threshold: Option<f64>,
    pub top: Option<usize>,
}

impl ReportOptions {
    fn visible<'a>(&self, results: &'a [AnomalyResult]) -> &'a [AnomalyResult] {
        let n = self.top.unwrap_or(results.len()).min(results.len());
        &results[..n]
    }

    fn flagged(&self, result: &AnomalyResult) -> bool {
        self.threshold.is_some_and(|t| result.is_anomalous(t))
    }
}

pub fn render(
    format: ReportFormat,
    results: &[AnomalyResult],
    metrics: &RunMetrics,
    opts: &ReportOptions,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(results, opts)),
        ReportFormat::Json => render_json(results, metrics, opts),
    }
}

/// `EmployeeID | AnomalyScore` table, scores to four decimals. Rows above
/// the threshold are marked with `*`.
pub fn render_text(results: &[AnomalyResult], opts: &ReportOptions) -> String {
    let mut out = String::new();
    out.push_str("EmployeeID | AnomalyScore\n");
    for r in opts.visible(results) {
        let marker = if opts.flagged(r) { " *" } else { "" };
        let _ = writeln!(out, "{} | {:.4}{}", r.id, r.score, marker);
    }

    if let Some(t) = opts.threshold {
        let count = results.iter().filter(|r| r.is_anomalous(t)).count();
        let _ = writeln!(
            out,
            "\n{} of {} records above threshold {}",
            count,
            results.len(),
            t
        );
    }
    out
}

#[derive(Serialize)]
struct JsonRow {
    id: i64,
    score: f64,
    flagged: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run: &'a RunMetrics,
    threshold: Option<f64>,
    results: Vec<JsonRow>,
}

pub fn render_json(results: &[AnomalyResult], metrics: &RunMetrics, opts: &ReportOptions) -> Result<String> {
    let report = JsonReport {
        run: metrics,
        threshold: opts.threshold,
        results: opts
            .visible(results)
            .iter()
            .map(|r| JsonRow {
                id: r.id,
                score: r.score,
                flagged: opts.flagged(r),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize report")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> Vec<AnomalyResult> {
        vec![
            AnomalyResult { id: 207, score: 3.71254 },
            AnomalyResult { id: 124, score: 2.5 },
            AnomalyResult { id: 141, score: 0.12 },
        ]
    }

    #[test]
    fn text_report_uses_four_decimals() {
        let text = render_text(&results(), &ReportOptions::default());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "EmployeeID | AnomalyScore");
        assert_eq!(lines[1], "207 | 3.7125");
        assert_eq!(lines[3], "141 | 0.1200");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn text_report_marks_rows_above_threshold() {
        let opts = ReportOptions {
            threshold: Some(2.5),
            top: None,
        };
        let text = render_text(&results(), &opts);
        assert!(text.contains("207 | 3.7125 *"));
        assert!(text.contains("124 | 2.5000\n"));
        assert!(text.contains("1 of 3 records above threshold 2.5"));
    }

    #[test]
    fn top_limits_rows() {
        let opts = ReportOptions {
            threshold: None,
            top: Some(1),
        };
        let text = render_text(&results(), &opts);
        assert_eq!(text.lines().count(), 2);

        let opts = ReportOptions {
            threshold: None,
            top: Some(10),
        };
        assert_eq!(render_text(&results(), &opts).lines().count(), 4);
    }

    #[test]
    fn json_report_carries_flags_and_run() {
        let metrics = RunMetrics::new(3, 1);
        let opts = ReportOptions {
            threshold: Some(1.0),
            top: Some(2),
        };
        let json = render_json(&results(), &metrics, &opts).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["run"]["records"], 3);
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["results"][0]["id"], 207);
        assert_eq!(value["results"][0]["flagged"], true);
        assert_eq!(value["results"][1]["flagged"], true);
    }
}

//! Terminal summary tables for job results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::{
    CorrelationResult, DescribeResult, EvaluationResult, FullPipelineResult, LogisticRunResult,
    PreviewResult, SplitResult,
};

/// Result of any job, serialized as the bare result object
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JobReport {
    Logistic(LogisticRunResult),
    Correlation(CorrelationResult),
    Split(SplitResult),
    Preview(PreviewResult),
    Pipeline(FullPipelineResult),
    Evaluation(EvaluationResult),
    Describe(DescribeResult),
}

/// Correlations at or above this magnitude are highlighted
const STRONG_CORRELATION: f64 = 0.7;

/// Show at most this many correlated pairs
const MAX_PAIRS: usize = 10;

impl JobReport {
    pub fn display(&self) {
        let (title, table) = match self {
            JobReport::Logistic(r) => ("LOGISTIC REGRESSION", logistic_table(r)),
            JobReport::Correlation(r) => ("CORRELATION", correlation_table(r)),
            JobReport::Split(r) => ("STRATIFIED SPLIT", split_table(r)),
            JobReport::Preview(r) => ("PREPROCESSING PREVIEW", preview_table(r)),
            JobReport::Pipeline(r) => ("FULL PIPELINE", pipeline_table(r)),
            JobReport::Evaluation(r) => ("EVALUATION", evaluation_table(r)),
            JobReport::Describe(r) => ("DATASET SUMMARY", describe_table(r)),
        };

        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style(title).white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn metric_table(rows: &[(&str, String)]) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table
}

fn rate_cell(value: f64) -> Cell {
    let color = if value >= 0.9 {
        Color::Green
    } else if value >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{:.4}", value))
        .fg(color)
        .add_attribute(Attribute::Bold)
}

fn logistic_table(r: &LogisticRunResult) -> Table {
    let mut table = metric_table(&[
        ("Train samples", r.train_samples.to_string()),
        ("Test samples", r.test_samples.to_string()),
        ("Features after encoding", r.features_after_encoding.to_string()),
    ]);
    table.add_row(vec![Cell::new("Accuracy"), rate_cell(r.accuracy)]);
    table
}

fn evaluation_table(r: &EvaluationResult) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let m = &r.metrics;
    for (name, value) in [
        ("Accuracy", m.accuracy),
        ("Precision", m.precision),
        ("Recall", m.recall),
        ("F1", m.f1),
    ] {
        table.add_row(vec![Cell::new(name), rate_cell(value)]);
    }

    let cm = &r.confusion_matrix;
    table.add_row(vec![Cell::new("True negatives"), Cell::new(cm.tn)]);
    table.add_row(vec![
        Cell::new("False positives"),
        Cell::new(cm.fp).fg(Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("False negatives"),
        Cell::new(cm.fn_).fg(Color::Red),
    ]);
    table.add_row(vec![Cell::new("True positives"), Cell::new(cm.tp)]);
    table
}

fn correlation_table(r: &CorrelationResult) -> Table {
    let mut table = new_table(&["Feature 1", "Feature 2", "Correlation"]);
    let pairs = crate::pipeline::correlated_pairs(&r.correlation, STRONG_CORRELATION);
    for pair in pairs.iter().take(MAX_PAIRS) {
        table.add_row(vec![
            Cell::new(&pair.feature1),
            Cell::new(&pair.feature2),
            Cell::new(format!("{:.3}", pair.correlation)).fg(Color::Yellow),
        ]);
    }
    if pairs.is_empty() {
        table.add_row(vec![
            Cell::new(format!("no pairs above {:.2}", STRONG_CORRELATION)),
            Cell::new(""),
            Cell::new(""),
        ]);
    }
    table
}

fn split_table(r: &SplitResult) -> Table {
    let h = &r.histograms;
    let mut labels: Vec<&String> = h.train.labels.iter().collect();
    for label in h.val.labels.iter().chain(&h.test.labels) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let mut table = new_table(&["Value", "Train", "Val", "Test"]);
    for label in labels {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(h.train.count(label)),
            Cell::new(h.val.count(label)),
            Cell::new(h.test.count(label)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(r.train_size).fg(Color::Green),
        Cell::new(r.val_size).fg(Color::Green),
        Cell::new(r.test_size).fg(Color::Green),
    ]);
    table
}

fn preview_table(r: &PreviewResult) -> Table {
    let mut header = vec!["#"];
    if let Some(row) = r.head.first() {
        header.extend(row.columns());
    }

    let mut table = new_table(&header);
    for (i, row) in r.head.iter().enumerate() {
        let mut cells = vec![Cell::new(i)];
        cells.extend(row.values().map(|v| Cell::new(format!("{:.3}", v))));
        table.add_row(cells);
    }
    table
}

fn pipeline_table(r: &FullPipelineResult) -> Table {
    metric_table(&[
        ("Train rows (after noise + dropna)", r.train_rows.to_string()),
        ("Validation rows", r.val_rows.to_string()),
        ("Test rows", r.test_rows.to_string()),
        ("Features after pipeline", r.features_after_pipeline.to_string()),
    ])
}

fn describe_table(r: &DescribeResult) -> Table {
    let mut table = new_table(&["Column", "Type", "Missing", "Summary"]);
    let missing = |column: &str| {
        r.missing
            .iter()
            .find(|m| m.column == column)
            .map_or(0.0, |m| m.ratio)
    };

    for s in &r.summary.numeric {
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new("numeric"),
            missing_cell(missing(&s.column)),
            Cell::new(match (s.mean, s.std, s.min, s.max) {
                (Some(mean), Some(std), Some(min), Some(max)) => format!(
                    "mean {:.3}, std {:.3}, [{:.3}, {:.3}]",
                    mean, std, min, max
                ),
                _ => "no observed values".to_string(),
            }),
        ]);
    }
    for s in &r.summary.categorical {
        let top = s
            .top
            .as_ref()
            .map_or_else(|| "-".to_string(), |(v, n)| format!("top {} ({})", v, n));
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new("categorical"),
            missing_cell(missing(&s.column)),
            Cell::new(format!("{} distinct, {}", s.distinct, top)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Rows").add_attribute(Attribute::Bold),
        Cell::new(r.summary.rows),
        Cell::new(""),
        Cell::new(format!(
            "{} normal / {} attack",
            r.normal_rows, r.attack_rows
        ))
        .fg(Color::Cyan),
    ]);
    table
}

fn missing_cell(ratio: f64) -> Cell {
    Cell::new(format!("{:.1}%", ratio * 100.0)).fg(if ratio > 0.0 {
        Color::Yellow
    } else {
        Color::White
    })
}

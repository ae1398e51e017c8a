//! Schema and summary statistics of the raw dataset.

use crate::data_utils::{self, fmt_stat, render_table};
use crate::error::Result;
use itertools::Itertools;
use polars::prelude::*;

/// Column listing with non-null counts and dtypes.
pub fn render_info(df: &DataFrame) -> String {
    let height = df.height();
    let index = if height == 0 {
        "RangeIndex: 0 entries".to_string()
    } else {
        format!("RangeIndex: {} entries, 0 to {}", height, height - 1)
    };
    let mut lines = vec![
        "<class 'DataFrame'>".to_string(),
        index,
        format!("Data columns (total {} columns):", df.width()),
    ];

    let header = vec!["Column".to_string(), "Non-Null Count".to_string(), "Dtype".to_string()];
    let rows: Vec<(String, Vec<String>)> = df
        .get_columns()
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            (
                idx.to_string(),
                vec![
                    s.name().to_string(),
                    format!("{} non-null", s.len() - s.null_count()),
                    s.dtype().to_string(),
                ],
            )
        })
        .collect();
    lines.push(render_table(&header, &rows));

    lines.join("\n")
}

/// Per-column summary statistics.
///
/// Numeric columns get count/mean/std/min/quartiles/max. A frame without any
/// numeric column falls back to count/unique/top/freq over its text columns.
pub fn render_description(df: &DataFrame) -> Result<String> {
    let numeric = data_utils::numeric_columns(df);
    if !numeric.is_empty() {
        return describe_numeric(&numeric);
    }

    let categorical = data_utils::categorical_columns(df);
    if categorical.is_empty() {
        return Ok("(no columns to describe)".to_string());
    }
    describe_categorical(&categorical)
}

fn describe_numeric(columns: &[&Series]) -> Result<String> {
    let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); labels.len()];

    for series in columns {
        let ca = data_utils::as_f64(series)?;
        let count = ca.len() - ca.null_count();
        let stats = [
            Some(count as f64),
            ca.mean(),
            ca.std(1),
            ca.min(),
            data_utils::quantile(&ca, 0.25)?,
            data_utils::quantile(&ca, 0.5)?,
            data_utils::quantile(&ca, 0.75)?,
            ca.max(),
        ];
        for (row, value) in cells.iter_mut().zip(stats) {
            row.push(fmt_stat(value));
        }
    }

    let header: Vec<String> = columns.iter().map(|s| s.name().to_string()).collect();
    let rows: Vec<(String, Vec<String>)> = labels
        .iter()
        .map(|l| l.to_string())
        .zip(cells)
        .collect();
    Ok(render_table(&header, &rows))
}

fn describe_categorical(columns: &[&Series]) -> Result<String> {
    let labels = ["count", "unique", "top", "freq"];
    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(columns.len()); labels.len()];

    for series in columns {
        let ca = series.str()?;
        let counts = ca.into_iter().flatten().counts();
        let top = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(value, freq)| (value.to_string(), freq.to_string()));
        let (top, freq) = top.unwrap_or_else(|| ("NaN".to_string(), "NaN".to_string()));

        cells[0].push((ca.len() - ca.null_count()).to_string());
        cells[1].push(counts.len().to_string());
        cells[2].push(top);
        cells[3].push(freq);
    }

    let header: Vec<String> = columns.iter().map(|s| s.name().to_string()).collect();
    let rows: Vec<(String, Vec<String>)> = labels
        .iter()
        .map(|l| l.to_string())
        .zip(cells)
        .collect();
    Ok(render_table(&header, &rows))
}

/// One line per column with its null count.
pub fn render_nulls(df: &DataFrame) -> String {
    let width = df
        .get_column_names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    df.get_columns()
        .iter()
        .map(|s| format!("{:<width$}  {}", s.name(), s.null_count(), width = width))
        .join("\n")
}

/// Prompt narrated as the "Data Overview" section.
pub fn overview_prompt(df: &DataFrame) -> Result<String> {
    Ok(format!(
        "Info:\n{}\n\nDescription:\n{}\n\nNulls:\n{}",
        render_info(df),
        render_description(df)?,
        render_nulls(df)
    ))
}

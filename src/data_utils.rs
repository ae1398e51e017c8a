use crate::error::Result;
use polars::prelude::*;

/// How a column participates in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

pub fn column_kind(series: &Series) -> ColumnKind {
    if series.dtype().is_numeric() {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

pub fn numeric_columns(df: &DataFrame) -> Vec<&Series> {
    df.get_columns()
        .iter()
        .filter(|s| column_kind(s) == ColumnKind::Numeric)
        .collect()
}

pub fn categorical_columns(df: &DataFrame) -> Vec<&Series> {
    df.get_columns()
        .iter()
        .filter(|s| matches!(s.dtype(), DataType::String))
        .collect()
}

/// Numeric column as `f64`, nulls preserved.
pub fn as_f64(series: &Series) -> Result<Float64Chunked> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}

/// Non-null values of a numeric column.
pub fn non_null_values(series: &Series) -> Result<Vec<f64>> {
    Ok(as_f64(series)?.into_iter().flatten().collect())
}

/// Quantile with linear interpolation between the two nearest ranks.
pub fn quantile(ca: &Float64Chunked, q: f64) -> Result<Option<f64>> {
    Ok(ca.quantile(q, QuantileInterpolOptions::Linear)?)
}

/// Fixed-point formatting used in every text table.
pub fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

/// Render a right-aligned text table: one header row and labelled body rows.
pub fn render_table(header: &[String], rows: &[(String, Vec<String>)]) -> String {
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            rows.iter()
                .filter_map(|(_, cells)| cells.get(idx).map(|c| c.chars().count()))
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&" ".repeat(label_width));
    for (name, width) in header.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", name, width = width));
    }
    out.push('\n');

    for (label, cells) in rows {
        out.push_str(&format!("{:<width$}", label, width = label_width));
        for (cell, width) in cells.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", cell, width = width));
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

//! PNG charts: a pair plot of the numeric columns and a count plot of one
//! categorical column.

use crate::data_utils;
use crate::error::{AutolysisError, Result};
use itertools::Itertools;
use plotters::prelude::*;
use polars::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const NUMERICAL_PLOT_FILE: &str = "numerical_plot.png";

const PAIRPLOT_CELL_PX: u32 = 250;
const HISTOGRAM_BINS: usize = 20;
const COUNTPLOT_SIZE: (u32, u32) = (800, 800);
const MAX_LABEL_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Numerical,
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub path: PathBuf,
    /// The plotted column for categorical charts.
    pub column: Option<String>,
}

impl ChartArtifact {
    /// File name as referenced from the report.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn chart_err<E: std::fmt::Display>(err: E) -> AutolysisError {
    AutolysisError::Chart(err.to_string())
}

/// `{column}_plot.png` with anything outside `[A-Za-z0-9_.-]` replaced.
pub fn categorical_plot_file(column: &str) -> String {
    let safe: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    format!("{}_plot.png", safe)
}

/// Distinct non-null values with their frequencies, most frequent first.
pub fn categorical_counts(series: &Series) -> Result<Vec<(String, usize)>> {
    let ca = series.str()?;
    let counts = ca
        .into_iter()
        .flatten()
        .counts()
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();
    Ok(counts)
}

/// Equal-width histogram bins as `(low, high, count)`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let range = value_range(values.iter().copied());
    let width = (range.end - range.start) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - range.start) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let low = range.start + width * i as f64;
            (low, low + width, count)
        })
        .collect()
}

/// Data range padded so a constant column still gets a drawable axis.
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        short.push('…');
        short
    }
}

/// Pair plot of the numeric columns that hold at least one value.
pub fn plot_numerical_columns(
    df: &DataFrame,
    dir: &Path,
    max_columns: usize,
) -> Result<Option<ChartArtifact>> {
    let numeric = data_utils::numeric_columns(df);
    if numeric.is_empty() {
        info!("No numerical columns found for visualization.");
        return Ok(None);
    }

    let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for series in numeric {
        let ca = data_utils::as_f64(series)?;
        if ca.null_count() == ca.len() {
            continue;
        }
        columns.push((series.name().to_string(), ca.into_iter().collect()));
    }

    if columns.is_empty() {
        info!("No valid numerical columns with data found for visualization.");
        return Ok(None);
    }
    if columns.len() > max_columns {
        warn!(
            "Pair plot limited to the first {} of {} numerical columns",
            max_columns,
            columns.len()
        );
        columns.truncate(max_columns);
    }

    let path = dir.join(NUMERICAL_PLOT_FILE);
    draw_pair_plot(&path, &columns)?;
    info!("Numerical columns visualization saved as {}", path.display());

    Ok(Some(ChartArtifact {
        kind: ChartKind::Numerical,
        path,
        column: None,
    }))
}

fn draw_pair_plot(path: &Path, columns: &[(String, Vec<Option<f64>>)]) -> Result<()> {
    let n = columns.len();
    let side = (PAIRPLOT_CELL_PX * n as u32).max(400);
    let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let ranges: Vec<Range<f64>> = columns
        .iter()
        .map(|(_, values)| value_range(values.iter().flatten().copied()))
        .collect();

    for (idx, area) in root.split_evenly((n, n)).iter().enumerate() {
        let (row, col) = (idx / n, idx % n);
        let (x_name, x_values) = &columns[col];
        let (y_name, y_values) = &columns[row];
        let x_label_size = if row == n - 1 { 35 } else { 0 };
        let y_label_size = if col == 0 { 45 } else { 0 };

        if row == col {
            let present: Vec<f64> = x_values.iter().flatten().copied().collect();
            let bins = histogram_bins(&present, HISTOGRAM_BINS);
            let max_count = bins.iter().map(|b| b.2).max().unwrap_or(1).max(1) as f64;

            let mut chart = ChartBuilder::on(area)
                .margin(5)
                .x_label_area_size(x_label_size)
                .y_label_area_size(y_label_size)
                .build_cartesian_2d(ranges[col].clone(), 0f64..max_count * 1.1)
                .map_err(chart_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_desc(x_name.as_str())
                .y_desc(y_name.as_str())
                .draw()
                .map_err(chart_err)?;
            chart
                .draw_series(bins.iter().map(|(low, high, count)| {
                    Rectangle::new([(*low, 0.0), (*high, *count as f64)], BLUE.mix(0.6).filled())
                }))
                .map_err(chart_err)?;
        } else {
            let mut chart = ChartBuilder::on(area)
                .margin(5)
                .x_label_area_size(x_label_size)
                .y_label_area_size(y_label_size)
                .build_cartesian_2d(ranges[col].clone(), ranges[row].clone())
                .map_err(chart_err)?;
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_desc(x_name.as_str())
                .y_desc(y_name.as_str())
                .draw()
                .map_err(chart_err)?;
            chart
                .draw_series(
                    x_values
                        .iter()
                        .zip(y_values.iter())
                        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                        .map(|point| Circle::new(point, 2, BLUE.mix(0.5).filled())),
                )
                .map_err(chart_err)?;
        }
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Count plot of the first categorical column with at most `max_unique`
/// distinct values. Wider columns are skipped.
pub fn plot_categorical_columns(
    df: &DataFrame,
    dir: &Path,
    max_unique: usize,
) -> Result<Option<ChartArtifact>> {
    let categorical = data_utils::categorical_columns(df);
    if categorical.is_empty() {
        info!("No categorical columns found for visualization.");
        return Ok(None);
    }

    for series in categorical {
        let counts = categorical_counts(series)?;
        if counts.len() > max_unique {
            info!("Skipping {} as it has {} unique values.", series.name(), counts.len());
            continue;
        }
        if counts.is_empty() {
            info!("Skipping {} as it has no values.", series.name());
            continue;
        }

        let path = dir.join(categorical_plot_file(series.name()));
        draw_count_plot(&path, series.name(), &counts)?;
        info!("Categorical column {} visualized as {}", series.name(), path.display());

        return Ok(Some(ChartArtifact {
            kind: ChartKind::Categorical,
            path,
            column: Some(series.name().to_string()),
        }));
    }

    Ok(None)
}

fn draw_count_plot(path: &Path, column: &str, counts: &[(String, usize)]) -> Result<()> {
    let k = counts.len() as u32;
    let max_count = counts.iter().map(|c| c.1).max().unwrap_or(1) as u32;
    // most frequent value on top
    let labels: Vec<String> = counts.iter().rev().map(|(v, _)| truncate_label(v)).collect();
    let label_chars = labels.iter().map(|l| l.chars().count()).max().unwrap_or(1) as u32;

    let root = BitMapBackend::new(path, COUNTPLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", column), ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size((label_chars * 7 + 20).min(300))
        .build_cartesian_2d(0u32..(max_count + max_count / 10 + 1), (0u32..k).into_segmented())
        .map_err(chart_err)?;

    let label_for = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(labels.len())
        .y_label_formatter(&label_for)
        .x_desc("count")
        .y_desc(column)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(labels.iter().enumerate().map(|(pos, _)| {
            let pos = pos as u32;
            let count = counts[(k - 1 - pos) as usize].1 as u32;
            Rectangle::new(
                [(0u32, SegmentValue::Exact(pos)), (count, SegmentValue::Exact(pos + 1))],
                BLUE.mix(0.7).filled(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

use crate::data_utils;
use crate::error::Result;
use polars::prelude::*;

/// Tukey fences for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    /// Values strictly outside `[lower, upper]`.
    pub outlier_count: usize,
}

impl OutlierBounds {
    pub fn from_quartiles(column: impl Into<String>, q1: f64, q3: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            column: column.into(),
            q1,
            q3,
            iqr,
            lower: q1 - 1.5 * iqr,
            upper: q3 + 1.5 * iqr,
            outlier_count: 0,
        }
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

pub fn compute_outlier_bounds(df: &DataFrame) -> Result<Vec<OutlierBounds>> {
    let mut results = Vec::new();

    for series in data_utils::numeric_columns(df) {
        let ca = data_utils::as_f64(series)?;
        let (q1, q3) = match (data_utils::quantile(&ca, 0.25)?, data_utils::quantile(&ca, 0.75)?) {
            (Some(q1), Some(q3)) => (q1, q3),
            _ => continue,
        };

        let mut bounds = OutlierBounds::from_quartiles(series.name(), q1, q3);
        let outliers = ca.into_iter().flatten().filter(|v| bounds.is_outlier(*v)).count();
        bounds.outlier_count = outliers;
        results.push(bounds);
    }

    Ok(results)
}

pub fn render_outlier_summary(bounds: &[OutlierBounds]) -> String {
    bounds
        .iter()
        .map(|b| {
            format!(
                "{}: Q1={}, Q3={}, IQR={}, Min={}, Max={}, Outliers={}",
                b.column, b.q1, b.q3, b.iqr, b.lower, b.upper, b.outlier_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! Pearson correlation between numeric columns.

use crate::data_utils::{self, render_table};
use crate::error::Result;
use polars::prelude::*;

#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared entries. NaN where undefined.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.columns.len() + column]
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Off-diagonal pairs ordered by absolute coefficient, strongest first.
    pub fn strongest_pairs(&self, limit: usize) -> Vec<(&str, &str, f64)> {
        let n = self.columns.len();
        let mut pairs: Vec<(&str, &str, f64)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| (self.columns[i].as_str(), self.columns[j].as_str(), self.get(i, j)))
            .filter(|(_, _, r)| !r.is_nan())
            .collect();
        pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        pairs.truncate(limit);
        pairs
    }
}

/// Pearson coefficient over the positions where both sides are present.
pub fn pearson(x: &Float64Chunked, y: &Float64Chunked) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .into_iter()
        .zip(y.into_iter())
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

pub fn compute_correlation(df: &DataFrame) -> Result<CorrelationMatrix> {
    let numeric = data_utils::numeric_columns(df);
    let columns: Vec<String> = numeric.iter().map(|s| s.name().to_string()).collect();
    let data: Vec<Float64Chunked> = numeric
        .iter()
        .map(|s| data_utils::as_f64(s))
        .collect::<Result<_>>()?;

    let n = data.len();
    let mut values = vec![f64::NAN; n * n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    if matrix.is_empty() {
        return "(no numeric columns)".to_string();
    }

    let rows: Vec<(String, Vec<String>)> = matrix
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = (0..matrix.columns.len())
                .map(|j| data_utils::fmt_stat(Some(matrix.get(i, j))))
                .collect();
            (name.clone(), cells)
        })
        .collect();
    render_table(&matrix.columns, &rows)
}

pub fn correlation_prompt(matrix: &CorrelationMatrix) -> String {
    format!(
        "Here is the correlation matrix:\n{}\nSummarize the key insights.",
        render_correlation(matrix)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_and_inverse_correlation() {
        let df = df![
            "a" => [1.0f64, 2.0, 3.0, 4.0],
            "b" => [2i64, 4, 6, 8],
            "c" => [4.0f64, 3.0, 2.0, 1.0],
            "name" => ["w", "x", "y", "z"]
        ]
        .unwrap();

        let m = compute_correlation(&df).unwrap();
        assert_eq!(m.columns, vec!["a", "b", "c"]);
        assert!((m.get(0, 1) - 1.0).abs() < 1e-12);
        assert!((m.get(0, 2) + 1.0).abs() < 1e-12);
        assert!((m.get(2, 0) + 1.0).abs() < 1e-12);
        assert!((m.get(1, 1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_nan() {
        let df = df!["a" => [1.0f64, 2.0, 3.0], "k" => [5.0f64, 5.0, 5.0]].unwrap();
        let m = compute_correlation(&df).unwrap();
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(1, 1).is_nan());
        assert!(m.strongest_pairs(5).is_empty());
    }

    #[test]
    fn test_pairwise_complete_observations() {
        let x = Float64Chunked::from_slice_options("x", &[Some(1.0), Some(2.0), None, Some(4.0)]);
        let y = Float64Chunked::from_slice_options("y", &[Some(2.0), Some(4.0), Some(100.0), Some(8.0)]);
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_prompt_and_empty_matrix() {
        let df = df!["s" => ["a", "b"]].unwrap();
        let m = compute_correlation(&df).unwrap();
        assert!(m.is_empty());
        let prompt = correlation_prompt(&m);
        assert!(prompt.starts_with("Here is the correlation matrix:\n"));
        assert!(prompt.ends_with("\nSummarize the key insights."));
    }

    #[test]
    fn test_strongest_pairs_order() {
        let m = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![1.0, 0.2, -0.9, 0.2, 1.0, 0.5, -0.9, 0.5, 1.0],
        };
        let pairs = m.strongest_pairs(2);
        assert_eq!(pairs[0], ("a", "c", -0.9));
        assert_eq!(pairs[1], ("b", "c", 0.5));
    }
}

use crate::error::Result;
use polars::prelude::*;
use tracing::info;

/// Drop sparse columns, then every row that still has a missing value.
///
/// A column survives when it has at least `height * (1 - threshold)`
/// non-null values, i.e. it is dropped once its null fraction exceeds
/// `threshold`.
pub fn clean_missing_data(df: &DataFrame, threshold: f64) -> Result<DataFrame> {
    let height = df.height();
    let min_non_null = height as f64 * (1.0 - threshold);

    let (kept, dropped): (Vec<&Series>, Vec<&Series>) = df
        .get_columns()
        .iter()
        .partition(|s| (s.len() - s.null_count()) as f64 >= min_non_null);

    if !dropped.is_empty() {
        let names: Vec<&str> = dropped.iter().map(|s| s.name()).collect();
        info!("Dropping {} sparse column(s): {:?}", names.len(), names);
    }

    if kept.is_empty() {
        return Ok(DataFrame::empty());
    }

    let exprs: Vec<Expr> = kept.iter().map(|s| col(s.name())).collect();
    let cleaned = df.clone().lazy().select(exprs).drop_nulls(None).collect()?;

    info!(
        "Cleaning kept {} of {} rows and {} of {} columns",
        cleaned.height(),
        height,
        cleaned.width(),
        df.width()
    );
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_columns_over_threshold_then_rows() {
        let df = df![
            "full" => [Some(1i64), Some(2), Some(3), Some(4)],
            "half" => [Some(1.0f64), None, Some(3.0), None],
            "sparse" => [Some("a"), None, None, None]
        ]
        .unwrap();

        let cleaned = clean_missing_data(&df, 0.5).unwrap();
        assert_eq!(cleaned.get_column_names(), vec!["full", "half"]);
        // rows with a null in "half" are gone
        assert_eq!(cleaned.height(), 2);
        let full: Vec<Option<i64>> = cleaned.column("full").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(full, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_no_nulls_is_untouched() {
        let df = df!["a" => [1i64, 2, 3], "b" => ["x", "y", "z"]].unwrap();
        let cleaned = clean_missing_data(&df, 0.5).unwrap();
        assert_eq!(cleaned.shape(), (3, 2));
    }

    #[test]
    fn test_all_columns_sparse() {
        let df = df!["a" => [None::<i64>, None, Some(1)]].unwrap();
        let cleaned = clean_missing_data(&df, 0.5).unwrap();
        assert_eq!(cleaned.width(), 0);
        assert_eq!(cleaned.height(), 0);
    }

    #[test]
    fn test_empty_frame() {
        let df = df!["a" => Vec::<i64>::new()].unwrap();
        let cleaned = clean_missing_data(&df, 0.5).unwrap();
        assert_eq!(cleaned.height(), 0);
        assert_eq!(cleaned.width(), 1);
    }
}

//! CSV ingestion
//!
//! Files are read as raw bytes, transcoded to UTF-8 by [`crate::encoding`]
//! and handed to the polars CSV reader with the full file used for schema
//! inference.

use crate::encoding;
use crate::error::{AutolysisError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Cell values that are read as missing.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a CSV file of unknown encoding into a dataframe.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let decoded = encoding::decode(&bytes);
    let df = parse_csv(&decoded.text)?;
    info!(
        "Loaded {} ({} rows x {} columns, {})",
        path.display(),
        df.height(),
        df.width(),
        decoded.encoding.name()
    );
    Ok(df)
}

/// Parse already-decoded CSV text.
///
/// Short rows are padded with nulls; a row with more fields than the header
/// is a [`AutolysisError::Parse`].
pub fn parse_csv(text: &str) -> Result<DataFrame> {
    if text.trim().is_empty() {
        return Err(AutolysisError::EmptyDataset("no columns to parse from file".to_string()));
    }

    let null_values: Vec<String> = NULL_TOKENS.iter().map(|t| t.to_string()).collect();
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumns(null_values.clone())))
                .with_missing_is_null(true)
        })
        .into_reader_with_file_handle(Cursor::new(text.as_bytes()))
        .finish()
        .map_err(|e| AutolysisError::Parse(e.to_string()))?;

    let names = unnamed_headers(&df);
    df.set_column_names(names.as_slice())?;

    normalize_missing(df)
}

/// Empty header names become `Unnamed: {index}`.
fn unnamed_headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Every NaN spelling is a missing value.
///
/// Float columns get their NaN cells nulled. Text columns whose values all
/// parse as floats (a numeric column holding e.g. `NAN` or `Nan`, which the
/// reader does not infer as numbers) become `Float64` first.
fn normalize_missing(df: DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(normalize_column)
        .collect::<Result<Vec<_>>>()?;
    Ok(DataFrame::new(columns)?)
}

fn normalize_column(series: &Series) -> Result<Series> {
    let floats = match series.dtype() {
        DataType::Float64 => series.clone(),
        DataType::String if series.null_count() < series.len() => {
            let cast = series.cast(&DataType::Float64)?;
            if cast.null_count() != series.null_count() {
                return Ok(series.clone());
            }
            debug!("Column {} holds only numbers and NaN spellings", series.name());
            cast
        }
        _ => return Ok(series.clone()),
    };

    let ca: Float64Chunked = floats
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(ca.with_name(series.name()).into_series())
}

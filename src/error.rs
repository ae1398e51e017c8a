use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutolysisError {
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
}

impl From<polars::error::PolarsError> for AutolysisError {
    fn from(err: polars::error::PolarsError) -> Self {
        AutolysisError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AutolysisError>;

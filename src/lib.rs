pub mod charts;
pub mod cleaning;
pub mod config;
pub mod correlation;
pub mod data_utils;
pub mod encoding;
pub mod error;
pub mod llm;
pub mod loader;
pub mod outliers;
pub mod overview;
pub mod pipeline;
pub mod report;
pub mod stage;

pub use config::Config;
pub use error::{AutolysisError, Result};
pub use llm::{LlmClient, Narrator};
pub use pipeline::{AnalysisPipeline, AnalysisReport};

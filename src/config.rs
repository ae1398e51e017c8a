//! Runtime configuration
//!
//! Everything that varies between runs comes from the environment (a `.env`
//! file is loaded by the binary before this is read). Analysis parameters that
//! never change between runs live on [`AnalysisOptions`].

use crate::error::{AutolysisError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const TOKEN_VAR: &str = "AIPROXY_TOKEN";
pub const URL_VAR: &str = "AIPROXY_URL";
pub const MODEL_VAR: &str = "AUTOLYSIS_MODEL";
pub const STAGE_TIMEOUT_VAR: &str = "AUTOLYSIS_STAGE_TIMEOUT_SECS";
pub const HTTP_TIMEOUT_VAR: &str = "AUTOLYSIS_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "https://aiproxy.sanand.workers.dev/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
    pub model: String,
    /// `None` runs every stage without a deadline.
    pub stage_timeout: Option<Duration>,
    pub http_timeout: Duration,
    pub options: AnalysisOptions,
}

/// Fixed knobs of the analysis itself.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Columns whose null fraction exceeds this are dropped during cleaning.
    pub missing_threshold: f64,
    /// Categorical columns with more distinct values than this are not plotted.
    pub max_categories: usize,
    pub max_pairplot_columns: usize,
    pub output_dir: PathBuf,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            missing_threshold: 0.5,
            max_categories: 30,
            max_pairplot_columns: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(TOKEN_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AutolysisError::Environment(format!("{} environment variable not set.", TOKEN_VAR))
            })?;

        let api_url = lookup(URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let model = lookup(MODEL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let stage_secs = parse_secs(&lookup, STAGE_TIMEOUT_VAR, DEFAULT_STAGE_TIMEOUT_SECS)?;
        let stage_timeout = if stage_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(stage_secs))
        };

        let http_secs = parse_secs(&lookup, HTTP_TIMEOUT_VAR, DEFAULT_HTTP_TIMEOUT_SECS)?;
        if http_secs == 0 {
            return Err(AutolysisError::Config(format!(
                "{} must be greater than zero",
                HTTP_TIMEOUT_VAR
            )));
        }

        Ok(Self {
            api_token,
            api_url,
            model,
            stage_timeout,
            http_timeout: Duration::from_secs(http_secs),
            options: AnalysisOptions::default(),
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.output_dir = dir.into();
        self
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<u64>().map_err(|e| {
            AutolysisError::Config(format!("{} must be a whole number of seconds ('{}'): {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}

//! Analysis pipeline
//!
//! load -> overview -> clean -> outliers -> correlation -> charts -> story,
//! each narrated step running through [`crate::stage`] so a hanging API call
//! only costs that step its text.

use crate::charts::{self, ChartArtifact, ChartKind};
use crate::cleaning;
use crate::config::{AnalysisOptions, Config};
use crate::correlation;
use crate::error::Result;
use crate::llm::Narrator;
use crate::loader;
use crate::outliers;
use crate::overview;
use crate::report::{ReportBuilder, REPORT_FILE};
use crate::stage::{run_blocking_stage, run_stage};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const OVERVIEW_TITLE: &str = "Data Overview";
pub const OUTLIER_TITLE: &str = "Outlier Detection";
pub const CORRELATION_TITLE: &str = "Correlation Matrix";
pub const NUMERICAL_TITLE: &str = "Numerical Visualization";
pub const CATEGORICAL_TITLE: &str = "Categorical Visualization";
pub const STORY_TITLE: &str = "Final Story";

#[derive(Debug, Clone)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub report_path: PathBuf,
    pub sections: Vec<ReportSection>,
    pub charts: Vec<ChartArtifact>,
    pub story: String,
    /// Stages whose deadline passed; their text is empty.
    pub timed_out: Vec<String>,
    pub input_shape: (usize, usize),
    pub cleaned_shape: (usize, usize),
}

impl AnalysisReport {
    pub fn section(&self, title: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.body.as_str())
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&ChartArtifact> {
        self.charts.iter().find(|c| c.kind == kind)
    }
}

pub struct AnalysisPipeline {
    options: AnalysisOptions,
    stage_timeout: Option<Duration>,
    narrator: Arc<dyn Narrator>,
}

impl AnalysisPipeline {
    pub fn new(config: &Config, narrator: Arc<dyn Narrator>) -> Self {
        Self::with_options(config.options.clone(), config.stage_timeout, narrator)
    }

    pub fn with_options(
        options: AnalysisOptions,
        stage_timeout: Option<Duration>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            options,
            stage_timeout,
            narrator,
        }
    }

    pub async fn run(&self, csv_path: &Path) -> Result<AnalysisReport> {
        std::fs::create_dir_all(&self.options.output_dir)?;

        let raw = loader::load_csv(csv_path)?;
        let input_shape = raw.shape();

        let mut report = ReportBuilder::new();
        let mut sections = Vec::new();
        let mut summaries: Vec<String> = Vec::new();
        let mut timed_out = Vec::new();

        let prompt = overview::overview_prompt(&raw)?;
        let overview_text = self.narrate_stage(OVERVIEW_TITLE, prompt, &mut timed_out).await?;
        summaries.push(format!("## {}\n{}", OVERVIEW_TITLE, overview_text));
        report.section(OVERVIEW_TITLE, &overview_text);
        sections.push(section(OVERVIEW_TITLE, overview_text));

        let df = cleaning::clean_missing_data(&raw, self.options.missing_threshold)?;
        let cleaned_shape = df.shape();
        drop(raw);

        let bounds = outliers::compute_outlier_bounds(&df)?;
        let prompt = outliers::render_outlier_summary(&bounds);
        let outlier_text = self.narrate_stage(OUTLIER_TITLE, prompt, &mut timed_out).await?;
        summaries.push(format!("## {}\n{}", OUTLIER_TITLE, outlier_text));
        report.section(OUTLIER_TITLE, &outlier_text);
        sections.push(section(OUTLIER_TITLE, outlier_text));

        let correlation_text = self.correlation_summary(&df, &mut timed_out).await;
        summaries.push(format!("## {}\n{}", CORRELATION_TITLE, correlation_text));
        report.section(CORRELATION_TITLE, &correlation_text);
        sections.push(section(CORRELATION_TITLE, correlation_text));

        let mut artifacts = Vec::new();

        let max_columns = self.options.max_pairplot_columns;
        let numerical = self
            .chart_stage(NUMERICAL_TITLE, &df, &mut timed_out, move |df, dir| {
                charts::plot_numerical_columns(&df, &dir, max_columns)
            })
            .await;
        if let Some(chart) = numerical {
            let file = chart.file_name();
            summaries.push(format!(
                "Numerical data has been visualized. The plot is saved as {}.",
                file
            ));
            report.image(NUMERICAL_TITLE, "Numerical Plot", &file);
            artifacts.push(chart);
        }

        let max_categories = self.options.max_categories;
        let categorical = self
            .chart_stage(CATEGORICAL_TITLE, &df, &mut timed_out, move |df, dir| {
                charts::plot_categorical_columns(&df, &dir, max_categories)
            })
            .await;
        if let Some(chart) = categorical {
            let file = chart.file_name();
            summaries.push(format!(
                "Categorical data has been visualized. The plot is saved as {}.",
                file
            ));
            report.image(CATEGORICAL_TITLE, "Categorical Plot", &file);
            artifacts.push(chart);
        }

        let final_prompt = story_prompt(&summaries);
        let story = self.narrate_stage(STORY_TITLE, final_prompt, &mut timed_out).await?;
        report.section(STORY_TITLE, &story);
        sections.push(section(STORY_TITLE, story.clone()));

        let report_path = self.options.output_dir.join(REPORT_FILE);
        report.write_to(&report_path)?;
        info!("Report written to {}", report_path.display());

        Ok(AnalysisReport {
            report_path,
            sections,
            charts: artifacts,
            story,
            timed_out,
            input_shape,
            cleaned_shape,
        })
    }

    /// Narrate `prompt` on a disposable worker; a timeout yields empty text.
    async fn narrate_stage(
        &self,
        name: &str,
        prompt: String,
        timed_out: &mut Vec<String>,
    ) -> Result<String> {
        let narrator = Arc::clone(&self.narrator);
        let outcome = run_stage(name, self.stage_timeout, async move {
            narrator.narrate(&prompt).await
        })
        .await?;

        if outcome.is_timed_out() {
            timed_out.push(name.to_string());
        }
        Ok(outcome.into_text())
    }

    /// Correlation text; any failure along the way becomes the section text.
    async fn correlation_summary(&self, df: &DataFrame, timed_out: &mut Vec<String>) -> String {
        let matrix = match correlation::compute_correlation(df) {
            Ok(matrix) => matrix,
            Err(e) => return format!("Error in computing correlation: {}", e),
        };

        for (a, b, r) in matrix.strongest_pairs(3) {
            debug!("Correlation {} ~ {}: {:.3}", a, b, r);
        }

        let prompt = correlation::correlation_prompt(&matrix);
        match self.narrate_stage(CORRELATION_TITLE, prompt, timed_out).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Correlation narration failed: {}", e);
                format!("Error in computing correlation: {}", e)
            }
        }
    }

    /// Render a chart on the blocking pool; failures and timeouts skip it.
    async fn chart_stage<F>(
        &self,
        name: &str,
        df: &DataFrame,
        timed_out: &mut Vec<String>,
        render: F,
    ) -> Option<ChartArtifact>
    where
        F: FnOnce(DataFrame, PathBuf) -> Result<Option<ChartArtifact>> + Send + 'static,
    {
        let df = df.clone();
        let dir = self.options.output_dir.clone();

        match run_blocking_stage(name, self.stage_timeout, move || render(df, dir)).await {
            Ok(outcome) if outcome.is_timed_out() => {
                timed_out.push(name.to_string());
                None
            }
            Ok(outcome) => outcome.completed().flatten(),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                None
            }
        }
    }
}

fn section(title: &str, body: String) -> ReportSection {
    ReportSection {
        title: title.to_string(),
        body,
    }
}

pub fn story_prompt(summaries: &[String]) -> String {
    format!(
        "Here is the complete analysis:\n\n{}\n\nSummarize this analysis into a cohesive story.",
        summaries.join("\n\n")
    )
}

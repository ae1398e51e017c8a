use async_trait::async_trait;
use autolysis::charts::ChartKind;
use autolysis::config::AnalysisOptions;
use autolysis::error::{AutolysisError, Result};
use autolysis::llm::Narrator;
use autolysis::pipeline::{
    AnalysisPipeline, CORRELATION_TITLE, OUTLIER_TITLE, OVERVIEW_TITLE, STORY_TITLE,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SAMPLE_CSV: &str = "\
id,age,city,score,notes
1,23,Oslo,88.5,
2,35,Rome,92.0,
3,,Oslo,79.5,late
4,41,Paris,85.0,
5,29,Rome,95.5,
6,52,Oslo,70.0,
";

/// Answers every prompt with `narration {n}` and remembers what it was asked.
#[derive(Default)]
struct ScriptedNarrator {
    prompts: Mutex<Vec<String>>,
    hang_on: Option<&'static str>,
    fail_on: Option<&'static str>,
}

impl ScriptedNarrator {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(&self, prompt: &str) -> Result<String> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if self.hang_on.map_or(false, |p| prompt.starts_with(p)) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.fail_on.map_or(false, |p| prompt.starts_with(p)) {
            return Err(AutolysisError::Llm("quota exceeded".to_string()));
        }
        Ok(format!("narration {}", n))
    }
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("sample.csv");
    std::fs::write(&path, SAMPLE_CSV).unwrap();
    path
}

fn pipeline(out: &Path, timeout: Option<Duration>, narrator: Arc<ScriptedNarrator>) -> AnalysisPipeline {
    let options = AnalysisOptions {
        output_dir: out.to_path_buf(),
        ..AnalysisOptions::default()
    };
    AnalysisPipeline::with_options(options, timeout, narrator)
}

#[tokio::test]
async fn test_full_run_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    let out = dir.path().join("out");
    let narrator = Arc::new(ScriptedNarrator::default());

    let report = pipeline(&out, Some(Duration::from_secs(30)), narrator.clone())
        .run(&csv)
        .await
        .unwrap();

    assert_eq!(report.input_shape, (6, 5));
    // "notes" is mostly empty and goes; the row missing "age" goes too
    assert_eq!(report.cleaned_shape, (5, 4));
    assert!(report.timed_out.is_empty());

    let prompts = narrator.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].starts_with("Info:\n"));
    assert!(prompts[0].contains("notes"));
    assert!(prompts[1].contains("age: Q1="));
    assert!(prompts[1].contains("score: Q1="));
    assert!(!prompts[1].contains("notes"));
    assert!(prompts[2].starts_with("Here is the correlation matrix:\n"));
    assert!(prompts[3].starts_with("Here is the complete analysis:\n\n## Data Overview\nnarration 1"));
    assert!(prompts[3].contains("## Outlier Detection\nnarration 2"));
    assert!(prompts[3].ends_with("Summarize this analysis into a cohesive story."));

    assert_eq!(report.section(OVERVIEW_TITLE), Some("narration 1"));
    assert_eq!(report.section(OUTLIER_TITLE), Some("narration 2"));
    assert_eq!(report.section(CORRELATION_TITLE), Some("narration 3"));
    assert_eq!(report.story, "narration 4");

    let markdown = std::fs::read_to_string(&report.report_path).unwrap();
    assert!(markdown.starts_with("# Automated Data Analysis\n\n## Data Overview\nnarration 1\n\n"));
    assert!(markdown.contains("## Final Story\nnarration 4\n\n"));

    assert_eq!(report.charts.len(), 2);
    for chart in &report.charts {
        assert!(chart.path.exists());
        assert!(markdown.contains(&format!("]({})", chart.file_name())));
    }
    let numerical = report.chart(ChartKind::Numerical).unwrap();
    assert_eq!(numerical.path, out.join("numerical_plot.png"));
    let categorical = report.chart(ChartKind::Categorical).unwrap();
    assert_eq!(categorical.column.as_deref(), Some("city"));
    assert_eq!(categorical.path, out.join("city_plot.png"));
    assert!(prompts[3].contains("The plot is saved as numerical_plot.png."));
    assert!(prompts[3].contains("The plot is saved as city_plot.png."));
}

#[tokio::test]
async fn test_hanging_stage_times_out_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    let narrator = Arc::new(ScriptedNarrator {
        hang_on: Some("Here is the correlation matrix"),
        ..ScriptedNarrator::default()
    });

    let report = pipeline(dir.path(), Some(Duration::from_millis(200)), narrator.clone())
        .run(&csv)
        .await
        .unwrap();

    assert!(report.timed_out.iter().any(|s| s == CORRELATION_TITLE));
    assert_eq!(report.section(CORRELATION_TITLE), Some(""));
    assert_eq!(report.section(OVERVIEW_TITLE), Some("narration 1"));
    assert!(report.section(STORY_TITLE).is_some());

    let prompts = narrator.prompts();
    assert!(prompts.last().unwrap().contains("## Correlation Matrix\n\n"));
    assert!(report.report_path.exists());
}

#[tokio::test]
async fn test_correlation_failure_becomes_text() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    let narrator = Arc::new(ScriptedNarrator {
        fail_on: Some("Here is the correlation matrix"),
        ..ScriptedNarrator::default()
    });

    let report = pipeline(dir.path(), None, narrator).run(&csv).await.unwrap();
    let text = report.section(CORRELATION_TITLE).unwrap();
    assert!(text.starts_with("Error in computing correlation: "));
    assert!(text.contains("quota exceeded"));
}

#[tokio::test]
async fn test_narration_failure_elsewhere_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_sample(dir.path());
    let narrator = Arc::new(ScriptedNarrator {
        fail_on: Some("Info:"),
        ..ScriptedNarrator::default()
    });

    let result = pipeline(dir.path(), None, narrator).run(&csv).await;
    assert!(matches!(result, Err(AutolysisError::Llm(_))));
    assert!(!dir.path().join("README.md").exists());
}

#[tokio::test]
async fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let narrator = Arc::new(ScriptedNarrator::default());
    let result = pipeline(dir.path(), None, narrator.clone())
        .run(&dir.path().join("absent.csv"))
        .await;
    assert!(matches!(result, Err(AutolysisError::Io(_))));
    assert!(narrator.prompts().is_empty());
}

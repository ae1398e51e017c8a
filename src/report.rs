use crate::error::Result;
use std::path::Path;

pub const REPORT_FILE: &str = "README.md";
const TITLE: &str = "# Automated Data Analysis";

/// Incrementally assembled Markdown report.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    content: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            content: format!("{}\n\n", TITLE),
        }
    }

    pub fn section(&mut self, title: &str, body: &str) -> &mut Self {
        self.content.push_str(&format!("## {}\n{}\n\n", title, body));
        self
    }

    pub fn image(&mut self, title: &str, alt: &str, file: &str) -> &mut Self {
        self.content.push_str(&format!("## {}\n![{}]({})\n\n", title, alt, file));
        self
    }

    pub fn render(&self) -> &str {
        &self.content
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut report = ReportBuilder::new();
        report
            .section("Data Overview", "Ten rows.")
            .image("Numerical Visualization", "Numerical Plot", "numerical_plot.png");
        assert_eq!(
            report.render(),
            "# Automated Data Analysis\n\n## Data Overview\nTen rows.\n\n## Numerical Visualization\n![Numerical Plot](numerical_plot.png)\n\n"
        );
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE);
        let mut report = ReportBuilder::new();
        report.section("Final Story", "");
        report.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("## Final Story\n\n\n"));
    }
}
